#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate prometheus;
#[macro_use]
extern crate rocket;

use config::Config;
use evstations_rs::api::{self, HttpSession, ReqwestTransport, RequestLogger};
use evstations_rs::model::BoundingBox;
use rocket::{Build, Rocket, State};
use std::sync::Mutex;
use std::time::Instant;

mod metrics;

const API_URL: &str = "https://api.chargemap.example/v1";

type Session = HttpSession<ReqwestTransport, Box<dyn RequestLogger + Send + Sync>>;

#[derive(Clone, serde::Deserialize)]
pub struct EvStationsConfig {
    api_url: String,
    interval: u64,
    lat_min: f64,
    lat_max: f64,
    long_min: f64,
    long_max: f64,
    do_logging: bool,
    /// Append outgoing requests to this file instead of the process log.
    request_log: Option<String>,
}

/// Structure containing state for API handlers.
pub struct StateData {
    session: Session,
    bbox: BoundingBox,
    do_logging: bool,
    interval: u64,
    /// Timestamp of last successful metric collection via `metrics::collect()`
    timestamp: Mutex<Option<Instant>>,
}

impl StateData {
    /// Updates `timestamp` to `now()`.
    fn touch(&self) {
        if let Ok(mut ts) = self.timestamp.lock() {
            *ts = Some(Instant::now());
        } else {
            log::trace!("Unable to lock timestamp mutex, will refresh again")
        }
    }

    /// Checks whether `interval_seconds` elapsed since last `touch()`
    fn interval_elapsed(&self, interval_secs: u64) -> bool {
        let elapsed_opt = self
            .timestamp
            .lock()
            .ok()
            .and_then(|a| a.map(|b| b.elapsed().as_secs()));

        if let Some(elapsed) = elapsed_opt {
            elapsed > interval_secs
        } else {
            /* If there is None timestamp/elapsed, always return true to trigger action */
            true
        }
    }
}

pub fn read_settings() -> Result<EvStationsConfig, config::ConfigError> {
    let mut settings = Config::default();
    settings
        .set_default("api_url", API_URL)?
        .set_default("interval", 300i64)?
        .set_default("do_logging", true)?;
    settings.merge(config::Environment::with_prefix("EVS"))?;

    settings.try_into()
}

#[get("/metrics")]
async fn metrics_route(state: &State<StateData>) -> Result<String, api::Error> {
    if state.interval_elapsed(state.interval) {
        metrics::collect(&state.session, state.bbox, state.do_logging).await?;
        state.touch();
    } else {
        log::info!("interval time not yet elapsed since last run; returning cached result")
    }
    metrics::read().await
}

#[get("/stations")]
async fn stations_route(state: &State<StateData>) -> Result<String, api::Error> {
    let stations = api::stations(&state.session, state.bbox, state.do_logging).await?;

    Ok(format!("{:#?}", stations))
}

#[launch]
fn rocket() -> Rocket<Build> {
    env_logger::init();

    let settings = read_settings().expect("Configuration error");
    let logger: Box<dyn RequestLogger + Send + Sync> = match settings.request_log {
        Some(path) => Box::new(api::FileRequestLogger::new(path)),
        None => Box::new(api::LogRequestLogger),
    };
    let transport = ReqwestTransport::new(settings.api_url).expect("Unable to build HTTP client");

    let state = StateData {
        session: HttpSession::new(transport, logger),
        bbox: BoundingBox {
            lat_min: settings.lat_min,
            lat_max: settings.lat_max,
            long_min: settings.long_min,
            long_max: settings.long_max,
        },
        do_logging: settings.do_logging,
        interval: settings.interval,
        timestamp: Mutex::new(None),
    };

    rocket::build()
        .manage(state)
        .mount("/", routes![metrics_route, stations_route])
}
