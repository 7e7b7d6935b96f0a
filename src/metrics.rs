use evstations_rs::api::{self, HttpSession, RequestLogger, Transport};
use evstations_rs::model::{BoundingBox, Station};
use prometheus::{Encoder, GaugeVec, IntGauge, TextEncoder};

lazy_static! {
    static ref STATIONS_TOTAL_GAUGE: IntGauge = register_int_gauge!(opts!(
        "stations_total",
        "number of charging stations within the configured area",
    ))
    .unwrap();
    static ref STATION_EVSE_COUNT_GAUGE: GaugeVec = register_gauge_vec!(
        opts!("station_evse_count", "number of EVSEs of a station"),
        &["station_id", "provider", "city"],
    )
    .unwrap();
    static ref STATION_MAX_KW_GAUGE: GaugeVec = register_gauge_vec!(
        opts!(
            "station_max_kw",
            "highest connector power rating of a station (in kW)",
        ),
        &["station_id", "provider", "city"],
    )
    .unwrap();
    static ref CONNECTOR_MAX_KW_GAUGE: GaugeVec = register_gauge_vec!(
        opts!("connector_max_kw", "connector power rating (in kW)"),
        &["station_id", "evse_id", "connector_type"],
    )
    .unwrap();
}

/// Feed EVSE and connector figures of `station` to Prometheus metrics.
fn process_station(station: &Station) {
    let station_id = station.id.to_string();
    let station_labels: [&str; 3] = [&station_id, &station.provider, &station.city];

    STATION_EVSE_COUNT_GAUGE
        .with_label_values(&station_labels)
        .set(station.evses.len() as f64);

    if let Some(max_kw) = station.max_kw() {
        STATION_MAX_KW_GAUGE
            .with_label_values(&station_labels)
            .set(max_kw as f64);
    }

    for evse in &station.evses {
        for connector in &evse.connectors {
            CONNECTOR_MAX_KW_GAUGE
                .with_label_values(&[
                    &station_id,
                    &evse.id.to_string(),
                    &connector.connector_type,
                ])
                .set(connector.max_kw as f64);
        }
    }
}

/// Query all stations within `bbox`, updating Prometheus exporter registry.
pub async fn collect<T: Transport, L: RequestLogger>(
    session: &HttpSession<T, L>,
    bbox: BoundingBox,
    do_logging: bool,
) -> Result<(), api::Error> {
    let stations = api::stations(session, bbox, do_logging).await?;

    if stations.is_empty() {
        log::warn!("No stations returned for {:?}", bbox);
    }

    /* Drop series of stations that left the area since the previous run */
    STATION_EVSE_COUNT_GAUGE.reset();
    STATION_MAX_KW_GAUGE.reset();
    CONNECTOR_MAX_KW_GAUGE.reset();

    STATIONS_TOTAL_GAUGE.set(stations.len() as i64);
    stations.iter().for_each(process_station);

    Ok(())
}

/// Read metrics from Prometheus exporter registry.
pub async fn read() -> Result<String, api::Error> {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    encoder
        .encode(&metric_families, &mut buffer)
        .or(Err(api::Error::FormatError))?;
    String::from_utf8(buffer).or(Err(api::Error::FormatError))
}

#[cfg(test)]
mod test {
    use super::*;
    use evstations_rs::api::{endpoint::Endpoint, LogRequestLogger, RawResponse};
    use evstations_rs::model::RequestParams;
    use http::StatusCode;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    lazy_static! {
        /* Gauges are process-wide; tests touching them must not interleave */
        static ref REGISTRY_LOCK: Mutex<()> = Mutex::new(());
    }

    /// Replies with queued responses, one per request.
    struct QueuedTransport {
        responses: Mutex<VecDeque<RawResponse>>,
    }

    impl QueuedTransport {
        fn new(responses: Vec<(StatusCode, &str)>) -> Self {
            Self {
                responses: Mutex::new(
                    responses
                        .into_iter()
                        .map(|(status, text)| RawResponse {
                            status,
                            text: text.to_owned(),
                        })
                        .collect(),
                ),
            }
        }
    }

    impl Transport for QueuedTransport {
        async fn get(
            &self,
            _endpoint: &Endpoint,
            _params: &RequestParams,
        ) -> Result<RawResponse, api::Error> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| api::Error::Transport(String::from("no more responses")))
        }
    }

    const TWO_STATIONS: &str = r#"[
        {"id": 1, "latitude": 52.5, "longitude": 13.375, "name": "Alexanderplatz",
         "city": "Berlin", "country": "Germany", "provider": "Ionity", "evses": [
            {"id": 10, "group name": "HPC", "connectors": [{"type": "CCS", "max_kw": 350}]},
            {"id": 11, "group name": "HPC", "connectors": [{"type": "CCS", "max_kw": 150},
                                                          {"type": "CHAdeMO", "max_kw": 50}]}
        ]},
        {"id": 2, "latitude": 52.5, "longitude": 13.25, "name": "Tiergarten",
         "city": "Berlin", "country": "Germany", "provider": "Allego", "evses": [
            {"id": 20, "group name": "AC", "connectors": [{"type": "Type2", "max_kw": 50}]}
        ]}
    ]"#;

    const ONE_STATION: &str = r#"[
        {"id": 1, "latitude": 52.5, "longitude": 13.375, "name": "Alexanderplatz",
         "city": "Berlin", "country": "Germany", "provider": "Ionity", "evses": [
            {"id": 10, "group name": "HPC", "connectors": [{"type": "CCS", "max_kw": 350}]}
        ]}
    ]"#;

    fn bbox() -> BoundingBox {
        BoundingBox {
            lat_min: 52.3,
            lat_max: 52.7,
            long_min: 13.1,
            long_max: 13.7,
        }
    }

    fn session(
        responses: Vec<(StatusCode, &str)>,
    ) -> HttpSession<QueuedTransport, LogRequestLogger> {
        HttpSession::new(QueuedTransport::new(responses), LogRequestLogger)
    }

    #[tokio::test]
    async fn gauges_per_station_and_connector() {
        let _guard = REGISTRY_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let session = session(vec![(StatusCode::OK, TWO_STATIONS)]);

        collect(&session, bbox(), false).await.unwrap();

        assert_eq!(2, STATIONS_TOTAL_GAUGE.get());
        assert_eq!(
            2.0,
            STATION_EVSE_COUNT_GAUGE
                .with_label_values(&["1", "Ionity", "Berlin"])
                .get()
        );
        assert_eq!(
            350.0,
            STATION_MAX_KW_GAUGE
                .with_label_values(&["1", "Ionity", "Berlin"])
                .get()
        );
        assert_eq!(
            50.0,
            CONNECTOR_MAX_KW_GAUGE
                .with_label_values(&["1", "11", "CHAdeMO"])
                .get()
        );
        assert_eq!(
            50.0,
            STATION_MAX_KW_GAUGE
                .with_label_values(&["2", "Allego", "Berlin"])
                .get()
        );

        let text = read().await.unwrap();
        assert!(text.contains("stations_total 2"));
        assert!(text.contains("station_evse_count"));
        assert!(text.contains("connector_max_kw"));
    }

    #[tokio::test]
    async fn stations_leaving_the_area_are_dropped() {
        let _guard = REGISTRY_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let session = session(vec![
            (StatusCode::OK, TWO_STATIONS),
            (StatusCode::OK, ONE_STATION),
        ]);

        collect(&session, bbox(), false).await.unwrap();
        collect(&session, bbox(), false).await.unwrap();

        let text = read().await.unwrap();
        assert!(text.contains("stations_total 1"));
        assert!(text.contains("station_id=\"1\""));
        assert!(!text.contains("station_id=\"2\""));
        assert!(!text.contains("evse_id=\"11\""));
    }

    #[tokio::test]
    async fn failed_collection_keeps_previous_gauges() {
        let _guard = REGISTRY_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let session = session(vec![
            (StatusCode::OK, ONE_STATION),
            (StatusCode::TOO_MANY_REQUESTS, "[]"),
        ]);

        collect(&session, bbox(), false).await.unwrap();
        let result = collect(&session, bbox(), false).await;

        assert!(matches!(result, Err(api::Error::RateExceeded(_))));
        assert_eq!(1, STATIONS_TOTAL_GAUGE.get());
        let text = read().await.unwrap();
        assert!(text.contains("station_id=\"1\""));
    }

    #[tokio::test]
    async fn transport_failure_is_propagated() {
        let _guard = REGISTRY_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let session = session(Vec::new());

        let result = collect(&session, bbox(), false).await;

        assert!(matches!(result, Err(api::Error::Transport(_))));
    }
}
