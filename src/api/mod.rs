pub mod endpoint;
pub mod error;
pub mod logger;
pub mod transport;

use crate::model;
pub use error::Error;
use http::{Method, StatusCode};
pub use logger::{FileRequestLogger, LogRequestLogger, RequestLogger};
use serde_json::{Map, Value};
pub use transport::{RawResponse, ReqwestTransport, Transport};

/// Parsed response body: ordered sequence of JSON mappings.
pub type ResponseBody = Vec<Map<String, Value>>;

/// Issues single GET requests through `transport`, reporting them to `logger`.
#[derive(Debug, Clone)]
pub struct HttpSession<T, L = LogRequestLogger> {
    transport: T,
    logger: L,
}

/// Session against `api_url` logging through the `log` facade.
pub fn session(api_url: String) -> Result<HttpSession<ReqwestTransport>, Error> {
    Ok(HttpSession::new(
        ReqwestTransport::new(api_url)?,
        LogRequestLogger,
    ))
}

impl<T: Transport, L: RequestLogger> HttpSession<T, L> {
    pub fn new(transport: T, logger: L) -> Self {
        Self { transport, logger }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn logger(&self) -> &L {
        &self.logger
    }

    /// Send one request and parse its body.
    ///
    /// `do_logging` is removed from `params` when present and decides whether the request is
    /// passed to the logger (default: logged). The remaining `params` are sent as query string.
    /// The status code is returned as received, it is not inspected here.
    pub async fn send_request(
        &self,
        method: &Method,
        endpoint: &endpoint::Endpoint,
        params: &mut model::RequestParams,
    ) -> Result<(StatusCode, ResponseBody), Error> {
        if *method != Method::GET {
            return Err(Error::UnsupportedMethod(method.to_string()));
        }

        if params.take_logging_flag() {
            self.logger.log_request(method, endpoint, params);
        }

        let response = self.transport.get(endpoint, params).await.map_err(|e| {
            log::debug!("{} {} failed: {:?}", method, endpoint, e);
            e
        })?;

        log::trace!(
            "endpoint: {}, params: {}, status: {}, response_text: {}",
            endpoint,
            params,
            response.status,
            response.text
        );

        let body = serde_json::from_str::<ResponseBody>(&response.text)
            .map_err(|e| Error::InvalidResponse(response.text.clone(), e.to_string()))?;

        Ok((response.status, body))
    }
}

/// Map non-2xx status of an otherwise complete exchange to Error
fn map_status(status: StatusCode) -> Result<(), Error> {
    match status {
        s if s.is_success() => Ok(()),
        StatusCode::TOO_MANY_REQUESTS => Err(Error::RateExceeded(status.to_string())),
        _ => Err(Error::ApiError(status.to_string())),
    }
}

/// List all stations within `bbox`.
pub async fn stations<T: Transport, L: RequestLogger>(
    session: &HttpSession<T, L>,
    bbox: model::BoundingBox,
    do_logging: bool,
) -> Result<Vec<model::Station>, Error> {
    let mut params = model::RequestParams::from(bbox);
    if !do_logging {
        params.insert(model::DO_LOGGING, false);
    }

    let (status, body) = session
        .send_request(&Method::GET, endpoint::STATIONS, &mut params)
        .await?;
    map_status(status)?;

    body.into_iter()
        .map(|station| {
            serde_json::from_value::<model::Station>(Value::Object(station))
                .or(Err(Error::UnexpectedApiResponse))
                .and_then(|station| {
                    if station.is_well_formed() {
                        Ok(station)
                    } else {
                        log::warn!("Station {} has no EVSEs or connectors", station.id);
                        Err(Error::UnexpectedApiResponse)
                    }
                })
        })
        .collect()
}
