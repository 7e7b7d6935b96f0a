use super::endpoint::Endpoint;
use super::Error;
use crate::model::RequestParams;
use http::StatusCode;
use std::future::Future;

/// Status and undecoded text body of a completed exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: StatusCode,
    pub text: String,
}

/// Performs the GET call for a session. Any failure to complete the exchange is
/// reported as `Error::Transport`.
pub trait Transport {
    fn get(
        &self,
        endpoint: &Endpoint,
        params: &RequestParams,
    ) -> impl Future<Output = Result<RawResponse, Error>> + Send;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    pub api_url: String,
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(api_url: String) -> Result<Self, Error> {
        let client = reqwest::ClientBuilder::new()
            .build()
            .or(Err(Error::InternalError))?;

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_owned(),
            client,
        })
    }
}

fn map_transport_err(error: reqwest::Error) -> Error {
    Error::Transport(error.to_string())
}

impl Transport for ReqwestTransport {
    async fn get(&self, endpoint: &Endpoint, params: &RequestParams) -> Result<RawResponse, Error> {
        let url = format!("{}{}", self.api_url, endpoint);

        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(map_transport_err)?;

        let status = response.status();
        let text = response.text().await.map_err(map_transport_err)?;

        Ok(RawResponse { status, text })
    }
}
