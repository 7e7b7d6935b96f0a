use super::endpoint::Endpoint;
use crate::model::RequestParams;
use http::Method;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Sink for outgoing requests of an `HttpSession`.
pub trait RequestLogger {
    fn log_request(&self, method: &Method, endpoint: &Endpoint, params: &RequestParams);
}

impl<L: RequestLogger + ?Sized> RequestLogger for Box<L> {
    fn log_request(&self, method: &Method, endpoint: &Endpoint, params: &RequestParams) {
        (**self).log_request(method, endpoint, params)
    }
}

/// Logs requests through the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRequestLogger;

impl RequestLogger for LogRequestLogger {
    fn log_request(&self, method: &Method, endpoint: &Endpoint, params: &RequestParams) {
        log::info!("{} {} params: {}", method, endpoint, params);
    }
}

/// Appends one line per request to `path`.
#[derive(Debug, Clone)]
pub struct FileRequestLogger {
    path: PathBuf,
}

impl FileRequestLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RequestLogger for FileRequestLogger {
    fn log_request(&self, method: &Method, endpoint: &Endpoint, params: &RequestParams) {
        let written = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| writeln!(file, "{} {} {}", method, endpoint, params));

        if let Err(e) = written {
            log::warn!(
                "Unable to write request log to {}: {}",
                self.path.display(),
                e
            );
        }
    }
}
