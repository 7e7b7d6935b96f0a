use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::response::{self, Responder, Response};
use std::fmt;
use std::io::Cursor;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Request could not complete: connection failure, timeout or unreadable body.
    Transport(String),
    /// Response body (first) is not a JSON array of objects (second is the reason).
    InvalidResponse(String, String),
    UnsupportedMethod(String),
    ApiError(String),
    RateExceeded(String),
    UnexpectedApiResponse,
    FormatError,
    InternalError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Transport(s) => write!(f, "request could not complete: {}", s),
            Error::InvalidResponse(body, reason) => {
                write!(f, "invalid response ({}): {}", reason, body)
            }
            Error::UnsupportedMethod(m) => write!(f, "unsupported method {}", m),
            Error::ApiError(s) => write!(f, "API error: {}", s),
            Error::RateExceeded(s) => write!(f, "rate exceeded: {}", s),
            Error::UnexpectedApiResponse => write!(f, "unexpected API response"),
            Error::FormatError => write!(f, "format error"),
            Error::InternalError => write!(f, "internal error"),
        }
    }
}

impl std::error::Error for Error {}

fn html(status: Status, error: String) -> response::Result<'static> {
    Response::build()
        .status(status)
        .sized_body(error.len(), Cursor::new(error))
        .header(ContentType::new("text", "html"))
        .ok()
}

impl<'r> Responder<'r, 'static> for Error {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        match self {
            Error::RateExceeded(s) => html(
                Status::TooManyRequests,
                format!("<html><body><h3>429 Too Many Requests</h3>Downstream API response: <code>{}</code></body></html>", s),
            ),
            Error::Transport(s) => html(
                Status::BadGateway,
                format!("<html><body><h3>502 Bad Gateway</h3>Downstream API unreachable: <code>{}</code></body></html>", s),
            ),
            _ => html(
                Status::InternalServerError,
                format!(
                    "<html><body><h3>Unknown exception</h3><code>{:?}</code></body></html>",
                    self
                ),
            ),
        }
    }
}
