use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub type AppResult<T> = Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// the chain was still redirecting when the hop budget ran out
    #[error("Too many redirects (limit {limit})")]
    RedirectLimitExceeded { limit: u32 },

    /// anything that went wrong talking to the relay or the cdn behind it
    #[error("Upstream request failed: {0}")]
    UpstreamUnreachable(String),

    #[error("Malformed redirect location: {0}")]
    MalformedLocation(String),

    #[error("{0}")]
    BadRequest(String),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            // every upstream side failure is surfaced as a plain 500 with the reason attached
            Error::RedirectLimitExceeded { .. }
            | Error::UpstreamUnreachable(_)
            | Error::MalformedLocation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// short label used for the failure counter
    pub fn kind(&self) -> &'static str {
        match self {
            Error::RedirectLimitExceeded { .. } => "redirect_limit",
            Error::UpstreamUnreachable(_) => "upstream_unreachable",
            Error::MalformedLocation(_) => "malformed_location",
            Error::BadRequest(_) => "bad_request",
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::UpstreamUnreachable(e.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed with {}: {}", status, self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
