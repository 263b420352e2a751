//! # Gateway Errors
//!
//! Maps fetch failures onto HTTP responses with a JSON body of the form
//! `{"error_type", "message", "detail", ...}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lib_marketdata::FetchError;
use serde_json::json;
use tracing::{error, warn};

#[derive(Debug)]
pub enum AppError {
    /// The query string carried no `endpoint` parameter.
    MissingEndpoint,
    /// The endpoint's host is not on the gateway's allow-list.
    EndpointNotAllowed(String),
    /// The upstream fetch failed.
    Fetch(FetchError),
}

impl From<FetchError> for AppError {
    fn from(e: FetchError) -> Self {
        AppError::Fetch(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_json) = match self {
            AppError::MissingEndpoint => {
                warn!("Request without endpoint parameter");
                (
                    StatusCode::BAD_REQUEST,
                    json!({
                        "error_type": "MissingEndpoint",
                        "message": "The query string must contain endpoint=<absolute url>.",
                    }),
                )
            }
            AppError::EndpointNotAllowed(host) => {
                warn!("Rejected endpoint host {}", host);
                (
                    StatusCode::BAD_REQUEST,
                    json!({
                        "error_type": "EndpointNotAllowed",
                        "message": "The endpoint host is not on the gateway allow-list.",
                        "detail": host
                    }),
                )
            }
            AppError::Fetch(FetchError::InvalidEndpoint(e)) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error_type": "InvalidEndpoint",
                    "message": "The endpoint is not an absolute URL.",
                    "detail": e.to_string()
                }),
            ),
            AppError::Fetch(FetchError::InvalidHeader(detail)) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error_type": "InvalidHeader",
                    "message": "A request header could not be encoded.",
                    "detail": detail
                }),
            ),
            AppError::Fetch(FetchError::Status { status, body }) => {
                error!("Upstream returned status {}", status);
                (
                    StatusCode::BAD_GATEWAY,
                    json!({
                        "error_type": "UpstreamStatus",
                        "message": "The upstream endpoint answered with a non-success status.",
                        "upstream_status": status,
                        "upstream_body": body
                    }),
                )
            }
            AppError::Fetch(FetchError::Decode(e)) => {
                error!("Upstream body is not JSON: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    json!({
                        "error_type": "UpstreamDecode",
                        "message": "The upstream endpoint did not return valid JSON.",
                        "detail": e.to_string()
                    }),
                )
            }
            AppError::Fetch(FetchError::Transport(e)) => {
                error!("Upstream request failed: {}", e);
                let status = if e.is_timeout() {
                    StatusCode::GATEWAY_TIMEOUT
                } else {
                    StatusCode::BAD_GATEWAY
                };
                (
                    status,
                    json!({
                        "error_type": "UpstreamTransport",
                        "message": "The upstream endpoint could not be reached.",
                        "detail": e.to_string()
                    }),
                )
            }
        };
        (status, Json(error_json)).into_response()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::MissingEndpoint => write!(f, "missing endpoint parameter"),
            AppError::EndpointNotAllowed(host) => write!(f, "endpoint host not allowed: {}", host),
            AppError::Fetch(e) => write!(f, "fetch error: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::MissingEndpoint | AppError::EndpointNotAllowed(_) => None,
            AppError::Fetch(e) => Some(e),
        }
    }
}
