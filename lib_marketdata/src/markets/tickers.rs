//! # Ticker & Exchange Data
//!
//! Ticker lookups have no fixed provider: the caller passes the endpoint.

use crate::retrieve::ky_http::FetchRequest;

/// Fetches ticker or exchange data. Same function as `fetch_json`.
pub use crate::retrieve::ky_http::fetch_json as fetch_ticker;

/// Builds a request for `endpoint?symbol=<symbol>`.
pub fn ticker_request(endpoint: &str, symbol: &str) -> FetchRequest {
    FetchRequest::new(endpoint).query("symbol", symbol)
}
