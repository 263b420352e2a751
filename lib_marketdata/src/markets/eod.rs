//! # End-of-Day Series
//!
//! End-of-day and historical series, usually served by Twelve Data.
//! `get_eod` and `get_twelvedata` are the generic fetcher under two names.

use crate::retrieve::ky_http::FetchRequest;

/// Fetches end-of-day data. Same function as `fetch_json`.
pub use crate::retrieve::ky_http::fetch_json as get_eod;

/// Twelve Data flavoured name for [`get_eod`].
pub use crate::retrieve::ky_http::fetch_json as get_twelvedata;

/// Base URL of the Twelve Data REST API.
pub const TWELVEDATA_BASE_URL: &str = "https://api.twelvedata.com";

/// Builds a `/eod` request for the latest end-of-day quote of `symbol`.
pub fn eod_request(symbol: &str, api_key: &str) -> FetchRequest {
    FetchRequest::new(format!("{}/eod", TWELVEDATA_BASE_URL))
        .query("symbol", symbol)
        .query("apikey", api_key)
}

/// Builds a `/time_series` request, e.g. `interval = "1day"`.
pub fn time_series_request(symbol: &str, interval: &str, api_key: &str) -> FetchRequest {
    FetchRequest::new(format!("{}/time_series", TWELVEDATA_BASE_URL))
        .query("symbol", symbol)
        .query("interval", interval)
        .query("apikey", api_key)
}
