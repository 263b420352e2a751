//! # Spot & Intraday Prices
//!
//! Price lookups, usually served by CoinGecko. `get_prices` and
//! `get_coingecko` are both the generic fetcher; `simple_price_request` only
//! assembles the parameters for CoinGecko's `/simple/price` endpoint.

use crate::retrieve::ky_http::FetchRequest;

/// Fetches spot or intraday prices. Same function as `fetch_json`.
pub use crate::retrieve::ky_http::fetch_json as get_prices;

/// CoinGecko-flavoured name for [`get_prices`].
pub use crate::retrieve::ky_http::fetch_json as get_coingecko;

/// Base URL of the public CoinGecko v3 API.
pub const COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Builds a `/simple/price` request for the given coin ids and quote currencies.
///
/// Both lists are sent comma-separated, in the order given.
pub fn simple_price_request(ids: &[&str], vs_currencies: &[&str]) -> FetchRequest {
    FetchRequest::new(format!("{}/simple/price", COINGECKO_BASE_URL))
        .query("ids", ids.join(","))
        .query("vs_currencies", vs_currencies.join(","))
}
