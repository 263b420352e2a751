//! # Financial Market APIs Module
//!
//! This module groups the call sites that fetch market data from external
//! providers. Each provider module exposes the generic fetcher from
//! `crate::retrieve::ky_http` under a name describing the kind of data it is
//! used for, plus small builders that assemble a `FetchRequest` for that
//! provider's well-known endpoints.
//!
//! ## Contained Modules:
//!
//! - **`tickers`**: ticker and exchange listings (`fetch_ticker`).
//! - **`prices`**: intraday and spot prices (`get_prices`, alias
//!   `get_coingecko`).
//! - **`eod`**: end-of-day series (`get_eod`, alias `get_twelvedata`).
//!
//! Every one of those names is a `pub use` of `fetch_json`. There is no
//! provider-specific fetch logic: the same request produces the same result
//! whichever name is called.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// End-of-day series (Twelve Data).
pub mod eod;
/// Intraday and spot prices (CoinGecko).
pub mod prices;
/// Ticker and exchange data.
pub mod tickers;

pub use eod::{get_eod, get_twelvedata};
pub use prices::{get_coingecko, get_prices};
pub use tickers::fetch_ticker;
