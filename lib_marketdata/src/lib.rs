//! # lib_marketdata
//!
//! Shared building blocks for fetching market data over HTTP.
//!
//! Every module sits behind a cargo feature named after its folder so that
//! binaries only pull in the dependencies they use:
//!
//! - **`retrieve`**: the generic GET + JSON decode fetcher (`ky_http`).
//! - **`markets`**: provider call sites (`tickers`, `prices`, `eod`) that
//!   re-export the fetcher under market-specific names.
//! - **`loggers`**: `tracing` subscriber setup and log file cleanup.
//!
//! Enable `full` to get all of them.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Tracing subscriber setup with console and rolling file output.
#[cfg(feature = "loggers")]
pub mod loggers;

/// Market data providers built on top of the generic fetcher.
#[cfg(feature = "markets")]
pub mod markets;

/// Generic HTTP retrieval.
#[cfg(feature = "retrieve")]
pub mod retrieve;

#[cfg(feature = "retrieve")]
pub use retrieve::ky_http::{fetch_json, ApiClient, FetchError, FetchRequest};
