//! # Data Retrieval Module
//!
//! This module provides a centralized location for generic data retrieval
//! over HTTP.
//!
//! ## Purpose:
//! Every market-data call site in the workspace does the same thing: issue one
//! GET request, refuse anything outside the 2xx range, and hand back the JSON
//! body untouched. Keeping that in a single place means the provider modules
//! under `markets` are nothing more than names for it.
//!
//! ## Contained Modules:
//!
//! - **`ky_http`**: `FetchRequest` (endpoint, ordered query pairs, headers,
//!   optional timeout), the `FetchError` taxonomy, the reusable `ApiClient`
//!   and the free function `fetch_json`.
//!
//! Nothing in this module retries, caches or rewrites responses. Errors are
//! returned to the caller exactly as they were classified.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Generic HTTP GET client returning decoded JSON bodies.
pub mod ky_http;
