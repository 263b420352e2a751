//! # Gateway Routes
//!
//! - `GET /status` → `{"ts": <rfc3339>}`
//! - `GET /ticker`, `GET /prices`, `GET /eod` → upstream JSON, unchanged.
//!
//! The data routes read the upstream URL from the `endpoint` query parameter
//! and forward every other parameter, in order, to that URL. Only hosts on
//! the gateway's allow-list are fetched.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{RawQuery, State},
    routing::get,
};
use chrono::Utc;
use lib_marketdata::FetchRequest;
use lib_marketdata::markets::{fetch_ticker, get_eod, get_prices};
use serde_json::{Value, json};
use tracing::debug;
use url::form_urlencoded;

use super::config::Config;
use super::error::AppError;

/// Name of the query parameter holding the upstream URL.
pub const ENDPOINT_PARAM: &str = "endpoint";

/// Settings shared by every data route.
#[derive(Debug, Clone, Default)]
pub struct GatewayState {
    /// Upstream hosts that may be fetched, as `host` or `host:port`, lowercase.
    pub allowed_hosts: Vec<String>,
    /// Timeout applied to each upstream request.
    pub timeout: Option<Duration>,
}

impl GatewayState {
    pub fn from_config(config: &Config) -> Self {
        Self {
            allowed_hosts: config.allowed_hosts(),
            timeout: config.upstream_timeout(),
        }
    }

    /// Checks `host` (with its effective `port`) against the allow-list.
    pub fn allows(&self, host: &str, port: Option<u16>) -> bool {
        let host = host.to_ascii_lowercase();
        let with_port = port.map(|p| format!("{}:{}", host, p));
        self.allowed_hosts
            .iter()
            .any(|entry| *entry == host || Some(entry) == with_port.as_ref())
    }
}

pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/ticker", get(ticker))
        .route("/prices", get(prices))
        .route("/eod", get(eod))
        .with_state(Arc::new(state))
}

/// Splits an incoming query string into the upstream endpoint and the pairs to forward.
///
/// The first `endpoint` parameter names the upstream; everything else,
/// including any later `endpoint` pair, is forwarded in its original order.
/// The endpoint must be absolute and its host allowed by `state`.
pub fn forwarded_request(
    raw_query: Option<&str>,
    state: &GatewayState,
) -> Result<FetchRequest, AppError> {
    let mut endpoint = None;
    let mut forwarded = Vec::new();

    for (key, value) in form_urlencoded::parse(raw_query.unwrap_or_default().as_bytes()) {
        if key == ENDPOINT_PARAM && endpoint.is_none() {
            endpoint = Some(value.into_owned());
        } else {
            forwarded.push((key.into_owned(), value.into_owned()));
        }
    }

    let endpoint = endpoint.ok_or(AppError::MissingEndpoint)?;
    let mut request = FetchRequest::new(endpoint).queries(forwarded);

    let url = request.url()?;
    let host = url.host_str().unwrap_or_default();
    if !state.allows(host, url.port_or_known_default()) {
        return Err(AppError::EndpointNotAllowed(host.to_string()));
    }

    if let Some(timeout) = state.timeout {
        request = request.timeout(timeout);
    }
    debug!("Forwarding {} query parameters to {}", request.query.len(), host);
    Ok(request)
}

async fn status() -> Json<Value> {
    Json(json!({ "ts": Utc::now().to_rfc3339() }))
}

async fn ticker(
    State(state): State<Arc<GatewayState>>,
    RawQuery(query): RawQuery,
) -> Result<Json<Value>, AppError> {
    let request = forwarded_request(query.as_deref(), &state)?;
    Ok(Json(fetch_ticker(&request).await?))
}

async fn prices(
    State(state): State<Arc<GatewayState>>,
    RawQuery(query): RawQuery,
) -> Result<Json<Value>, AppError> {
    let request = forwarded_request(query.as_deref(), &state)?;
    Ok(Json(get_prices(&request).await?))
}

async fn eod(
    State(state): State<Arc<GatewayState>>,
    RawQuery(query): RawQuery,
) -> Result<Json<Value>, AppError> {
    let request = forwarded_request(query.as_deref(), &state)?;
    Ok(Json(get_eod(&request).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use pretty_assertions::assert_eq;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    /// Allows the loopback upstreams the tests run against.
    fn local_state() -> GatewayState {
        GatewayState {
            allowed_hosts: vec!["127.0.0.1".to_string()],
            timeout: None,
        }
    }

    async fn spawn_gateway_with(state: GatewayState) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn spawn_gateway() -> String {
        spawn_gateway_with(local_state()).await
    }

    async fn get_gateway(url: &str, query: &[(&str, &str)]) -> (u16, Value) {
        let response = reqwest::Client::new()
            .get(url)
            .query(query)
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        let body = response.text().await.unwrap();
        (status, serde_json::from_str(&body).unwrap())
    }

    #[test]
    fn forwarded_request_splits_endpoint_from_params() {
        let state = GatewayState {
            allowed_hosts: vec!["example.test".to_string()],
            timeout: None,
        };
        let request = forwarded_request(
            Some("ids=bitcoin&endpoint=https%3A%2F%2Fexample.test%2Fprice&vs_currencies=usd"),
            &state,
        )
        .unwrap();
        assert_eq!(request.endpoint, "https://example.test/price");
        assert_eq!(
            request.query,
            vec![
                ("ids".to_string(), "bitcoin".to_string()),
                ("vs_currencies".to_string(), "usd".to_string()),
            ]
        );
    }

    #[test]
    fn forwarded_request_requires_endpoint() {
        let state = local_state();
        assert!(matches!(
            forwarded_request(Some("symbol=BTC"), &state),
            Err(AppError::MissingEndpoint)
        ));
        assert!(matches!(
            forwarded_request(None, &state),
            Err(AppError::MissingEndpoint)
        ));
    }

    #[test]
    fn forwarded_request_rejects_hosts_off_the_allow_list() {
        let state = GatewayState {
            allowed_hosts: vec!["api.coingecko.com".to_string(), "127.0.0.1:9000".to_string()],
            timeout: None,
        };
        let err = forwarded_request(Some("endpoint=http%3A%2F%2F169.254.169.254%2Flatest"), &state)
            .unwrap_err();
        assert!(matches!(err, AppError::EndpointNotAllowed(ref host) if host == "169.254.169.254"));

        // A host:port entry only matches that port.
        assert!(forwarded_request(Some("endpoint=http%3A%2F%2F127.0.0.1%3A9000%2Fa"), &state).is_ok());
        assert!(matches!(
            forwarded_request(Some("endpoint=http%3A%2F%2F127.0.0.1%3A9001%2Fa"), &state),
            Err(AppError::EndpointNotAllowed(_))
        ));
        // Host names compare case-insensitively and the default port counts.
        assert!(
            forwarded_request(Some("endpoint=https%3A%2F%2FAPI.CoinGecko.com%2Fapi%2Fv3%2Fping"), &state)
                .is_ok()
        );
    }

    #[test]
    fn forwarded_request_applies_the_gateway_timeout() {
        let state = GatewayState {
            timeout: Some(Duration::from_millis(250)),
            ..local_state()
        };
        let request = forwarded_request(Some("endpoint=http%3A%2F%2F127.0.0.1%2Fprice"), &state).unwrap();
        assert_eq!(request.timeout, Some(Duration::from_millis(250)));
    }

    #[tokio::test]
    async fn status_route_reports_timestamp() {
        let gateway = spawn_gateway().await;
        let (status, body) = get_gateway(&format!("{gateway}/status"), &[]).await;
        assert_eq!(status, 200);
        assert!(body["ts"].as_str().is_some());
    }

    #[tokio::test]
    async fn prices_route_returns_upstream_json() {
        let mut upstream = Server::new_async().await;
        let mock = upstream
            .mock("GET", "/simple/price")
            .match_query(Matcher::Exact("ids=bitcoin&vs_currencies=usd".into()))
            .with_status(200)
            .with_body(r#"{"bitcoin":{"usd":12345.6}}"#)
            .create_async()
            .await;

        let gateway = spawn_gateway().await;
        let endpoint = format!("{}/simple/price", upstream.url());
        let (status, body) = get_gateway(
            &format!("{gateway}/prices"),
            &[
                ("endpoint", endpoint.as_str()),
                ("ids", "bitcoin"),
                ("vs_currencies", "usd"),
            ],
        )
        .await;

        mock.assert_async().await;
        assert_eq!(status, 200);
        assert_eq!(body, json!({"bitcoin": {"usd": 12345.6}}));
    }

    #[tokio::test]
    async fn ticker_and_eod_routes_use_the_same_fetcher() {
        let mut upstream = Server::new_async().await;
        let mock = upstream
            .mock("GET", "/price")
            .match_query(Matcher::UrlEncoded("symbol".into(), "BTC".into()))
            .with_status(200)
            .with_body(r#"{"symbol":"BTC","price":12345.6}"#)
            .expect(2)
            .create_async()
            .await;

        let gateway = spawn_gateway().await;
        let endpoint = format!("{}/price", upstream.url());
        let query = [("endpoint", endpoint.as_str()), ("symbol", "BTC")];
        let (_, ticker) = get_gateway(&format!("{gateway}/ticker"), &query).await;
        let (_, eod) = get_gateway(&format!("{gateway}/eod"), &query).await;

        mock.assert_async().await;
        assert_eq!(ticker, eod);
        assert_eq!(ticker, json!({"symbol": "BTC", "price": 12345.6}));
    }

    #[tokio::test]
    async fn upstream_not_found_becomes_bad_gateway() {
        let mut upstream = Server::new_async().await;
        let _mock = upstream
            .mock("GET", "/price")
            .with_status(404)
            .with_body(r#"{"error":"not found"}"#)
            .create_async()
            .await;

        let gateway = spawn_gateway().await;
        let endpoint = format!("{}/price", upstream.url());
        let (status, body) = get_gateway(
            &format!("{gateway}/ticker"),
            &[("endpoint", endpoint.as_str()), ("symbol", "BTC")],
        )
        .await;

        assert_eq!(status, 502);
        assert_eq!(body["error_type"], "UpstreamStatus");
        assert_eq!(body["upstream_status"], 404);
        assert_eq!(body["upstream_body"], r#"{"error":"not found"}"#);
    }

    #[tokio::test]
    async fn missing_endpoint_is_bad_request() {
        let gateway = spawn_gateway().await;
        let (status, body) = get_gateway(&format!("{gateway}/eod"), &[("symbol", "AAPL")]).await;
        assert_eq!(status, 400);
        assert_eq!(body["error_type"], "MissingEndpoint");
    }

    #[tokio::test]
    async fn relative_endpoint_is_bad_request() {
        let gateway = spawn_gateway().await;
        let (status, body) =
            get_gateway(&format!("{gateway}/prices"), &[("endpoint", "/simple/price")]).await;
        assert_eq!(status, 400);
        assert_eq!(body["error_type"], "InvalidEndpoint");
    }

    #[tokio::test]
    async fn endpoint_off_the_allow_list_is_bad_request() {
        let gateway = spawn_gateway().await;
        let (status, body) = get_gateway(
            &format!("{gateway}/ticker"),
            &[("endpoint", "http://169.254.169.254/latest/meta-data")],
        )
        .await;
        assert_eq!(status, 400);
        assert_eq!(body["error_type"], "EndpointNotAllowed");
        assert_eq!(body["detail"], "169.254.169.254");
    }

    #[tokio::test]
    async fn stalled_upstream_becomes_gateway_timeout() {
        // Accepts the connection and never answers.
        let upstream = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let upstream_addr = upstream.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = upstream.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let gateway = spawn_gateway_with(GatewayState {
            timeout: Some(Duration::from_millis(50)),
            ..local_state()
        })
        .await;
        let endpoint = format!("http://{upstream_addr}/price");
        let (status, body) =
            get_gateway(&format!("{gateway}/prices"), &[("endpoint", endpoint.as_str())]).await;

        assert_eq!(status, 504);
        assert_eq!(body["error_type"], "UpstreamTransport");
    }

    #[tokio::test]
    async fn large_numbers_pass_through_unchanged() {
        let mut upstream = Server::new_async().await;
        let _mock = upstream
            .mock("GET", "/quote")
            .with_status(200)
            .with_body(r#"{"n":18446744073709551616,"g":2.2250738585072011e-308}"#)
            .create_async()
            .await;

        let gateway = spawn_gateway().await;
        let endpoint = format!("{}/quote", upstream.url());
        let response = reqwest::Client::new()
            .get(format!("{gateway}/eod"))
            .query(&[("endpoint", endpoint.as_str())])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
        let text = response.text().await.unwrap();

        assert!(text.contains("18446744073709551616"), "got {text}");
        let body: Value = serde_json::from_str(&text).unwrap();
        let expected_g: f64 = "2.2250738585072011e-308".parse().unwrap();
        assert_eq!(body["g"].as_f64().unwrap().to_bits(), expected_g.to_bits());
    }
}
