use clap::Parser;
use lib_marketdata::loggers::LoggingOptions;
use lib_marketdata::markets::{eod::TWELVEDATA_BASE_URL, prices::COINGECKO_BASE_URL};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Default bind address: every interface.
pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
/// Default listening port.
pub const DEFAULT_PORT: u16 = 8000;

#[derive(Parser, Debug, Clone)]
#[clap(about = "HTTP gateway exposing the market data fetchers", version)]
pub struct Config {
    #[clap(long, env = "MARKET_HOST", default_value_t = DEFAULT_HOST, help = "Interface to bind.")]
    pub host: IpAddr,

    #[clap(long, env = "MARKET_PORT", default_value_t = DEFAULT_PORT, help = "Port to listen on.")]
    pub port: u16,

    #[clap(long, env = "MARKET_LOG_LEVEL", default_value = "info", help = "Log filter used when RUST_LOG is unset.")]
    pub log_level: String,

    #[clap(long, env = "MARKET_LOG_DIR", help = "Directory for daily rolling log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "MARKET_LOG_JSON", help = "Write console logs as JSON.")]
    pub log_json: bool,

    #[clap(
        long = "allowed-host",
        env = "MARKET_ALLOWED_HOSTS",
        value_delimiter = ',',
        help = "Upstream hosts the gateway may fetch from (host or host:port). Defaults to the provider API hosts."
    )]
    pub allowed_hosts: Vec<String>,

    #[clap(long, env = "MARKET_UPSTREAM_TIMEOUT_MS", help = "Timeout in milliseconds for each upstream request. Unset means no timeout.")]
    pub upstream_timeout_ms: Option<u64>,
}

impl Config {
    /// Reads `.env` if present, then CLI arguments and environment variables.
    pub fn load() -> Self {
        // A missing .env file is the normal case.
        let _ = dotenvy::dotenv();
        Config::parse()
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Configured upstream hosts, or the CoinGecko and Twelve Data API hosts when none are given.
    pub fn allowed_hosts(&self) -> Vec<String> {
        if !self.allowed_hosts.is_empty() {
            return self
                .allowed_hosts
                .iter()
                .map(|h| h.trim().to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .collect();
        }
        [COINGECKO_BASE_URL, TWELVEDATA_BASE_URL]
            .iter()
            .filter_map(|base| Url::parse(base).ok())
            .filter_map(|url| url.host_str().map(str::to_string))
            .collect()
    }

    pub fn upstream_timeout(&self) -> Option<Duration> {
        self.upstream_timeout_ms.map(Duration::from_millis)
    }

    pub fn logging_options(&self) -> LoggingOptions {
        LoggingOptions {
            level: self.log_level.clone(),
            json: self.log_json,
            log_dir: self.log_dir.clone(),
            file_prefix: "server_market".to_string(),
            ..Default::default()
        }
    }
}
