use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_ELEXON_BASE_URL: &str = "https://data.elexon.co.uk/bmrs/api/v1";
const DEFAULT_USER_AGENT: &str = "GridDashboard/0.1 (+https://github.com/grid-dashboard)";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8050;

/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the Elexon BMRS Insights API (without trailing slash).
    pub elexon_base_url: String,
    pub elexon_user_agent: String,
    pub http_timeout: Duration,
    /// Directory holding the `FUELINST.*` / `TSDF.*` fallback files.
    pub data_dir: PathBuf,
    pub host: IpAddr,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let default_host = IpAddr::from([127, 0, 0, 1]);
        Self {
            elexon_base_url: std::env::var("ELEXON_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_ELEXON_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            elexon_user_agent: std::env::var("ELEXON_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            http_timeout: Duration::from_secs(parse_or_default(
                "HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            )),
            data_dir: PathBuf::from(std::env::var("DATA_DIR").unwrap_or_else(|_| ".".to_string())),
            host: std::env::var("HOST")
                .ok()
                .and_then(|h| match h.parse() {
                    Ok(ip) => Some(ip),
                    Err(_) => {
                        tracing::warn!("HOST '{}' is not an IP address, using {}", h, DEFAULT_HOST);
                        None
                    }
                })
                .unwrap_or(default_host),
            port: parse_or_default("PORT", DEFAULT_PORT),
        }
    }
}

/// Read and parse an environment variable, falling back to `default` when it
/// is unset or unparsable.
fn parse_or_default<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("{} '{}' is invalid, using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
