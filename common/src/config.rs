use std::env;
use std::path::PathBuf;

use chrono::Duration;

pub const DEFAULT_PRICE_AREA: &str = "NO1";

pub const DEFAULT_BASE_URL: &str = "https://www.hvakosterstrommen.no/api/v1/prices";

pub const DEFAULT_WRITE_URL: &str = "https://promscale.service.ruud.cloud/write";
pub const DEFAULT_QUERY_URL: &str = "https://promscale.service.ruud.cloud/api/v1/query";

/// Metric the spot prices are ingested under.
pub const METRIC_NAME: &str = "price_electricity";

/// Runtime configuration, read from the environment once at startup and
/// passed into whoever needs it.
#[derive(Debug, Clone)]
pub struct Config {
    /// Electricity bidding zone, e.g. "NO1" for south-east Norway.
    pub price_area: String,
    pub base_url: String,
    pub write_url: String,
    pub query_url: String,
    /// PEM bundle used to verify the store's TLS certificate. When unset,
    /// certificate verification is disabled.
    pub cert_path: Option<PathBuf>,
    /// Basic-auth credentials for the store endpoints.
    pub credentials: Option<(String, String)>,
    /// How far past "now" the default sync window extends. Tomorrow's
    /// prices get published during the afternoon, so the window has to
    /// reach a bit into the future.
    pub end_grace: Duration,
}

fn env_str(name: &str, default: &str) -> String {
    env_opt(name).unwrap_or_else(|| default.to_string())
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_i64(name: &str, default: i64) -> i64 {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        let credentials = match (env_opt("PROMSCALE_USERNAME"), env_opt("PROMSCALE_PASSWORD")) {
            (Some(username), Some(password)) => Some((username, password)),
            _ => None,
        };

        Self {
            price_area: env_str("PRICE_AREA", DEFAULT_PRICE_AREA),
            base_url: env_str("STROM_BASE_URL", DEFAULT_BASE_URL),
            write_url: env_str("PROMSCALE_WRITE_URL", DEFAULT_WRITE_URL),
            query_url: env_str("PROMSCALE_QUERY_URL", DEFAULT_QUERY_URL),
            cert_path: env_opt("PROMSCALE_CERT_PATH").map(PathBuf::from),
            credentials,
            end_grace: Duration::hours(env_i64("STROM_END_GRACE_HOURS", 24)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_str_falls_back_to_default() {
        assert_eq!(env_str("STROM_TEST_UNSET_VAR", "NO1"), "NO1");
    }

    #[test]
    fn env_opt_treats_blank_as_unset() {
        env::set_var("STROM_TEST_BLANK_VAR", "   ");
        assert_eq!(env_opt("STROM_TEST_BLANK_VAR"), None);
    }

    #[test]
    fn env_i64_ignores_garbage() {
        env::set_var("STROM_TEST_GARBAGE_VAR", "not-a-number");
        assert_eq!(env_i64("STROM_TEST_GARBAGE_VAR", 24), 24);
    }
}
