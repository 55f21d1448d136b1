use std::{env, fmt::Display, str::FromStr, time::Duration};

use tracing::{info, warn};

const DEFAULT_UPSTREAM: &str =
    "https://data.melbourne.vic.gov.au/api/explore/v2.1/catalog/datasets/on-street-parking-bays/records";

pub struct Config {
    pub port: u16,
    pub upstream_url: String,
    pub page_limit: u32,
    pub cache_ttl: Duration,
    pub fetch_timeout: Duration,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("KERBSIDE_PORT", "3001"),
            upstream_url: try_load("KERBSIDE_UPSTREAM_URL", DEFAULT_UPSTREAM),
            page_limit: try_load("KERBSIDE_PAGE_LIMIT", "100"),
            cache_ttl: Duration::from_secs(try_load("KERBSIDE_CACHE_TTL_SECS", "300")),
            fetch_timeout: Duration::from_secs(try_load("KERBSIDE_FETCH_TIMEOUT_SECS", "30")),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}
