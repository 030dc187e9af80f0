//! Environment configuration
//!
//! Every setting except `DATABASE_URL` has a default. A variable that is set
//! but does not parse is a startup error.

use anyhow::{Context, bail};
use gateway::{DEFAULT_API_VERSION, GatewayConfig};
use shop_sync::SchedulerConfig;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:31113";
const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:40922,http://127.0.0.1:40922";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub listen_addr: SocketAddr,
    pub frontend_origins: Vec<String>,
    pub shopify_api_version: String,
    pub scheduler: SchedulerConfig,
    pub gateway: GatewayConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let Some(database_url) = lookup("DATABASE_URL") else {
            bail!("DATABASE_URL must be set in environment");
        };

        let parse = |key: &str| -> anyhow::Result<Option<u64>> {
            lookup(key)
                .map(|raw| parse_value::<u64>(key, &raw))
                .transpose()
        };

        let defaults = SchedulerConfig::default();
        let scheduler = SchedulerConfig {
            sync_interval: parse("SYNC_INTERVAL_SECS")?
                .map_or(defaults.sync_interval, Duration::from_secs),
            inactivity_threshold: parse("INACTIVITY_THRESHOLD_SECS")?
                .map_or(defaults.inactivity_threshold, Duration::from_secs),
            cleanup_interval: parse("CLEANUP_INTERVAL_SECS")?
                .map_or(defaults.cleanup_interval, Duration::from_secs),
            ..defaults
        };

        let base = GatewayConfig::default();
        let max_requests = match lookup("GATEWAY_MAX_REQUESTS_PER_WINDOW") {
            Some(raw) => parse_value::<u32>("GATEWAY_MAX_REQUESTS_PER_WINDOW", &raw)?,
            None => base.rate_limit.max_requests,
        };
        let max_retries = match lookup("GATEWAY_MAX_RETRIES") {
            Some(raw) => parse_value::<u32>("GATEWAY_MAX_RETRIES", &raw)?,
            None => base.retry.max_retries,
        };
        let window = parse("GATEWAY_WINDOW_MS")?.map_or(base.rate_limit.window, Duration::from_millis);
        let retry_delay =
            parse("GATEWAY_RETRY_DELAY_MS")?.map_or(base.retry.base_delay, Duration::from_millis);
        let request_gap =
            parse("GATEWAY_REQUEST_GAP_MS")?.map_or(base.request_gap, Duration::from_millis);

        let gateway = base
            .with_rate_limit(max_requests, window)
            .with_retry(max_retries, retry_delay)
            .with_request_gap(request_gap);

        let listen_addr = lookup("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = parse_value::<SocketAddr>("LISTEN_ADDR", &listen_addr)?;

        let frontend_origins = lookup("FRONTEND_ORIGINS")
            .unwrap_or_else(|| DEFAULT_FRONTEND_ORIGINS.to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            database_url,
            listen_addr,
            frontend_origins,
            shopify_api_version: lookup("SHOPIFY_API_VERSION")
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            scheduler,
            gateway,
        })
    }
}

fn parse_value<T>(key: &str, raw: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("{key} has an invalid value: {raw:?}"))
}
