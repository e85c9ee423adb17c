//! Server settings.
//!
//! Layered with the `config` crate, lowest priority first:
//! 1. built-in defaults
//! 2. an optional `memo-relay.toml` (path overridable via `MEMO_CONFIG_FILE`)
//! 3. `MEMO_*` environment variables, e.g. `MEMO_PORT=9000`

use std::net::SocketAddr;
use std::time::Duration;

use config::builder::DefaultState;
use chrono::Utc;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use memo_core::ExpiryPolicy;
use memo_store::{CacheConfig, SweepConfig};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "memo-relay.toml";
pub const CONFIG_FILE_ENV: &str = "MEMO_CONFIG_FILE";
const ENV_PREFIX: &str = "MEMO";

// moka refuses a time-to-live longer than 1000 years.
const MAX_CACHE_TTL_SECS: u64 = 1000 * 365 * 24 * 60 * 60;
const MAX_SWEEP_INTERVAL_SECS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub cache_ttl_minutes: u64,
    pub cache_max_capacity: u64,
    pub sweep_interval_secs: u64,
    pub delivered_grace_minutes: i64,
    pub default_window_hours: i64,
}

impl Settings {
    /// Loads settings from the default file location and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        Self::from_builder(
            Self::defaults()?
                .add_source(File::with_name(&path).required(false))
                .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true)),
        )
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8080)?
            .set_default("cache_ttl_minutes", 5)?
            .set_default("cache_max_capacity", 10_000)?
            .set_default("sweep_interval_secs", 3600)?
            .set_default("delivered_grace_minutes", 60)?
            .set_default("default_window_hours", 24)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.cache_config()?;
        self.sweep_config()?;
        self.expiry_policy()?;
        Ok(())
    }

    pub fn addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::Message(format!("invalid listen address: {}", e)))
    }

    pub fn cache_config(&self) -> Result<CacheConfig, ConfigError> {
        let minutes = positive("cache_ttl_minutes", self.cache_ttl_minutes)?;
        let ttl_secs = minutes
            .checked_mul(60)
            .filter(|secs| *secs <= MAX_CACHE_TTL_SECS)
            .ok_or_else(|| out_of_range("cache_ttl_minutes"))?;

        Ok(CacheConfig::default()
            .with_ttl(Duration::from_secs(ttl_secs))
            .with_max_capacity(positive("cache_max_capacity", self.cache_max_capacity)?))
    }

    pub fn sweep_config(&self) -> Result<SweepConfig, ConfigError> {
        let secs = positive("sweep_interval_secs", self.sweep_interval_secs)?;
        if secs > MAX_SWEEP_INTERVAL_SECS {
            return Err(out_of_range("sweep_interval_secs"));
        }
        Ok(SweepConfig::default().with_interval(Duration::from_secs(secs)))
    }

    pub fn expiry_policy(&self) -> Result<ExpiryPolicy, ConfigError> {
        let grace = retention(
            "delivered_grace_minutes",
            self.delivered_grace_minutes,
            chrono::Duration::try_minutes,
        )?;
        let window = retention(
            "default_window_hours",
            self.default_window_hours,
            chrono::Duration::try_hours,
        )?;

        Ok(ExpiryPolicy::new()
            .with_delivered_grace(grace)
            .with_default_window(window))
    }
}

fn positive(key: &str, value: u64) -> Result<u64, ConfigError> {
    if value == 0 {
        return Err(ConfigError::Message(format!("{} must be positive", key)));
    }
    Ok(value)
}

fn out_of_range(key: &str) -> ConfigError {
    ConfigError::Message(format!("{} is out of range", key))
}

/// Converts a retention setting, rejecting values whose cutoffs overflow a timestamp.
fn retention(
    key: &str,
    value: i64,
    to_duration: fn(i64) -> Option<chrono::Duration>,
) -> Result<chrono::Duration, ConfigError> {
    if value <= 0 {
        return Err(ConfigError::Message(format!("{} must be positive", key)));
    }

    let now = Utc::now();
    to_duration(value)
        .filter(|d| now.checked_sub_signed(*d).is_some() && now.checked_add_signed(*d).is_some())
        .ok_or_else(|| out_of_range(key))
}
