//! Service configuration from environment variables.
//!
//! Call [`dotenvy::dotenv`] first to pick up a local `.env` file.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default price dataset, produced by the `enrich_prices` tool.
pub const DEFAULT_PRICES_CSV: &str = "static/data/fuel-prices-for-be-assessment-updated.csv";

/// Default SQLite file for the location cache.
pub const DEFAULT_CACHE_DB: &str = "location_cache.sqlite3";

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:7860";
pub const DEFAULT_OPENCAGE_BASE_URL: &str = "https://api.opencagedata.com";
pub const DEFAULT_GEOAPIFY_BASE_URL: &str = "https://api.geoapify.com";

/// Error type for configuration loading.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// A required variable is not set.
    Missing(&'static str),
    /// A variable is set but cannot be parsed.
    Invalid { name: &'static str, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(name) => write!(f, "Missing environment variable {}", name),
            ConfigError::Invalid { name, value } => {
                write!(f, "Invalid value for {}: {:?}", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Runtime configuration for the HTTP service.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub prices_csv: PathBuf,
    pub cache_db: PathBuf,
    pub opencage_api_key: String,
    pub opencage_base_url: String,
    pub geoapify_api_key: String,
    pub geoapify_base_url: String,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which returns a variable's
    /// value if it is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str, default: &str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let require = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let bind = get("BIND_ADDR", DEFAULT_BIND_ADDR);
        let bind_addr = bind.parse().map_err(|_| ConfigError::Invalid {
            name: "BIND_ADDR",
            value: bind.clone(),
        })?;

        Ok(Self {
            bind_addr,
            prices_csv: get("FUEL_PRICES_CSV", DEFAULT_PRICES_CSV).into(),
            cache_db: get("LOCATION_CACHE_DB", DEFAULT_CACHE_DB).into(),
            opencage_api_key: require("OPENCAGE_API_KEY")?,
            opencage_base_url: get("OPENCAGE_BASE_URL", DEFAULT_OPENCAGE_BASE_URL),
            geoapify_api_key: require("GEOAPIFY_API_KEY")?,
            geoapify_base_url: get("GEOAPIFY_BASE_URL", DEFAULT_GEOAPIFY_BASE_URL),
        })
    }
}
