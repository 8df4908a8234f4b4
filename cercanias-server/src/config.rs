//! Process configuration from environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::domain::{InvalidRoute, Route};
use crate::horarios::HorariosConfig;
use crate::refresh::RefreshConfig;

/// Errors reading process configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed
    #[error("invalid {name}={value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// Only one end of the initial route was given
    #[error("CERCANIAS_ORIGIN and CERCANIAS_DESTINATION must be set together")]
    HalfRoute,

    /// The initial route is not a valid route
    #[error("invalid initial route: {0}")]
    Route(#[from] InvalidRoute),
}

/// Everything `main` needs to start the server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP display surface listens on.
    pub bind_addr: SocketAddr,

    /// Cache persistence.
    pub cache: CacheConfig,

    /// Remote timetable service.
    pub horarios: HorariosConfig,

    /// Refresh timings.
    pub refresh: RefreshConfig,

    /// Route to install at startup, if it differs from the cached one.
    pub initial_route: Option<Route>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            cache: CacheConfig::default(),
            horarios: HorariosConfig::default(),
            refresh: RefreshConfig::default(),
            initial_route: None,
        }
    }
}

impl ServerConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults for
    /// unset or empty variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(value) = get("CERCANIAS_BIND_ADDR") {
            config.bind_addr = value.parse().map_err(|e: std::net::AddrParseError| {
                ConfigError::Invalid {
                    name: "CERCANIAS_BIND_ADDR",
                    value: value.clone(),
                    reason: e.to_string(),
                }
            })?;
        }

        if let Some(path) = get("CERCANIAS_CACHE_PATH") {
            config.cache = CacheConfig::new(path);
        }

        if let Some(url) = get("HORARIOS_BASE_URL") {
            config.horarios = config.horarios.with_base_url(url);
        }

        if let Some(value) = get("CERCANIAS_REFRESH_INTERVAL_SECS") {
            let secs = parse_secs("CERCANIAS_REFRESH_INTERVAL_SECS", &value)?;
            config.refresh = config.refresh.with_interval(Duration::from_secs(secs));
        }

        if let Some(value) = get("CERCANIAS_RETRY_DELAY_SECS") {
            let secs = parse_secs("CERCANIAS_RETRY_DELAY_SECS", &value)?;
            config.refresh = config.refresh.with_retry_delay(Duration::from_secs(secs));
        }

        config.initial_route = match (get("CERCANIAS_ORIGIN"), get("CERCANIAS_DESTINATION")) {
            (Some(origin), Some(destination)) => {
                Some(Route::new(origin.trim(), destination.trim())?)
            }
            (None, None) => None,
            _ => return Err(ConfigError::HalfRoute),
        };

        Ok(config)
    }
}

fn parse_secs(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason,
    };

    let secs: u64 = value.trim().parse().map_err(|e| invalid(format!("{e}")))?;
    if secs == 0 {
        return Err(invalid("must be at least 1".to_string()));
    }
    Ok(secs)
}
