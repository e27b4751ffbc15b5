//! Server configuration from environment variables.

use std::sync::Arc;
use std::time::Duration;

use crime_watch_dispatch::selector::{BroadcastSelector, RadiusSelector, ResponderSelector};

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("{0} must be set")]
    Missing(&'static str),

    /// A variable is set but cannot be used.
    #[error("Invalid value for {name}: {value:?}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
    },
}

/// Everything the server needs at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// `postgres://` URL or `SQLite` path.
    pub database_url: String,
    /// Identity provider base URL.
    pub auth_url: String,
    /// Identity provider anonymous key.
    pub auth_anon_key: String,
    /// Interface to bind.
    pub bind_addr: String,
    /// Port to bind.
    pub port: u16,
    /// When set, only responders within this many kilometres are notified.
    pub dispatch_radius_km: Option<f64>,
    /// Cap on responders notified per report (radius mode only).
    pub dispatch_max_responders: Option<usize>,
    /// Request timeout for identity provider calls.
    pub auth_timeout: Duration,
}

impl ServerConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a
    /// value does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a
    /// value does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let port = match get("PORT") {
            Some(value) => parse(&value, "PORT")?,
            None => 8080,
        };

        let dispatch_radius_km = get("DISPATCH_RADIUS_KM")
            .map(|value| {
                let km: f64 = parse(&value, "DISPATCH_RADIUS_KM")?;
                if km.is_finite() && km > 0.0 {
                    Ok(km)
                } else {
                    Err(ConfigError::Invalid {
                        name: "DISPATCH_RADIUS_KM",
                        value,
                    })
                }
            })
            .transpose()?;

        let dispatch_max_responders = get("DISPATCH_MAX_RESPONDERS")
            .map(|value| parse(&value, "DISPATCH_MAX_RESPONDERS"))
            .transpose()?;

        let auth_timeout_secs: u64 = match get("AUTH_TIMEOUT_SECS") {
            Some(value) => parse(&value, "AUTH_TIMEOUT_SECS")?,
            None => 30,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            auth_url: required("AUTH_URL")?,
            auth_anon_key: required("AUTH_ANON_KEY")?,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            dispatch_radius_km,
            dispatch_max_responders,
            auth_timeout: Duration::from_secs(auth_timeout_secs),
        })
    }

    /// Builds the responder selector this configuration asks for.
    ///
    /// Without `DISPATCH_RADIUS_KM` every active vigilante is notified.
    #[must_use]
    pub fn selector(&self) -> Arc<dyn ResponderSelector> {
        match self.dispatch_radius_km {
            Some(km) => {
                let mut selector = RadiusSelector::new(km);
                if let Some(limit) = self.dispatch_max_responders {
                    selector = selector.with_limit(limit);
                }
                Arc::new(selector)
            }
            None => Arc::new(BroadcastSelector),
        }
    }
}

fn parse<T: std::str::FromStr>(value: &str, name: &'static str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}
