use crate::consts::{DEFAULT_BIND_ADDR, DEFAULT_MAX_CONNECTIONS, DEFAULT_PIN_MAX_ATTEMPTS};

use std::env;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Process configuration, read from the environment (and an optional `.env` file).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub store_timeout: Option<Duration>,
    pub pin_max_attempts: usize,
    pub run_migrations: bool,
    pub log_level: LevelFilter,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let bind_addr = parse_or("BIND_ADDR", get("BIND_ADDR"), || {
            DEFAULT_BIND_ADDR.parse().ok()
        })?;
        let max_connections = parse_or(
            "DATABASE_MAX_CONNECTIONS",
            get("DATABASE_MAX_CONNECTIONS"),
            || Some(DEFAULT_MAX_CONNECTIONS),
        )?;
        let store_timeout = get("STORE_TIMEOUT_SECS")
            .map(|v| parse::<u64>("STORE_TIMEOUT_SECS", &v))
            .transpose()?
            .map(Duration::from_secs);
        let pin_max_attempts = parse_or("PIN_MAX_ATTEMPTS", get("PIN_MAX_ATTEMPTS"), || {
            Some(DEFAULT_PIN_MAX_ATTEMPTS)
        })?;
        let run_migrations = match get("RUN_MIGRATIONS") {
            None => false,
            Some(v) => match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "RUN_MIGRATIONS",
                        value: v,
                    })
                }
            },
        };
        let log_level = parse_or("LOG_LEVEL", get("LOG_LEVEL"), || Some(LevelFilter::DEBUG))?;

        if max_connections == 0 {
            return Err(ConfigError::Invalid {
                name: "DATABASE_MAX_CONNECTIONS",
                value: "0".to_string(),
            });
        }
        if pin_max_attempts == 0 {
            return Err(ConfigError::Invalid {
                name: "PIN_MAX_ATTEMPTS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            database_url,
            bind_addr,
            max_connections,
            store_timeout,
            pin_max_attempts,
            run_migrations,
            log_level,
        })
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
    default: impl FnOnce() -> Option<T>,
) -> Result<T, ConfigError> {
    match value {
        Some(v) => parse(name, &v),
        None => default().ok_or(ConfigError::Missing(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[("DATABASE_URL", "postgres://localhost/interviews")]).unwrap();
        assert_eq!(config.database_url, "postgres://localhost/interviews");
        assert_eq!(config.bind_addr, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.store_timeout, None);
        assert_eq!(config.pin_max_attempts, 1_000);
        assert!(!config.run_migrations);
        assert_eq!(config.log_level, LevelFilter::DEBUG);
    }

    #[test]
    fn overrides() {
        let config = config(&[
            ("DATABASE_URL", "postgres://db/interviews"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("DATABASE_MAX_CONNECTIONS", "20"),
            ("STORE_TIMEOUT_SECS", "3"),
            ("PIN_MAX_ATTEMPTS", "50"),
            ("RUN_MIGRATIONS", "true"),
            ("LOG_LEVEL", "warn"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.max_connections, 20);
        assert_eq!(config.store_timeout, Some(Duration::from_secs(3)));
        assert_eq!(config.pin_max_attempts, 50);
        assert!(config.run_migrations);
        assert_eq!(config.log_level, LevelFilter::WARN);
    }

    #[test]
    fn database_url_is_required() {
        assert!(matches!(
            config(&[]),
            Err(ConfigError::Missing("DATABASE_URL"))
        ));
        assert!(matches!(
            config(&[("DATABASE_URL", "  ")]),
            Err(ConfigError::Missing("DATABASE_URL"))
        ));
    }

    #[test]
    fn rejects_bad_values() {
        for (name, value) in [
            ("BIND_ADDR", "nowhere"),
            ("DATABASE_MAX_CONNECTIONS", "-1"),
            ("DATABASE_MAX_CONNECTIONS", "0"),
            ("STORE_TIMEOUT_SECS", "soon"),
            ("PIN_MAX_ATTEMPTS", "0"),
            ("RUN_MIGRATIONS", "maybe"),
            ("LOG_LEVEL", "loud"),
        ] {
            let result = config(&[("DATABASE_URL", "postgres://db/x"), (name, value)]);
            assert!(
                matches!(result, Err(ConfigError::Invalid { .. })),
                "{name}={value} accepted"
            );
        }
    }
}
