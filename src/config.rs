//! Application settings loaded from the process environment (and `.env` via `dotenv`).

use std::env;
use std::fmt;
use std::time::Duration;

const DEFAULT_SERVER_HOST: &str = "127.0.0.1";
const DEFAULT_SERVER_PORT: u16 = 8080;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_JWKS_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000";
const DEFAULT_API_PREFIX: &str = "/api";
const DEFAULT_APP_NAME: &str = "Todo API";

/// Where the token verifier gets its signing keys from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySourceConfig {
    /// HS256 shared secret.
    Secret(String),
    /// JWK Set URL; keys are cached for `ttl`.
    Jwks { url: String, ttl: Duration },
}

/// Errors raised while reading configuration.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set.
    Missing(&'static str),
    /// A variable is set but cannot be parsed.
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => {
                write!(f, "{} has an invalid value: {:?}", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub run_migrations: bool,
    pub server_port: u16,
    pub server_host: String,
    pub key_source: KeySourceConfig,
    pub jwt_issuer: Option<String>,
    pub jwt_audience: Option<String>,
    pub cors_origins: Vec<String>,
    pub api_prefix: String,
    pub app_name: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let key_source = match get("JWKS_URL") {
            Some(url) => KeySourceConfig::Jwks {
                url,
                ttl: Duration::from_secs(parse_or(
                    get("JWKS_CACHE_TTL_SECS"),
                    "JWKS_CACHE_TTL_SECS",
                    DEFAULT_JWKS_CACHE_TTL_SECS,
                )?),
            },
            None => KeySourceConfig::Secret(
                get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?,
            ),
        };

        let cors_origins = get("CORS_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect();

        Ok(Self {
            database_url,
            database_max_connections: parse_or(
                get("DATABASE_MAX_CONNECTIONS"),
                "DATABASE_MAX_CONNECTIONS",
                DEFAULT_MAX_CONNECTIONS,
            )?,
            run_migrations: parse_bool(get("RUN_MIGRATIONS"), "RUN_MIGRATIONS", true)?,
            server_port: parse_or(get("SERVER_PORT"), "SERVER_PORT", DEFAULT_SERVER_PORT)?,
            server_host: get("SERVER_HOST").unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string()),
            key_source,
            jwt_issuer: get("JWT_ISSUER"),
            jwt_audience: get("JWT_AUDIENCE"),
            cors_origins,
            api_prefix: normalize_prefix(
                get("API_V1_PREFIX").unwrap_or_else(|| DEFAULT_API_PREFIX.to_string()),
            ),
            app_name: get("APP_NAME").unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<T: std::str::FromStr>(
    value: Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}

fn parse_bool(value: Option<String>, key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match value {
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid { key, value: raw }),
        },
        None => Ok(default),
    }
}

// "/api/" and "api" both become "/api"; an empty prefix mounts at the root.
fn normalize_prefix(prefix: String) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
