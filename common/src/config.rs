//! Application configuration.
//!
//! Every service reads its settings from environment variables. A `.env` file
//! in the working directory is applied first (see [`load_dotenv`]) without
//! overriding variables already present in the environment.

use std::time::Duration;

use crate::errors::{AppError, AppResult};

/// Default JWT audience shared by the issuing and the validating services.
pub const DEFAULT_JWT_AUDIENCE: &str = "db-dashboards";

/// Runtime configuration shared by all services.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Name of the service using this config (used in logs and responses).
    pub service_name: String,
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// The service's own database (only the auth service has one).
    pub database_url: Option<String>,
    /// Startup connection attempts against `database_url`.
    pub db_connect_retries: u32,
    /// Seconds between startup connection attempts.
    pub db_retry_interval_secs: u64,
    /// Upper bound for establishing a database connection.
    pub connect_timeout_secs: u64,
    /// Upper bound for a single introspection query sequence.
    pub query_timeout_secs: u64,
    /// Accept `sqlite:` connection strings. These name files on this host, so
    /// the default is off.
    pub allow_sqlite: bool,
    /// Pool size for the service's own database.
    pub max_connections: u32,
    /// Authentication settings.
    pub jwt: JwtConfig,
}

/// JWT signing and validation settings.
#[derive(Clone)]
pub struct JwtConfig {
    /// HMAC secret.
    pub secret: String,
    /// Access token lifetime in seconds.
    pub ttl_secs: u64,
    /// Expected `aud` claim.
    pub audience: String,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"****")
            .field("ttl_secs", &self.ttl_secs)
            .field("audience", &self.audience)
            .finish()
    }
}

impl AppConfig {
    /// Loads configuration for the named service from the environment.
    ///
    /// # Errors
    /// Returns `AppError::Config` when `JWT_SECRET` is missing or empty, or
    /// when a numeric variable cannot be parsed.
    pub fn load_with_service(service_name: &str, default_port: u16) -> AppResult<Self> {
        Self::from_lookup(service_name, default_port, |key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(service_name: &str, default_port: u16, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("JWT_SECRET")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::Config("JWT_SECRET env variable not set".into()))?;

        Ok(Self {
            service_name: service_name.to_string(),
            host: lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "SERVER_PORT", default_port)?,
            database_url: lookup("DATABASE_URL").filter(|s| !s.is_empty()),
            db_connect_retries: parse_or(&lookup, "DB_CONNECT_RETRIES", 5)?,
            db_retry_interval_secs: parse_or(&lookup, "DB_RETRY_INTERVAL_SECS", 2)?,
            connect_timeout_secs: parse_or(&lookup, "CONNECT_TIMEOUT_SECS", 10)?,
            query_timeout_secs: parse_or(&lookup, "QUERY_TIMEOUT_SECS", 30)?,
            allow_sqlite: parse_or(&lookup, "ALLOW_SQLITE", false)?,
            max_connections: parse_or(&lookup, "MAX_CONNECTIONS", 10)?,
            jwt: JwtConfig {
                secret,
                ttl_secs: parse_or(&lookup, "JWT_TTL_SECS", 3600)?,
                audience: lookup("JWT_AUDIENCE")
                    .unwrap_or_else(|| DEFAULT_JWT_AUDIENCE.to_string()),
            },
        })
    }

    /// Connect timeout as a `Duration`.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Query timeout as a `Duration`.
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    /// Bind address in `host:port` form.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> AppResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} has an invalid value: {}", key, raw))),
        None => Ok(default),
    }
}

/// Load .env file from the working directory (best-effort, no error if missing).
pub fn load_dotenv() {
    let env_path = std::path::Path::new(".env");
    if let Ok(content) = std::fs::read_to_string(env_path) {
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim().trim_matches('"');
                // Only set if not already set by the environment
                if std::env::var(key).is_err() {
                    std::env::set_var(key, value);
                }
            }
        }
    }
}
