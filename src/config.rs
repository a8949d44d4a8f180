use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";
const DEFAULT_MEDIA_DIR: &str = "./media";
const DEFAULT_CACHE_TTL: i64 = 20;
const DEFAULT_MAX_UPLOAD_SIZE: usize = 5 * 1024 * 1024;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Minimum length `actix_web::cookie::Key::from` accepts.
pub const SECRET_KEY_MIN_LEN: usize = 64;

/// Runtime settings, read from the environment (and `.env` through dotenv).
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    pub media_dir: PathBuf,
    /// Lifetime of a cached timeline page.
    pub cache_ttl: chrono::Duration,
    pub max_upload_size: usize,
    pub secret_key: Option<Vec<u8>>,
    pub session_secure: bool,
    pub db_max_connections: u32,
    pub sql_logging: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup. Unset keys fall back to defaults;
    /// set keys that do not parse are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;

        let cache_ttl = match lookup("CACHE_TTL") {
            Some(value) => {
                let secs = value
                    .parse::<i64>()
                    .with_context(|| format!("CACHE_TTL cannot be parsed as an integer: {}", value))?;
                if secs < 0 {
                    return Err(anyhow!("CACHE_TTL is a negative number"));
                }
                secs
            }
            None => DEFAULT_CACHE_TTL,
        };

        let max_upload_size = match lookup("MAX_UPLOAD_SIZE") {
            Some(value) => value
                .parse::<usize>()
                .with_context(|| format!("MAX_UPLOAD_SIZE is not a byte count: {}", value))?,
            None => DEFAULT_MAX_UPLOAD_SIZE,
        };

        let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(value) => value
                .parse::<u32>()
                .with_context(|| format!("DB_MAX_CONNECTIONS is not a number: {}", value))?,
            None => DEFAULT_DB_MAX_CONNECTIONS,
        };

        let secret_key = match lookup("SECRET_KEY") {
            Some(value) if value.len() < SECRET_KEY_MIN_LEN => {
                return Err(anyhow!(
                    "SECRET_KEY must be at least {} bytes long",
                    SECRET_KEY_MIN_LEN
                ));
            }
            Some(value) => Some(value.into_bytes()),
            None => None,
        };

        Ok(Self {
            database_url,
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_owned()),
            media_dir: lookup("MEDIA_DIR")
                .unwrap_or_else(|| DEFAULT_MEDIA_DIR.to_owned())
                .into(),
            cache_ttl: chrono::Duration::seconds(cache_ttl),
            max_upload_size,
            secret_key,
            session_secure: parse_flag(lookup("SESSION_SECURE"), "SESSION_SECURE")?,
            db_max_connections,
            sql_logging: parse_flag(lookup("SQL_LOGGING"), "SQL_LOGGING")?,
        })
    }
}

fn parse_flag(value: Option<String>, name: &str) -> Result<bool> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(false),
        Some("1") | Some("true") | Some("yes") | Some("on") => Ok(true),
        Some("0") | Some("false") | Some("no") | Some("off") => Ok(false),
        Some(other) => Err(anyhow!("{} is not a boolean: {}", name, other)),
    }
}
