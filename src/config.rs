use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("set SUPABASE_URL and SUPABASE_ANON_KEY, or JWT_SECRET")]
    NoTokenVerifier,
}

/// How bearer tokens get verified.
#[derive(Debug, Clone)]
pub enum AuthConfig {
    /// Provider-issued tokens checked against the provider's JWKS.
    Jwks { base_url: String, anon_key: String },
    /// Locally issued HS256 tokens.
    Secret(String),
}

/// Process configuration, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub redis_url: String,
    pub port: u16,
    /// Directory uploaded media bytes are written to and served from.
    pub media_dir: PathBuf,
    /// URL prefix of stored media, also the mount point of `media_dir`.
    pub media_url_prefix: String,
    pub max_upload_bytes: usize,
    pub auth: AuthConfig,
    pub cache: CacheConfig,
}

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub subdomain_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            subdomain_ttl: Duration::from_secs(60), // 1 minute
        }
    }
}

impl CacheConfig {
    pub fn from_env() -> Self {
        Self {
            subdomain_ttl: parse_duration_secs("CACHE_TTL_PORTFOLIO_SUBDOMAIN", 60),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let auth = match (
            env::var("SUPABASE_URL").ok(),
            env::var("SUPABASE_ANON_KEY").ok(),
            env::var("JWT_SECRET").ok(),
        ) {
            (Some(base_url), Some(anon_key), _) => AuthConfig::Jwks { base_url, anon_key },
            (_, _, Some(secret)) => AuthConfig::Secret(secret),
            _ => return Err(ConfigError::NoTokenVerifier),
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            redis_url: required("REDIS_URL")?,
            port: parse_or("PORT", 8080),
            media_dir: PathBuf::from(env::var("MEDIA_DIR").unwrap_or_else(|_| "./media".to_string())),
            media_url_prefix: env::var("MEDIA_URL_PREFIX").unwrap_or_else(|_| "/media".to_string()),
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", 32 << 20),
            auth,
            cache: CacheConfig::from_env(),
        })
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_duration_secs(env_var: &str, default: u64) -> Duration {
    Duration::from_secs(parse_or(env_var, default))
}
