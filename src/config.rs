use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::AppError;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_SESSION_TTL_SECS: i64 = 60 * 60 * 24; // 1 día
/// Upper bound for `SESSION_TTL_SECS` (one year).
pub const MAX_SESSION_TTL_SECS: i64 = 60 * 60 * 24 * 365;

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the backend REST API, without trailing slash.
    pub api_url: String,
    /// HMAC secret used to sign the session cookie.
    pub secret_key: String,
    pub bind_addr: SocketAddr,
    pub session_ttl_secs: i64,
    /// Adds `Secure` to every session cookie.
    pub cookie_secure: bool,
    pub backend_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            secret_key: "secret".to_string(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            cookie_secure: false,
            backend_timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// `API_URL`, `SECRET_KEY`, `BIND_ADDR`, `SESSION_TTL_SECS`,
    /// `COOKIE_SECURE` and `BACKEND_TIMEOUT_SECS` are all optional; unset
    /// variables fall back to [`Config::default`]. A variable that is set but
    /// unparseable is an error.
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Config::default();

        let api_url = env::var("API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_url);
        if reqwest::Url::parse(&api_url).is_err() {
            return Err(AppError::Config(format!("API_URL is not a valid URL: '{}'", api_url)));
        }

        let secret_key = match env::var("SECRET_KEY") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                tracing::warn!("SECRET_KEY not set, using insecure default");
                defaults.secret_key
            }
        };

        let bind_addr = match env::var("BIND_ADDR") {
            Ok(val) => val
                .parse()
                .map_err(|_| AppError::Config(format!("BIND_ADDR must be host:port, got: '{}'", val)))?,
            Err(_) => defaults.bind_addr,
        };

        let session_ttl_secs =
            check_session_ttl(parse_var("SESSION_TTL_SECS")?.unwrap_or(defaults.session_ttl_secs))?;

        let cookie_secure = match env::var("COOKIE_SECURE") {
            Ok(val) => matches!(val.to_ascii_lowercase().as_str(), "1" | "true" | "yes"),
            Err(_) => defaults.cookie_secure,
        };

        let backend_timeout = parse_var::<u64>("BACKEND_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.backend_timeout);

        Ok(Self {
            api_url,
            secret_key,
            bind_addr,
            session_ttl_secs,
            cookie_secure,
            backend_timeout,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>, AppError> {
    match env::var(name) {
        Ok(val) => val
            .parse()
            .map(Some)
            .map_err(|_| AppError::Config(format!("{} must be a valid integer, got: '{}'", name, val))),
        Err(_) => Ok(None),
    }
}

fn check_session_ttl(secs: i64) -> Result<i64, AppError> {
    if !(1..=MAX_SESSION_TTL_SECS).contains(&secs) {
        return Err(AppError::Config(format!(
            "SESSION_TTL_SECS must be between 1 and {}, got: {}",
            MAX_SESSION_TTL_SECS, secs
        )));
    }
    Ok(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ttl_must_be_positive_and_bounded() {
        assert_eq!(check_session_ttl(DEFAULT_SESSION_TTL_SECS).unwrap(), DEFAULT_SESSION_TTL_SECS);
        assert_eq!(check_session_ttl(MAX_SESSION_TTL_SECS).unwrap(), MAX_SESSION_TTL_SECS);
        assert!(matches!(check_session_ttl(0), Err(AppError::Config(_))));
        assert!(matches!(check_session_ttl(-5), Err(AppError::Config(_))));
        assert!(matches!(check_session_ttl(i64::MAX), Err(AppError::Config(_))));
    }
}
