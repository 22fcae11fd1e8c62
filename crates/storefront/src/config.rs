//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//! - `WINKEL_API_URL` - Base URL of the shop API (default: `http://127.0.0.1:8000`)
//! - `WINKEL_PROFILE_DIR` - Directory holding the persisted session and cart
//!   (default: `<platform config dir>/winkel`)
//! - `WINKEL_HTTP_TIMEOUT_SECS` - Per-request timeout in seconds (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_TIMEOUT_SECS: u64 = 300;
const PROFILE_DIR_NAME: &str = "winkel";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Could not determine a profile directory; set WINKEL_PROFILE_DIR")]
    NoProfileDir,
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Remote API settings
    pub api: ApiConfig,
    /// Directory where the session and cart are persisted
    pub profile_dir: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Remote API client configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL, always ending in `/` so relative paths join beneath it.
    pub base_url: Url,
    /// Timeout applied to every request.
    pub timeout: Duration,
}

impl ApiConfig {
    /// Build an API configuration for `base_url` with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL does not parse or is
    /// not http(s).
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("WINKEL_API_URL", base_url)?,
            timeout: DEFAULT_TIMEOUT,
        })
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value or no
    /// profile directory can be determined.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`StorefrontConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get_or_default =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let base_url = parse_base_url(
            "WINKEL_API_URL",
            &get_or_default("WINKEL_API_URL", DEFAULT_API_URL),
        )?;
        let timeout = match lookup("WINKEL_HTTP_TIMEOUT_SECS") {
            Some(raw) => parse_timeout(&raw)?,
            None => DEFAULT_TIMEOUT,
        };

        let profile_dir = match lookup("WINKEL_PROFILE_DIR").filter(|dir| !dir.trim().is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => default_profile_dir()?,
        };

        Ok(Self {
            api: ApiConfig { base_url, timeout },
            profile_dir,
            sentry_dsn: lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
        })
    }

    /// Override the API base URL (e.g. from a command-line flag).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL is invalid.
    pub fn with_api_url(mut self, url: &str) -> Result<Self, ConfigError> {
        self.api.base_url = parse_base_url("--api-url", url)?;
        Ok(self)
    }

    /// Override the profile directory.
    #[must_use]
    pub fn with_profile_dir(mut self, dir: PathBuf) -> Self {
        self.profile_dir = dir;
        self
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse and normalize the API base URL.
///
/// A trailing `/` is added so `Url::join("api/items/")` keeps any path prefix
/// the shop is mounted under.
fn parse_base_url(var_name: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Parse a timeout in whole seconds, between 1 and `MAX_TIMEOUT_SECS`.
fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    let secs = raw.trim().parse::<u64>().map_err(|e| {
        ConfigError::InvalidEnvVar("WINKEL_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
    })?;
    if secs == 0 || secs > MAX_TIMEOUT_SECS {
        return Err(ConfigError::InvalidEnvVar(
            "WINKEL_HTTP_TIMEOUT_SECS".to_string(),
            format!("must be between 1 and {MAX_TIMEOUT_SECS}"),
        ));
    }
    Ok(Duration::from_secs(secs))
}

fn default_profile_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(PROFILE_DIR_NAME))
        .ok_or(ConfigError::NoProfileDir)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            StorefrontConfig::from_lookup(lookup(&[("WINKEL_PROFILE_DIR", "/tmp/winkel")])).unwrap();
        assert_eq!(config.api.base_url.as_str(), "http://127.0.0.1:8000/");
        assert_eq!(config.api.timeout, Duration::from_secs(10));
        assert_eq!(config.profile_dir, PathBuf::from("/tmp/winkel"));
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_base_url_keeps_prefix() {
        let url = parse_base_url("X", "https://shop.example.nl/backend").unwrap();
        assert_eq!(url.as_str(), "https://shop.example.nl/backend/");
        assert_eq!(
            url.join("api/items/").unwrap().as_str(),
            "https://shop.example.nl/backend/api/items/"
        );
    }

    #[test]
    fn test_base_url_rejects_other_schemes() {
        assert!(matches!(
            parse_base_url("X", "ftp://shop.example.nl"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(parse_base_url("X", "not a url").is_err());
    }

    #[test]
    fn test_timeout_bounds() {
        assert_eq!(parse_timeout("30").unwrap(), Duration::from_secs(30));
        assert!(parse_timeout("0").is_err());
        assert!(parse_timeout("301").is_err());
        assert!(parse_timeout("soon").is_err());
    }

    #[test]
    fn test_invalid_env_value_is_reported() {
        let result = StorefrontConfig::from_lookup(lookup(&[
            ("WINKEL_PROFILE_DIR", "/tmp/winkel"),
            ("WINKEL_HTTP_TIMEOUT_SECS", "-3"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(key, _)) if key == "WINKEL_HTTP_TIMEOUT_SECS"));
    }

    #[test]
    fn test_overrides() {
        let config = StorefrontConfig::from_lookup(lookup(&[("WINKEL_PROFILE_DIR", "/a")]))
            .unwrap()
            .with_api_url("http://localhost:9000")
            .unwrap()
            .with_profile_dir(PathBuf::from("/b"));
        assert_eq!(config.api.base_url.as_str(), "http://localhost:9000/");
        assert_eq!(config.profile_dir, PathBuf::from("/b"));
    }
}
