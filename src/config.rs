//! Client configuration

// Use built-in library
use std::env;
use std::time::Duration;

// Use internal modules
use crate::client::{ClientError, ClientResult};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_LIMIT: u64 = 50;

pub const ENV_BASE_URL: &str = "SOUNDSYNC_API_BASE";
pub const ENV_PAGE_SIZE: &str = "SOUNDSYNC_PAGE_SIZE";
pub const ENV_TIMEOUT_SECS: &str = "SOUNDSYNC_TIMEOUT_SECS";

#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub default_limit: u64,
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            default_limit: DEFAULT_LIMIT,
            timeout: None,
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self::default().base_url(base_url)
    }

    /// Builds a configuration from `SOUNDSYNC_*` environment variables, falling
    /// back to the defaults for any variable that is not set.
    ///
    /// Call `dotenv::dotenv()` beforehand if the values live in a `.env` file.
    pub fn from_env() -> ClientResult<Self> {
        let mut config = Self::default();

        if let Ok(base_url) = env::var(ENV_BASE_URL) {
            config = config.base_url(&base_url);
        }
        if let Ok(limit) = env::var(ENV_PAGE_SIZE) {
            config.default_limit = parse_number(ENV_PAGE_SIZE, &limit)?;
        }
        if let Ok(secs) = env::var(ENV_TIMEOUT_SECS) {
            config.timeout = Some(Duration::from_secs(parse_number(ENV_TIMEOUT_SECS, &secs)?));
        }

        Ok(config)
    }

    pub fn base_url(mut self, base_url: &str) -> Self {
        // Paths are always joined with a leading slash
        self.base_url = base_url.trim_end_matches('/').to_owned();
        self
    }

    pub fn default_limit(mut self, limit: u64) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

fn parse_number(name: &str, value: &str) -> ClientResult<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| ClientError::Validation(format!("{} must be a positive integer, got {:?}", name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.default_limit, 50);
        assert!(config.timeout.is_none());
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        let config = ClientConfig::new("http://music.local:9000/");
        assert_eq!(config.base_url, "http://music.local:9000");
    }

    #[test]
    fn from_env() {
        env::set_var(ENV_BASE_URL, "http://env.local/");
        env::set_var(ENV_PAGE_SIZE, "25");
        env::remove_var(ENV_TIMEOUT_SECS);

        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.base_url, "http://env.local");
        assert_eq!(config.default_limit, 25);
        assert!(config.timeout.is_none());

        env::set_var(ENV_PAGE_SIZE, "many");
        let result = ClientConfig::from_env();
        assert!(matches!(result, Err(ClientError::Validation(_))));

        env::remove_var(ENV_BASE_URL);
        env::remove_var(ENV_PAGE_SIZE);
    }

    #[test]
    fn parse_number_rejects_negative() {
        assert!(parse_number("X", "-1").is_err());
        assert_eq!(parse_number("X", " 30 ").unwrap(), 30);
    }
}
