//! Application configuration.
//!
//! Defaults match a backend running locally. Each value can be overridden
//! from the environment (or a `.env` file), and the CLI overrides both.
//!
//! | Variable                      | Default                               |
//! |-------------------------------|---------------------------------------|
//! | `DATAPORT_API_URL`            | `http://localhost:8000/integrations`  |
//! | `DATAPORT_USER`               | `TestUser`                            |
//! | `DATAPORT_ORG`                | `TestOrg`                             |
//! | `DATAPORT_POLL_INTERVAL_SECS` | `5`                                   |
//! | `DATAPORT_PAGE_SIZE`          | `10`                                  |

use std::env;
use std::time::Duration;

use crate::error::ConfigError;
use crate::models::Session;
use crate::table::DEFAULT_PAGE_SIZE;

/// Integrations backend base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/integrations";

pub const DEFAULT_USER: &str = "TestUser";

pub const DEFAULT_ORG: &str = "TestOrg";

/// Connection-status refresh interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// How often an open authorization popup is checked for closure.
pub const POPUP_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub user_id: String,
    pub org_id: String,
    pub poll_interval: Duration,
    pub popup_check_interval: Duration,
    pub page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            user_id: DEFAULT_USER.to_string(),
            org_id: DEFAULT_ORG.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            popup_check_interval: POPUP_CHECK_INTERVAL,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Config {
    /// Load from the process environment. The binary reads `.env` into it
    /// at startup.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("DATAPORT_API_URL") {
            config.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(user) = lookup("DATAPORT_USER") {
            config.user_id = user;
        }
        if let Some(org) = lookup("DATAPORT_ORG") {
            config.org_id = org;
        }
        if let Some(secs) = lookup("DATAPORT_POLL_INTERVAL_SECS") {
            let secs: u64 = parse_positive("DATAPORT_POLL_INTERVAL_SECS", &secs)?;
            config.poll_interval = Duration::from_secs(secs);
        }
        if let Some(size) = lookup("DATAPORT_PAGE_SIZE") {
            config.page_size = parse_positive("DATAPORT_PAGE_SIZE", &size)?;
        }

        Ok(config)
    }

    pub fn session(&self) -> Session {
        Session::new(self.user_id.clone(), self.org_id.clone())
    }
}

fn parse_positive<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialEq + Default,
{
    match raw.trim().parse::<T>() {
        Ok(value) if value != T::default() => Ok(value),
        Ok(_) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "must be greater than zero".to_string(),
        }),
        Err(_) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{}' is not a positive integer", raw),
        }),
    }
}
