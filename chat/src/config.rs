//! Portal connection settings parsed from environment variables.

use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_MAX_UPLOAD_FILES: usize = 5;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PLAYBOOK_QUESTION: &str = "As a PM of new project, what steps you recommend ?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortalTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    /// Backend origin without a trailing slash.
    pub base_url: String,
    /// Most files a single upload batch may hold.
    pub max_upload_files: usize,
    pub timeouts: PortalTimeouts,
    /// Question sent when bootstrapping a playbook.
    pub playbook_question: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_owned(),
            max_upload_files: DEFAULT_MAX_UPLOAD_FILES,
            timeouts: PortalTimeouts {
                request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            },
            playbook_question: DEFAULT_PLAYBOOK_QUESTION.to_owned(),
        }
    }
}

impl PortalConfig {
    /// Build config from process environment variables.
    ///
    /// Optional:
    /// - `PORTAL_API_URL`: default `http://localhost:8000`
    /// - `PORTAL_MAX_UPLOAD_FILES`: default 5
    /// - `PORTAL_REQUEST_TIMEOUT_SECS`: default 120
    /// - `PORTAL_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable does not parse or the URL is blank.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`PortalConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(url) = lookup("PORTAL_API_URL") {
            config = config.with_base_url(&url)?;
        }
        config.max_upload_files = parse_or("PORTAL_MAX_UPLOAD_FILES", &lookup, DEFAULT_MAX_UPLOAD_FILES)?;
        config.timeouts = PortalTimeouts {
            request_secs: parse_or("PORTAL_REQUEST_TIMEOUT_SECS", &lookup, DEFAULT_REQUEST_TIMEOUT_SECS)?,
            connect_secs: parse_or("PORTAL_CONNECT_TIMEOUT_SECS", &lookup, DEFAULT_CONNECT_TIMEOUT_SECS)?,
        };
        Ok(config)
    }

    /// Replace the backend origin, trimming whitespace and trailing slashes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Empty`] when nothing is left after trimming.
    pub fn with_base_url(mut self, url: &str) -> Result<Self, ConfigError> {
        let trimmed = url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(ConfigError::Empty { key: "PORTAL_API_URL".into() });
        }
        trimmed.clone_into(&mut self.base_url);
        Ok(self)
    }

    /// Absolute URL for an API path such as `/api/chat/create`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Parse { key: key.to_owned(), value: raw }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
