use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use welfare_client::DEFAULT_API_URL;

const DEFAULT_TOKEN_FILE: &str = ".welfare_token";
const DEFAULT_LOG_LEVEL: &str = "warn";
const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(crate) api_url: String,
    pub(crate) token_file: PathBuf,
    pub(crate) log_level: String,
    pub(crate) http_timeout: Option<Duration>,
    pub(crate) page_size: usize,
}

impl Settings {
    pub(crate) fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let api_url = non_empty("WELFARE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let token_file = non_empty("WELFARE_TOKEN_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_FILE));
        let log_level = non_empty("LOG_LEVEL")
            .or_else(|| non_empty("RUST_LOG"))
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        let timeout_secs = match non_empty("WELFARE_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().with_context(|| {
                "Failed to parse WELFARE_HTTP_TIMEOUT_SECS, expecting non-negative integer"
            })?,
            None => 0,
        };
        let http_timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

        let page_size = match non_empty("WELFARE_PAGE_SIZE") {
            Some(raw) => raw
                .parse::<usize>()
                .context("Failed to parse WELFARE_PAGE_SIZE, expecting positive integer")?,
            None => DEFAULT_PAGE_SIZE,
        };
        if page_size == 0 {
            return Err(anyhow!("WELFARE_PAGE_SIZE must be > 0"));
        }

        Ok(Self {
            api_url,
            token_file,
            log_level,
            http_timeout,
            page_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_env_is_empty() {
        let s = settings(&[]).expect("defaults are valid");
        assert_eq!(s.api_url, DEFAULT_API_URL);
        assert_eq!(s.token_file, PathBuf::from(DEFAULT_TOKEN_FILE));
        assert_eq!(s.log_level, "warn");
        assert_eq!(s.http_timeout, None);
        assert_eq!(s.page_size, 10);
    }

    #[test]
    fn log_level_falls_back_to_rust_log() {
        let s = settings(&[("RUST_LOG", "debug")]).expect("valid");
        assert_eq!(s.log_level, "debug");

        let s = settings(&[("RUST_LOG", "debug"), ("LOG_LEVEL", "info")]).expect("valid");
        assert_eq!(s.log_level, "info");
    }

    #[test]
    fn timeout_zero_means_no_timeout() {
        let s = settings(&[("WELFARE_HTTP_TIMEOUT_SECS", "0")]).expect("valid");
        assert_eq!(s.http_timeout, None);

        let s = settings(&[("WELFARE_HTTP_TIMEOUT_SECS", "15")]).expect("valid");
        assert_eq!(s.http_timeout, Some(Duration::from_secs(15)));
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        assert!(settings(&[("WELFARE_HTTP_TIMEOUT_SECS", "soon")]).is_err());
        assert!(settings(&[("WELFARE_PAGE_SIZE", "0")]).is_err());
        assert!(settings(&[("WELFARE_PAGE_SIZE", "-3")]).is_err());
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let s = settings(&[("WELFARE_API_URL", "   "), ("WELFARE_TOKEN_FILE", "")]).expect("valid");
        assert_eq!(s.api_url, DEFAULT_API_URL);
        assert_eq!(s.token_file, PathBuf::from(DEFAULT_TOKEN_FILE));
    }
}
