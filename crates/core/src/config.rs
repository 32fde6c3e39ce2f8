//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into the services. Nothing in
//! this crate reads process-wide environment variables directly: binaries hand a lookup function
//! to [`CoreConfig::from_lookup`], which keeps request handling and tests free of env mutation.

use crate::constants::{DEFAULT_LLM_BASE_URL, DEFAULT_LLM_MODEL, DEFAULT_LLM_TIMEOUT_SECS};
use crate::{CoreError, CoreResult};
use std::fmt;

pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_BASE_URL: &str = "MTF_LLM_BASE_URL";
pub const ENV_MODEL: &str = "MTF_LLM_MODEL";
pub const ENV_TIMEOUT_SECS: &str = "MTF_LLM_TIMEOUT_SECS";
pub const ENV_ALLOW_MOCK: &str = "MTF_ALLOW_MOCK_LLM";

/// Core configuration resolved at startup.
#[derive(Clone)]
pub struct CoreConfig {
    api_key: Option<String>,
    llm_base_url: String,
    llm_model: String,
    llm_timeout_secs: u64,
    allow_mock: bool,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(
        api_key: Option<String>,
        llm_base_url: String,
        llm_model: String,
        llm_timeout_secs: u64,
        allow_mock: bool,
    ) -> CoreResult<Self> {
        let llm_base_url = llm_base_url.trim().trim_end_matches('/').to_string();
        if llm_base_url.is_empty() {
            return Err(CoreError::InvalidConfig(
                "LLM base URL cannot be empty".into(),
            ));
        }
        if !(llm_base_url.starts_with("http://") || llm_base_url.starts_with("https://")) {
            return Err(CoreError::InvalidConfig(format!(
                "LLM base URL must be http(s): {llm_base_url}"
            )));
        }

        let llm_model = llm_model.trim().to_string();
        if llm_model.is_empty() {
            return Err(CoreError::InvalidConfig("LLM model cannot be empty".into()));
        }

        if llm_timeout_secs == 0 {
            return Err(CoreError::InvalidConfig(
                "LLM timeout must be at least one second".into(),
            ));
        }

        Ok(Self {
            api_key: api_key_from_env_value(api_key),
            llm_base_url,
            llm_model,
            llm_timeout_secs,
            allow_mock,
        })
    }

    /// Resolve configuration through `lookup`, which maps a variable name to its value.
    ///
    /// Binaries pass `|key| std::env::var(key).ok()`; tests pass a map lookup.
    pub fn from_lookup<F>(lookup: F) -> CoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::new(
            lookup(ENV_API_KEY),
            lookup(ENV_BASE_URL)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.into()),
            lookup(ENV_MODEL)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LLM_MODEL.into()),
            timeout_secs_from_env_value(lookup(ENV_TIMEOUT_SECS))?,
            allow_mock_from_env_value(lookup(ENV_ALLOW_MOCK))?,
        )
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn llm_base_url(&self) -> &str {
        &self.llm_base_url
    }

    pub fn llm_model(&self) -> &str {
        &self.llm_model
    }

    pub fn llm_timeout_secs(&self) -> u64 {
        self.llm_timeout_secs
    }

    pub fn allow_mock(&self) -> bool {
        self.allow_mock
    }
}

// The credential never reaches logs.
impl fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("llm_base_url", &self.llm_base_url)
            .field("llm_model", &self.llm_model)
            .field("llm_timeout_secs", &self.llm_timeout_secs)
            .field("allow_mock", &self.allow_mock)
            .finish()
    }
}

/// Normalise an optional credential: blank values count as absent.
pub fn api_key_from_env_value(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the mock-mode gate from an optional string value.
///
/// If `value` is `None` or empty/whitespace, mock mode is not allowed.
pub fn allow_mock_from_env_value(value: Option<String>) -> CoreResult<bool> {
    let value = value
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty());

    match value.as_deref() {
        None | Some("false" | "0" | "no" | "off") => Ok(false),
        Some("true" | "1" | "yes" | "on") => Ok(true),
        Some(other) => Err(CoreError::InvalidConfig(format!(
            "{ENV_ALLOW_MOCK} must be a boolean, got {other:?}"
        ))),
    }
}

/// Parse the LLM timeout in seconds from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default timeout.
pub fn timeout_secs_from_env_value(value: Option<String>) -> CoreResult<u64> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(DEFAULT_LLM_TIMEOUT_SECS),
        Some(v) => v.parse::<u64>().map_err(|_| {
            CoreError::InvalidConfig(format!(
                "{ENV_TIMEOUT_SECS} must be a whole number of seconds, got {v:?}"
            ))
        }),
    }
}
