use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Coda";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Hosted completion endpoint used when no override is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.mistral.ai";
pub const DEFAULT_MODEL: &str = "mistral-large-latest";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Environment variables read by the binary (never by the library internals).
pub const API_KEY_ENV: &str = "MISTRAL_API_KEY";
pub const BASE_URL_ENV: &str = "CODA_BASE_URL";
pub const MODEL_ENV: &str = "CODA_MODEL";
pub const DUMP_DIR_ENV: &str = "CODA_DUMP_DIR";

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "coda=info,coda_lib=info"
}

/// Directory exported reports land in when no explicit path is given.
///
/// The user's download folder when the platform has one, otherwise the
/// current directory.
pub fn default_export_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Configuration missing: no API key provided (set {API_KEY_ENV} or pass --api-key)")]
    MissingApiKey,

    #[error("Invalid base URL: '{0}' (https is required for non-local hosts)")]
    InvalidBaseUrl(String),

    #[error("Invalid model name: '{0}'")]
    InvalidModel(String),

    #[error("Timeout must be at least one second")]
    InvalidTimeout,
}

/// Credential for the completion service.
///
/// Only constructible from a non-blank value, so holding an `ApiKey` is proof
/// that configuration is complete. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(raw: impl Into<String>) -> Result<Self, ConfigError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Build from an optional operator-supplied value (CLI flag, env, form field).
    pub fn from_optional(raw: Option<String>) -> Result<Self, ConfigError> {
        raw.map_or(Err(ConfigError::MissingApiKey), Self::new)
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Connection settings for the analysis client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisConfig {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl AnalysisConfig {
    pub fn with_base_url(mut self, url: &str) -> Result<Self, ConfigError> {
        validate_base_url(url)?;
        self.base_url = url.trim_end_matches('/').to_string();
        Ok(self)
    }

    pub fn with_model(mut self, model: &str) -> Result<Self, ConfigError> {
        validate_model_name(model)?;
        self.model = model.to_string();
        Ok(self)
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Result<Self, ConfigError> {
        if secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        self.timeout = Duration::from_secs(secs);
        Ok(self)
    }
}

/// Validate the completion endpoint base URL.
///
/// Record text leaves the machine through this URL, so plain `http://` is only
/// accepted for loopback hosts (local proxies, test servers).
/// Accepts: `https://<any host>`, `http://localhost`, `http://127.0.0.1`, `http://[::1]`.
pub fn validate_base_url(url: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::InvalidBaseUrl(url.to_string());

    let (secure, after_scheme) = if let Some(rest) = url.strip_prefix("https://") {
        (true, rest)
    } else if let Some(rest) = url.strip_prefix("http://") {
        (false, rest)
    } else {
        return Err(invalid());
    };

    // Handle IPv6 bracket notation: [::1]
    let host = if after_scheme.starts_with('[') {
        after_scheme
            .split(']')
            .next()
            .unwrap_or("")
            .trim_start_matches('[')
    } else {
        after_scheme
            .split(['/', ':'])
            .next()
            .unwrap_or("")
    };

    if host.is_empty() {
        return Err(invalid());
    }

    if secure || matches!(host, "localhost" | "127.0.0.1" | "::1") {
        Ok(())
    } else {
        Err(invalid())
    }
}

/// Validate a model identifier: `[namespace/]model[:tag]`.
///
/// Model names travel in the JSON body only, but anything outside this
/// charset is a typo or an injection attempt and is rejected before any call.
pub fn validate_model_name(name: &str) -> Result<(), ConfigError> {
    let valid = regex::Regex::new(
        r"^[a-zA-Z0-9][a-zA-Z0-9._-]*(/[a-zA-Z0-9][a-zA-Z0-9._-]*)?(:[a-zA-Z0-9._-]+)?$",
    )
    .map_err(|_| ConfigError::InvalidModel(name.to_string()))?;

    if valid.is_match(name) {
        Ok(())
    } else {
        Err(ConfigError::InvalidModel(name.to_string()))
    }
}
