use thiserror::Error;

use crate::types::PageSize;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },

    #[error("Failed to parse {var} as {expected_type}: {source}")]
    ParseError {
        var: String,
        expected_type: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Configuration for diagnostics
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub rust_log: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            rust_log: "info".to_string(),
        }
    }
}

/// Configuration for talking to the log gateway
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub source: String,
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            source: "gateway-client".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Configuration for the paging engine
#[derive(Debug, Clone)]
pub struct PagingConfig {
    pub page_size: PageSize,
    /// How many filter identities the page cache keeps around
    pub cache_identities: usize,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::DEFAULT,
            cache_identities: 1,
        }
    }
}

/// Main configuration container
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub log: LogConfig,
    pub api: ApiConfig,
    pub paging: PagingConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        // LOGDASH_API_URL
        if let Ok(url) = std::env::var("LOGDASH_API_URL") {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidValue {
                    var: "LOGDASH_API_URL".to_string(),
                    message: "URL must start with http:// or https://".to_string(),
                });
            }
            config.api.base_url = url.trim_end_matches('/').to_string();
        }

        // LOGDASH_LOG_SOURCE
        if let Ok(source) = std::env::var("LOGDASH_LOG_SOURCE") {
            config.api.source = source;
        }

        // LOGDASH_REQUEST_TIMEOUT
        if let Ok(timeout_str) = std::env::var("LOGDASH_REQUEST_TIMEOUT") {
            config.api.request_timeout_secs =
                timeout_str.parse().map_err(|e| ConfigError::ParseError {
                    var: "LOGDASH_REQUEST_TIMEOUT".to_string(),
                    expected_type: "u64".to_string(),
                    source: Box::new(e),
                })?;
        }

        // LOGDASH_PAGE_SIZE
        if let Ok(page_size_str) = std::env::var("LOGDASH_PAGE_SIZE") {
            let page_size: usize = page_size_str.parse().map_err(|e| ConfigError::ParseError {
                var: "LOGDASH_PAGE_SIZE".to_string(),
                expected_type: "usize".to_string(),
                source: Box::new(e),
            })?;
            config.paging.page_size =
                PageSize::new(page_size).ok_or_else(|| ConfigError::InvalidValue {
                    var: "LOGDASH_PAGE_SIZE".to_string(),
                    message: "page size must be greater than 0".to_string(),
                })?;
        }

        // LOGDASH_CACHE_IDENTITIES
        if let Ok(capacity_str) = std::env::var("LOGDASH_CACHE_IDENTITIES") {
            config.paging.cache_identities =
                capacity_str.parse().map_err(|e| ConfigError::ParseError {
                    var: "LOGDASH_CACHE_IDENTITIES".to_string(),
                    expected_type: "usize".to_string(),
                    source: Box::new(e),
                })?;
        }

        // RUST_LOG
        if let Ok(rust_log) = std::env::var("RUST_LOG") {
            config.log.rust_log = rust_log;
        }

        // Validation
        if config.api.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                var: "LOGDASH_REQUEST_TIMEOUT".to_string(),
                message: "timeout must be greater than 0".to_string(),
            });
        }

        if config.paging.cache_identities == 0 {
            return Err(ConfigError::InvalidValue {
                var: "LOGDASH_CACHE_IDENTITIES".to_string(),
                message: "the cache must keep at least the active identity".to_string(),
            });
        }

        Ok(config)
    }
}
