use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ApiConfig;
use crate::fetch::{ErrorBody, build_agent};

pub const SETTINGS_PATH: &str = "/settings/log";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Could not reach {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Unable to save log path: {message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed settings response: {0}")]
    Malformed(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct LogPathBody {
    path: String,
}

/// Client for the gateway's monitored-log-path setting
#[derive(Debug, Clone)]
pub struct SettingsClient {
    agent: ureq::Agent,
    url: String,
}

impl SettingsClient {
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            agent: build_agent(config),
            url: format!("{}{SETTINGS_PATH}", config.base_url.trim_end_matches('/')),
        }
    }

    /// Path of the log file the gateway currently watches
    pub async fn log_path(&self) -> Result<String, SettingsError> {
        let agent = self.agent.clone();
        let url = self.url.clone();

        self.blocking(move || {
            let body = read_body(&url, agent.get(&url).call())?;
            let settings: LogPathBody = serde_json::from_str(&body)
                .map_err(|e| SettingsError::Malformed(e.to_string()))?;
            Ok(settings.path)
        })
        .await
    }

    /// Point the gateway at another log file
    pub async fn set_log_path(&self, path: &str) -> Result<(), SettingsError> {
        let agent = self.agent.clone();
        let url = self.url.clone();
        let body = LogPathBody {
            path: path.to_string(),
        };
        tracing::info!("Setting monitored log path to {path}");

        self.blocking(move || {
            read_body(&url, agent.post(&url).send_json(&body))?;
            Ok(())
        })
        .await
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, SettingsError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, SettingsError> + Send + 'static,
    {
        tokio::task::spawn_blocking(f)
            .await
            .map_err(|e| SettingsError::Transport {
                url: self.url.clone(),
                message: format!("request task failed: {e}"),
            })?
    }
}

fn read_body(
    url: &str,
    result: Result<ureq::Response, ureq::Error>,
) -> Result<String, SettingsError> {
    match result {
        Ok(response) => response.into_string().map_err(|e| SettingsError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        }),
        Err(ureq::Error::Status(status, response)) => {
            let message = response
                .into_string()
                .ok()
                .and_then(|body| serde_json::from_str::<ErrorBody>(&body).ok())
                .map(|body| body.error)
                .unwrap_or_else(|| format!("request failed with status {status}"));
            tracing::warn!("Settings request rejected ({status}): {message}");
            Err(SettingsError::Rejected { status, message })
        }
        Err(ureq::Error::Transport(transport)) => Err(SettingsError::Transport {
            url: url.to_string(),
            message: transport.to_string(),
        }),
    }
}
