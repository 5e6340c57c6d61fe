use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::poller::DEFAULT_POLL_INTERVAL;
use crate::secret::DEFAULT_SECRET_NAMESPACE;

pub const DEFAULT_NODE_URL: &str = "http://127.0.0.1:8080/v1";
pub const DEFAULT_MODULE_NAME: &str = "texas_holdem";
pub const DEFAULT_SECRET_STORE_FILE: &str = ".holdem/secrets.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid node url {url:?}: {source}")]
    NodeUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("module address is not set")]
    MissingModule,
    #[error("poll interval must be positive")]
    ZeroPollInterval,
}

/// Client settings. Every field has a default so partial files deserialize.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Fullnode REST root, including the version segment.
    pub node_url: String,
    /// Account the table module is published under.
    pub module_address: String,
    pub module_name: String,
    pub poll_interval_ms: u64,
    pub secret_namespace: String,
    pub secret_store_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            node_url: DEFAULT_NODE_URL.to_string(),
            module_address: String::new(),
            module_name: DEFAULT_MODULE_NAME.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            secret_namespace: DEFAULT_SECRET_NAMESPACE.to_string(),
            secret_store_path: PathBuf::from(DEFAULT_SECRET_STORE_FILE),
        }
    }
}

impl ClientConfig {
    pub fn node_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.node_url).map_err(|source| ConfigError::NodeUrl {
            url: self.node_url.clone(),
            source,
        })
    }

    /// `<address>::<module>` prefix for view and entry functions.
    pub fn module(&self) -> Result<String, ConfigError> {
        if self.module_address.trim().is_empty() {
            return Err(ConfigError::MissingModule);
        }
        Ok(format!("{}::{}", self.module_address.trim(), self.module_name))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.node_url()?;
        self.module()?;
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }
}
