//! Client configuration.
//!
//! Defaults target the public test network. Every value can be overridden
//! from JSON or from `VINTNER_*` environment variables:
//!
//! | variable | field |
//! |---|---|
//! | `VINTNER_NETWORK` | `network.type` |
//! | `VINTNER_RPC_URL` | `network.rpc_url` |
//! | `VINTNER_CONFIRMATIONS` | `workflow.confirmation_depth` |
//! | `VINTNER_ERROR_NOTICE_MS` | `workflow.error_notice_ms` |

use std::time::Duration;

use serde::{Deserialize, Serialize};

use vintner_common::purchase::DEFAULT_CONFIRMATION_DEPTH;
use vintner_common::session::{NetworkConfig, NetworkType};

use crate::error::ConfigError;

/// How long purchase errors stay on screen by default.
pub const DEFAULT_ERROR_NOTICE_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub confirmation_depth: u32,
    pub error_notice_ms: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            confirmation_depth: DEFAULT_CONFIRMATION_DEPTH,
            error_notice_ms: DEFAULT_ERROR_NOTICE_MS,
        }
    }
}

impl WorkflowConfig {
    pub fn error_notice(&self) -> Duration {
        Duration::from_millis(self.error_notice_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub network: NetworkConfig,
    pub workflow: WorkflowConfig,
}

impl ClientConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `VINTNER_*` overrides looked up through `lookup`.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(value) = lookup("VINTNER_NETWORK") {
            self.network.network_type =
                NetworkType::parse(&value).ok_or(ConfigError::InvalidValue {
                    key: "VINTNER_NETWORK",
                    value,
                })?;
        }
        if let Some(value) = lookup("VINTNER_RPC_URL") {
            self.network.rpc_url = value.trim().trim_end_matches('/').to_string();
        }
        if let Some(value) = lookup("VINTNER_CONFIRMATIONS") {
            self.workflow.confirmation_depth =
                value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: "VINTNER_CONFIRMATIONS",
                    value: value.clone(),
                })?;
        }
        if let Some(value) = lookup("VINTNER_ERROR_NOTICE_MS") {
            self.workflow.error_notice_ms =
                value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: "VINTNER_ERROR_NOTICE_MS",
                    value: value.clone(),
                })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = &self.network.rpc_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                key: "rpc_url",
                value: url.clone(),
            });
        }
        if self.workflow.confirmation_depth == 0 {
            return Err(ConfigError::InvalidValue {
                key: "confirmation_depth",
                value: "0".into(),
            });
        }
        Ok(())
    }
}
