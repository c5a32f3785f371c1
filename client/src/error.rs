use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Broad class of a failure reported by an external service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderErrorKind {
    /// The user closed or declined the wallet prompt.
    Aborted,
    /// The node or wallet could not be reached.
    Unreachable,
    /// The service gave up waiting.
    Timeout,
    /// The node or contract refused the operation.
    Rejected,
    Other,
}

/// Raw error from a wallet, node or contract call.
///
/// `data` holds the node's structured error payload when there is one
/// (for contract failures, an array of error objects).
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            data: None,
        }
    }

    pub fn aborted(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Aborted, message)
    }

    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Unreachable, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Rejected, message)
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// The value the contract failed with, if the payload carries one.
    ///
    /// Scans the error array from the end, since the innermost error comes
    /// last, and returns the first `with.string` (or `with.int`) found.
    pub fn failwith_value(&self) -> Option<String> {
        let errors = self.data.as_ref()?.as_array()?;
        errors.iter().rev().find_map(|err| {
            let with = err.get("with")?;
            with.get("string")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| with.get("int").and_then(Value::as_str).map(str::to_string))
        })
    }
}

/// Wallet connection failure. Logged and swallowed by the session manager.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuthError {
    #[error("wallet permission denied: {0}")]
    PermissionDenied(String),
    #[error("wallet provider error: {0}")]
    Provider(#[source] ProviderError),
    #[error("balance query failed: {0}")]
    Ledger(#[source] ProviderError),
}

impl From<ProviderError> for AuthError {
    fn from(err: ProviderError) -> Self {
        match err.kind {
            ProviderErrorKind::Aborted => AuthError::PermissionDenied(err.message),
            _ => AuthError::Provider(err),
        }
    }
}

/// Where in the purchase a transaction error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStage {
    Submission,
    Confirmation,
}

impl fmt::Display for TransactionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStage::Submission => write!(f, "submission"),
            TransactionStage::Confirmation => write!(f, "confirmation"),
        }
    }
}

/// A purchase failure normalized for the user.
///
/// `data_message` is what the error notification shows.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{stage} failed: {data_message}")]
pub struct TransactionError {
    pub stage: TransactionStage,
    pub data_message: String,
    pub source: Option<ProviderError>,
}

impl TransactionError {
    pub fn from_provider(stage: TransactionStage, err: ProviderError) -> Self {
        let data_message = err
            .failwith_value()
            .filter(|s| !s.is_empty())
            .or_else(|| Some(err.message.clone()).filter(|s| !s.is_empty()))
            .unwrap_or_else(|| "Unknown error".to_string());
        Self {
            stage,
            data_message,
            source: Some(err),
        }
    }

    /// The ledger reported the operation as rejected.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            stage: TransactionStage::Confirmation,
            data_message: reason.into(),
            source: None,
        }
    }

    /// Confirmation returned before the required depth was reached.
    pub fn unconfirmed(reached: u32, required: u32) -> Self {
        Self {
            stage: TransactionStage::Confirmation,
            data_message: format!(
                "operation not confirmed: {reached} of {required} confirmations"
            ),
            source: None,
        }
    }
}

/// Invalid configuration input.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}
