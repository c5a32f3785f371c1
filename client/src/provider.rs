//! Contracts with the services the client talks to.
//!
//! The wallet, the node and the marketplace contract are opaque: the client
//! only sees these request/response traits. The notification and navigation
//! sinks are fire-and-forget.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vintner_common::catalogue::{Address, CatalogueEntry, TokenId, TokenMetadata};
use vintner_common::currency::Mutez;
use vintner_common::purchase::{PurchaseRequest, TransactionOutcome};
use vintner_common::session::NetworkConfig;

use crate::error::ProviderError;

/// External wallet holding the user's signing key.
#[allow(async_fn_in_trait)]
pub trait WalletProvider {
    /// Ask the user to authorize this client on `network`.
    async fn request_permissions(&mut self, network: &NetworkConfig) -> Result<(), ProviderError>;

    /// Address of the account the user authorized.
    async fn get_pkh(&self) -> Result<Address, ProviderError>;

    /// Drop the active account and its permissions.
    async fn clear_active_account(&mut self) -> Result<(), ProviderError>;
}

/// Read access to account balances.
#[allow(async_fn_in_trait)]
pub trait Ledger {
    async fn get_balance(&self, address: &Address) -> Result<Mutez, ProviderError>;
}

/// Arguments of the contract's `buy` entrypoint plus the attached payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyCall {
    pub token_id: TokenId,
    pub quantity: u64,
    pub seller: Address,
    /// Payment in raw mutez.
    pub amount: Mutez,
}

impl BuyCall {
    pub const ENTRYPOINT: &'static str = "buy";
}

impl From<&PurchaseRequest> for BuyCall {
    fn from(request: &PurchaseRequest) -> Self {
        Self {
            token_id: request.token_id,
            quantity: request.quantity,
            seller: request.seller.clone(),
            amount: request.total_cost,
        }
    }
}

/// An operation accepted by the node but not yet final.
#[allow(async_fn_in_trait)]
pub trait PendingOperation {
    fn hash(&self) -> &str;

    /// Wait until the operation is `depth` blocks deep.
    async fn confirmation(&self, depth: u32) -> Result<TransactionOutcome, ProviderError>;
}

/// The deployed marketplace contract.
#[allow(async_fn_in_trait)]
pub trait MarketplaceContract {
    type Operation: PendingOperation;

    /// Inject a call to `buy`. Resolves once the node accepted the operation.
    async fn buy(&self, call: &BuyCall) -> Result<Self::Operation, ProviderError>;
}

/// Everything a context refresh reloads from the network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub bids: Vec<CatalogueEntry>,
    #[serde(default)]
    pub token_metadata: BTreeMap<TokenId, TokenMetadata>,
    /// Balance of the connected account, when one was asked for.
    #[serde(default)]
    pub balance: Option<Mutez>,
}

/// Source of full context reloads.
#[allow(async_fn_in_trait)]
pub trait ContextSource {
    async fn load(&self, account: Option<&Address>) -> Result<ContextSnapshot, ProviderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    /// How long the message stays up. `None` leaves it to the sink.
    pub auto_hide: Option<Duration>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            auto_hide: None,
            created_at: Utc::now(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Success)
    }

    pub fn error(message: impl Into<String>, auto_hide: Duration) -> Self {
        Self {
            auto_hide: Some(auto_hide),
            ..Self::new(message, Severity::Error)
        }
    }
}

pub trait Notifier {
    fn notify(&mut self, notification: Notification);
}

/// Notifier that only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, notification: Notification) {
        match notification.severity {
            Severity::Error | Severity::Warning => {
                tracing::warn!(severity = ?notification.severity, "{}", notification.message)
            }
            Severity::Info | Severity::Success => {
                tracing::info!(severity = ?notification.severity, "{}", notification.message)
            }
        }
    }
}

/// Pages the client can send the user to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Route {
    Catalog,
    Mint,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Catalog => "/catalog",
            Route::Mint => "/mint",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

pub trait Navigator {
    fn go_to(&mut self, route: Route);
}
