//! Wallet-connected client for the wine marketplace contract.
//!
//! - [`wallet::WalletSession`] connects a wallet and fills the session.
//! - [`purchase::PurchaseWorkflow`] runs `buy` calls through to confirmation.
//! - [`context::AppContext`] is the state both share.
//!
//! Everything outside the client (wallet, node, contract, UI sinks) sits
//! behind the traits in [`provider`].

pub mod config;
pub mod context;
pub mod error;
pub mod mock;
pub mod provider;
pub mod purchase;
pub mod rpc;
pub mod wallet;

pub use config::{ClientConfig, WorkflowConfig};
pub use context::AppContext;
pub use error::{AuthError, ConfigError, ProviderError, TransactionError};
pub use purchase::{PurchaseError, PurchaseWorkflow, Settlement};
pub use wallet::WalletSession;
