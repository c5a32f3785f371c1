use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalogue::Address;
use crate::currency::Mutez;

/// Default public RPC endpoint for the test network.
pub const DEFAULT_RPC_URL: &str = "https://ghostnet.tezos.marigold.dev";

/// Network a wallet permission is scoped to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Mainnet,
    #[default]
    Ghostnet,
    Custom,
}

impl NetworkType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Some(NetworkType::Mainnet),
            "ghostnet" => Some(NetworkType::Ghostnet),
            "custom" => Some(NetworkType::Custom),
            _ => None,
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkType::Mainnet => write!(f, "mainnet"),
            NetworkType::Ghostnet => write!(f, "ghostnet"),
            NetworkType::Custom => write!(f, "custom"),
        }
    }
}

/// The `(network type, RPC URL)` pair handed to the wallet on connect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(rename = "type")]
    pub network_type: NetworkType,
    pub rpc_url: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            network_type: NetworkType::Ghostnet,
            rpc_url: DEFAULT_RPC_URL.to_string(),
        }
    }
}

/// The connected user, as far as this client knows.
///
/// An unset address means no wallet is connected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub address: Option<Address>,
    pub balance: Mutez,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn connected(address: Address, balance: Mutez, at: DateTime<Utc>) -> Self {
        Self {
            address: Some(address),
            balance,
            connected_at: Some(at),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }

    /// Same identity with a fresh balance.
    pub fn with_balance(&self, balance: Mutez) -> Self {
        Self {
            balance,
            ..self.clone()
        }
    }
}
