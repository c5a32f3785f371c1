//! Balance lookups against a Tezos node's HTTP RPC.

use serde_json::Value;

use vintner_common::catalogue::Address;
use vintner_common::currency::Mutez;
use vintner_common::session::NetworkConfig;

use crate::error::{ProviderError, ProviderErrorKind};
use crate::provider::Ledger;

pub struct TezosRpc {
    http: reqwest::Client,
    base_url: String,
}

impl TezosRpc {
    pub fn new(rpc_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: rpc_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_network(network: &NetworkConfig) -> Self {
        Self::new(&network.rpc_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn balance_url(&self, address: &Address) -> String {
        format!(
            "{}/chains/main/blocks/head/context/contracts/{}/balance",
            self.base_url, address
        )
    }
}

/// The node answers balance queries with a JSON string of mutez, e.g. `"1500000"`.
fn parse_balance(body: &Value) -> Result<Mutez, ProviderError> {
    body.as_str()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Mutez)
        .ok_or_else(|| {
            ProviderError::new(
                ProviderErrorKind::Other,
                format!("unexpected balance response: {body}"),
            )
        })
}

fn transport_error(err: reqwest::Error) -> ProviderError {
    let kind = if err.is_timeout() {
        ProviderErrorKind::Timeout
    } else if err.is_connect() {
        ProviderErrorKind::Unreachable
    } else {
        ProviderErrorKind::Other
    };
    ProviderError::new(kind, err.to_string())
}

impl Ledger for TezosRpc {
    async fn get_balance(&self, address: &Address) -> Result<Mutez, ProviderError> {
        let url = self.balance_url(address);
        tracing::debug!(%url, "fetching balance");

        let resp = self.http.get(&url).send().await.map_err(transport_error)?;
        let status = resp.status();
        if !status.is_success() {
            // Node errors come back as a JSON array; keep it for the message extractor.
            let data = resp.json::<Value>().await.ok();
            let err = ProviderError::rejected(format!("balance query returned {status}"));
            return Err(match data {
                Some(data) => err.with_data(data),
                None => err,
            });
        }

        let body: Value = resp.json().await.map_err(transport_error)?;
        parse_balance(&body)
    }
}
