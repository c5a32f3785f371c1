//! Wallet session manager.
//!
//! Connecting is the authentication gate for the rest of the client: it asks
//! the wallet for permission on the configured network, reads the authorized
//! address and its balance, stores the session in the [`AppContext`] and
//! routes the user onward. Connection failures are soft: they are logged and
//! leave the session empty.

use chrono::Utc;

use vintner_common::session::{NetworkConfig, Session};

use crate::context::AppContext;
use crate::error::AuthError;
use crate::provider::{Ledger, Navigator, Route, WalletProvider};

pub struct WalletSession<W, L, N> {
    wallet: W,
    ledger: L,
    navigator: N,
    network: NetworkConfig,
}

impl<W, L, N> WalletSession<W, L, N>
where
    W: WalletProvider,
    L: Ledger,
    N: Navigator,
{
    pub fn new(wallet: W, ledger: L, navigator: N, network: NetworkConfig) -> Self {
        Self {
            wallet,
            ledger,
            navigator,
            network,
        }
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    /// Connect, logging and swallowing any failure.
    pub async fn connect(&mut self, ctx: &mut AppContext) -> Option<Session> {
        match self.try_connect(ctx).await {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(network = %self.network.network_type, "wallet connect failed: {e}");
                None
            }
        }
    }

    /// Connect and report why it failed.
    ///
    /// The context is only touched once address and balance are both known,
    /// so on error the session stays as it was and no navigation happens.
    pub async fn try_connect(&mut self, ctx: &mut AppContext) -> Result<Session, AuthError> {
        tracing::debug!(
            network = %self.network.network_type,
            rpc = %self.network.rpc_url,
            "requesting wallet permissions"
        );
        self.wallet.request_permissions(&self.network).await?;

        let address = self.wallet.get_pkh().await?;
        let balance = self
            .ledger
            .get_balance(&address)
            .await
            .map_err(AuthError::Ledger)?;

        let session = Session::connected(address, balance, Utc::now());
        ctx.set_session(session.clone());
        tracing::info!(
            address = ?session.address,
            balance = balance.as_u64(),
            "wallet connected"
        );

        let route = if ctx.catalogue().has_token_metadata() {
            Route::Catalog
        } else {
            Route::Mint
        };
        self.navigator.go_to(route);

        Ok(session)
    }

    /// Forget the session locally and in the wallet.
    pub async fn disconnect(&mut self, ctx: &mut AppContext) {
        if let Err(e) = self.wallet.clear_active_account().await {
            tracing::warn!("wallet disconnect failed: {e}");
        }
        ctx.clear_session();
    }
}
