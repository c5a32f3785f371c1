use chrono::{DateTime, Utc};

use vintner_common::catalogue::Catalogue;
use vintner_common::session::Session;

use crate::error::ProviderError;
use crate::provider::{ContextSnapshot, ContextSource};

/// Application-wide state shared by every view.
///
/// Views read through the getters. The only writers are the wallet session
/// manager (`set_session` / `clear_session`) and the post-purchase reload
/// (`refresh_context`).
#[derive(Clone, Debug, Default)]
pub struct AppContext {
    session: Session,
    catalogue: Catalogue,
    refreshed_at: Option<DateTime<Utc>>,
}

impl AppContext {
    pub fn new(catalogue: Catalogue) -> Self {
        Self {
            catalogue,
            ..Self::default()
        }
    }

    /// Initial load, before any wallet is connected.
    pub async fn load<S: ContextSource>(source: &S) -> Result<Self, ProviderError> {
        let mut ctx = Self::default();
        ctx.refresh_context(source).await?;
        Ok(ctx)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    pub fn set_session(&mut self, session: Session) {
        tracing::debug!(address = ?session.address, balance = session.balance.as_u64(), "session set");
        self.session = session;
    }

    pub fn clear_session(&mut self) {
        tracing::debug!("session cleared");
        self.session = Session::default();
    }

    /// Reload the catalogue and the session balance from `source`.
    ///
    /// On error nothing is changed.
    pub async fn refresh_context<S: ContextSource>(
        &mut self,
        source: &S,
    ) -> Result<(), ProviderError> {
        let snapshot = source.load(self.session.address.as_ref()).await?;
        self.apply(snapshot);
        Ok(())
    }

    fn apply(&mut self, snapshot: ContextSnapshot) {
        let ContextSnapshot {
            bids,
            token_metadata,
            balance,
        } = snapshot;

        self.catalogue = Catalogue::from_entries(bids, token_metadata);
        if let (Some(balance), true) = (balance, self.session.is_connected()) {
            self.session = self.session.with_balance(balance);
        }
        self.refreshed_at = Some(Utc::now());
        tracing::info!(
            bids = self.catalogue.entries().len(),
            visible = self.catalogue.visible_entries().len(),
            "context refreshed"
        );
    }
}
