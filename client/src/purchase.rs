//! Purchase workflow engine.
//!
//! One engine per catalogue view. The user selects a bid, types a quantity
//! and submits; the engine validates the input, injects a single `buy` call
//! with the exact payment in mutez, waits for the configured confirmation
//! depth and then reloads the shared context once. Neither the submission
//! nor the confirmation wait is ever retried: a retry is a new submit.

use thiserror::Error;

use vintner_common::catalogue::CatalogueEntry;
use vintner_common::purchase::{
    PurchaseRequest, PurchaseState, QuantityError, TransactionOutcome,
};

use crate::config::WorkflowConfig;
use crate::context::AppContext;
use crate::error::{TransactionError, TransactionStage};
use crate::provider::{
    BuyCall, ContextSource, MarketplaceContract, Notification, Notifier, PendingOperation,
};

/// Why a submit did not settle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PurchaseError {
    #[error("no catalogue entry selected")]
    NoSelection,
    #[error("entry is sold out")]
    SoldOut,
    #[error(transparent)]
    Validation(#[from] QuantityError),
    #[error(transparent)]
    Transaction(#[from] TransactionError),
}

/// A purchase that reached the required confirmation depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub request: PurchaseRequest,
    pub operation_hash: String,
    pub depth: u32,
}

impl Settlement {
    pub fn message(&self) -> String {
        format!(
            "Bought {} unit of Wine collection (token_id:{})",
            self.request.quantity, self.request.token_id
        )
    }
}

pub struct PurchaseWorkflow<K, N> {
    contract: K,
    notifier: N,
    config: WorkflowConfig,
    state: PurchaseState,
    selected: Option<CatalogueEntry>,
    field_error: Option<QuantityError>,
}

impl<K, N> PurchaseWorkflow<K, N>
where
    K: MarketplaceContract,
    N: Notifier,
{
    pub fn new(contract: K, notifier: N, config: WorkflowConfig) -> Self {
        Self {
            contract,
            notifier,
            config,
            state: PurchaseState::Idle,
            selected: None,
            field_error: None,
        }
    }

    pub fn state(&self) -> &PurchaseState {
        &self.state
    }

    pub fn selected(&self) -> Option<&CatalogueEntry> {
        self.selected.as_ref()
    }

    /// Inline message for the quantity field from the last submit.
    pub fn field_error(&self) -> Option<&QuantityError> {
        self.field_error.as_ref()
    }

    pub fn contract(&self) -> &K {
        &self.contract
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Put `entry` in the selection slot.
    pub fn select(&mut self, entry: CatalogueEntry) -> Result<(), PurchaseError> {
        if !entry.is_available() {
            return Err(PurchaseError::SoldOut);
        }
        self.reset();
        self.selected = Some(entry);
        Ok(())
    }

    /// Run one purchase of the selected entry.
    ///
    /// The quantity is checked against the bid as it stands in `ctx`, not
    /// against the copy taken at selection time. Validation errors are kept
    /// for the field and returned; they never reach the network. Transaction
    /// errors are shown as a timed error notification and returned. Only a
    /// settled purchase refreshes `ctx`.
    pub async fn submit<S: ContextSource>(
        &mut self,
        ctx: &mut AppContext,
        source: &S,
        quantity_input: &str,
    ) -> Result<Settlement, PurchaseError> {
        let key = self
            .selected
            .as_ref()
            .map(CatalogueEntry::key)
            .ok_or(PurchaseError::NoSelection)?;
        self.reset();

        let entry = match ctx.catalogue().bid(&key) {
            Some(bid) if bid.quantity > 0 => CatalogueEntry {
                seller: key.seller,
                token_id: key.token_id,
                price: bid.price,
                quantity: bid.quantity,
            },
            _ => {
                tracing::debug!(seller = %key.seller, token_id = %key.token_id, "selected bid is gone");
                self.selected = None;
                return Err(PurchaseError::SoldOut);
            }
        };
        self.selected = Some(entry.clone());

        self.transition(PurchaseState::Validating);
        let request = match PurchaseRequest::from_input(&entry, quantity_input) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(input = quantity_input, "quantity rejected: {e}");
                self.field_error = Some(e.clone());
                self.transition(PurchaseState::Idle);
                return Err(e.into());
            }
        };

        self.transition(PurchaseState::Submitting);
        let call = BuyCall::from(&request);
        tracing::info!(
            entrypoint = BuyCall::ENTRYPOINT,
            token_id = %call.token_id,
            quantity = call.quantity,
            seller = %call.seller,
            amount = call.amount.as_u64(),
            "submitting purchase"
        );
        let submitted = self.contract.buy(&call).await;
        let operation = match submitted {
            Ok(op) => op,
            Err(e) => {
                return Err(self.fail(TransactionError::from_provider(
                    TransactionStage::Submission,
                    e,
                )))
            }
        };

        let operation_hash = operation.hash().to_string();
        self.transition(PurchaseState::AwaitingConfirmation {
            operation_hash: operation_hash.clone(),
        });

        let required = self.config.confirmation_depth;
        let confirmed = operation.confirmation(required).await;
        let depth = match confirmed {
            Ok(TransactionOutcome::Confirmed(depth)) if depth >= required => depth,
            Ok(TransactionOutcome::Confirmed(depth)) => {
                return Err(self.fail(TransactionError::unconfirmed(depth, required)))
            }
            Ok(TransactionOutcome::Pending) => {
                return Err(self.fail(TransactionError::unconfirmed(0, required)))
            }
            Ok(TransactionOutcome::Rejected(reason)) => {
                return Err(self.fail(TransactionError::rejected(reason)))
            }
            Err(e) => {
                return Err(self.fail(TransactionError::from_provider(
                    TransactionStage::Confirmation,
                    e,
                )))
            }
        };

        self.transition(PurchaseState::Settled {
            operation_hash: operation_hash.clone(),
            depth,
        });
        let settlement = Settlement {
            request,
            operation_hash,
            depth,
        };
        self.notifier.notify(Notification::success(settlement.message()));

        // A failed reload does not undo a settled purchase.
        if let Err(e) = ctx.refresh_context(source).await {
            tracing::warn!(operation = %settlement.operation_hash, "context refresh after purchase failed: {e}");
        }

        Ok(settlement)
    }

    fn fail(&mut self, err: TransactionError) -> PurchaseError {
        tracing::warn!(stage = %err.stage, "purchase failed: {}", err.data_message);
        self.transition(PurchaseState::Failed {
            message: err.data_message.clone(),
        });
        self.notifier.notify(Notification::error(
            err.data_message.clone(),
            self.config.error_notice(),
        ));
        PurchaseError::Transaction(err)
    }

    /// Back to Idle before a new attempt, clearing the field error.
    ///
    /// `submit` holds `&mut self` until it resolves, so an in-flight state
    /// here means the previous submit future was dropped mid-way.
    fn reset(&mut self) {
        if self.state.is_in_flight() {
            tracing::warn!(state = self.state.name(), "previous purchase was abandoned");
            self.state = PurchaseState::Idle;
        } else if self.state.is_terminal() {
            self.transition(PurchaseState::Idle);
        }
        self.field_error = None;
    }

    fn transition(&mut self, next: PurchaseState) {
        debug_assert!(
            self.state.can_transition_to(&next),
            "illegal purchase transition {} -> {}",
            self.state.name(),
            next.name()
        );
        tracing::debug!(from = self.state.name(), to = next.name(), "purchase state");
        self.state = next;
    }
}
