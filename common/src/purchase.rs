use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalogue::{Address, CatalogueEntry, TokenId};
use crate::currency::Mutez;

/// Blocks required on top of the inclusion block before a purchase is final.
pub const DEFAULT_CONFIRMATION_DEPTH: u32 = 2;

/// Value the quantity field starts with.
pub const DEFAULT_QUANTITY_INPUT: &str = "1";

/// Field-level rejection of the quantity input. The `Display` text is shown
/// next to the field as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("Quantity is required")]
    Required,
    #[error("ERROR: The number must be greater than 0!")]
    NotPositive,
    #[error("ERROR: The quantity must be a whole number!")]
    NotWhole,
    #[error("ERROR: The quantity is too large!")]
    TooLarge,
    #[error("ERROR: Only {available} unit(s) available!")]
    ExceedsAvailable { available: u64 },
    #[error("ERROR: The total price is too large!")]
    TotalOverflow,
}

/// Parse the raw text of the quantity field into a positive unit count.
///
/// Blank or non-numeric text counts as missing. Numeric text must be a
/// positive whole number; `"3.0"` is accepted as 3.
pub fn parse_quantity(input: &str) -> Result<u64, QuantityError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(QuantityError::Required);
    }

    if let Ok(n) = input.parse::<i128>() {
        if n <= 0 {
            return Err(QuantityError::NotPositive);
        }
        return u64::try_from(n).map_err(|_| QuantityError::TooLarge);
    }

    match input.parse::<f64>() {
        Ok(n) if n.is_finite() => {
            if n <= 0.0 {
                Err(QuantityError::NotPositive)
            } else if n.fract() != 0.0 {
                Err(QuantityError::NotWhole)
            } else if n >= u64::MAX as f64 {
                Err(QuantityError::TooLarge)
            } else {
                Ok(n as u64)
            }
        }
        _ => Err(QuantityError::Required),
    }
}

/// A validated purchase, built fresh for every submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRequest {
    pub token_id: TokenId,
    pub seller: Address,
    pub quantity: u64,
    pub unit_price: Mutez,
    /// `quantity × unit_price`, the payment attached to the call.
    pub total_cost: Mutez,
}

impl PurchaseRequest {
    pub fn new(entry: &CatalogueEntry, quantity: u64) -> Result<Self, QuantityError> {
        if quantity == 0 {
            return Err(QuantityError::NotPositive);
        }
        if quantity > entry.quantity {
            return Err(QuantityError::ExceedsAvailable {
                available: entry.quantity,
            });
        }
        let total_cost = entry
            .price
            .checked_mul(quantity)
            .ok_or(QuantityError::TotalOverflow)?;

        Ok(Self {
            token_id: entry.token_id,
            seller: entry.seller.clone(),
            quantity,
            unit_price: entry.price,
            total_cost,
        })
    }

    /// Parse the field text and build the request against `entry`.
    pub fn from_input(entry: &CatalogueEntry, input: &str) -> Result<Self, QuantityError> {
        let quantity = parse_quantity(input)?;
        Self::new(entry, quantity)
    }
}

/// Result reported by the ledger for a submitted operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionOutcome {
    Pending,
    Confirmed(u32),
    Rejected(String),
}

/// Purchase workflow state.
///
/// ```text
/// Idle → Validating → Submitting → AwaitingConfirmation → Settled
///            │             │                 │
///            └→ Idle       └→ Failed ←───────┘
/// ```
/// Settled and Failed return to Idle when the next attempt starts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseState {
    #[default]
    Idle,
    Validating,
    Submitting,
    AwaitingConfirmation { operation_hash: String },
    Settled { operation_hash: String, depth: u32 },
    Failed { message: String },
}

impl PurchaseState {
    pub fn name(&self) -> &'static str {
        match self {
            PurchaseState::Idle => "idle",
            PurchaseState::Validating => "validating",
            PurchaseState::Submitting => "submitting",
            PurchaseState::AwaitingConfirmation { .. } => "awaiting-confirmation",
            PurchaseState::Settled { .. } => "settled",
            PurchaseState::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PurchaseState::Settled { .. } | PurchaseState::Failed { .. })
    }

    /// True while a purchase is between validation and resolution.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            PurchaseState::Validating
                | PurchaseState::Submitting
                | PurchaseState::AwaitingConfirmation { .. }
        )
    }

    /// Returns true if moving from self to `next` is a legal step.
    pub fn can_transition_to(&self, next: &PurchaseState) -> bool {
        matches!(
            (self, next),
            (PurchaseState::Idle, PurchaseState::Validating)
                | (PurchaseState::Validating, PurchaseState::Idle)
                | (PurchaseState::Validating, PurchaseState::Submitting)
                | (PurchaseState::Submitting, PurchaseState::AwaitingConfirmation { .. })
                | (PurchaseState::Submitting, PurchaseState::Failed { .. })
                | (PurchaseState::AwaitingConfirmation { .. }, PurchaseState::Settled { .. })
                | (PurchaseState::AwaitingConfirmation { .. }, PurchaseState::Failed { .. })
                | (PurchaseState::Settled { .. }, PurchaseState::Idle)
                | (PurchaseState::Failed { .. }, PurchaseState::Idle)
        )
    }
}
