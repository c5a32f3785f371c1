//! In-memory providers for development and tests.
//!
//! [`MockMarket`] plays the node, the ledger and the marketplace contract at
//! once: bids and balances live in shared state, a confirmed `buy` moves
//! units and funds, and context reloads read the result back. Failures can be
//! scripted per stage. Clones share the same state.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use serde_json::json;

use vintner_common::catalogue::{Address, Bid, BidKey, CatalogueEntry, TokenId, TokenMetadata};
use vintner_common::currency::Mutez;
use vintner_common::purchase::TransactionOutcome;
use vintner_common::session::NetworkConfig;

use crate::error::ProviderError;
use crate::provider::{
    BuyCall, ContextSnapshot, ContextSource, Ledger, MarketplaceContract, Navigator,
    Notification, Notifier, PendingOperation, Route, WalletProvider,
};

/// Wallet that always authorizes one fixed address, unless told to refuse.
#[derive(Debug, Clone)]
pub struct MockWallet {
    address: Address,
    refusal: Option<ProviderError>,
    permission_requests: Vec<NetworkConfig>,
    active: bool,
}

impl MockWallet {
    pub fn new(address: &str) -> Self {
        Self {
            address: Address::new(address),
            refusal: None,
            permission_requests: Vec::new(),
            active: false,
        }
    }

    /// Refuse every permission request with `err`.
    pub fn rejecting(mut self, err: ProviderError) -> Self {
        self.refusal = Some(err);
        self
    }

    pub fn permission_requests(&self) -> &[NetworkConfig] {
        &self.permission_requests
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl WalletProvider for MockWallet {
    async fn request_permissions(&mut self, network: &NetworkConfig) -> Result<(), ProviderError> {
        self.permission_requests.push(network.clone());
        if let Some(err) = &self.refusal {
            return Err(err.clone());
        }
        self.active = true;
        Ok(())
    }

    async fn get_pkh(&self) -> Result<Address, ProviderError> {
        if !self.active {
            return Err(ProviderError::rejected("no active account"));
        }
        Ok(self.address.clone())
    }

    async fn clear_active_account(&mut self) -> Result<(), ProviderError> {
        self.active = false;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MarketState {
    bids: BTreeMap<BidKey, Bid>,
    token_metadata: BTreeMap<TokenId, TokenMetadata>,
    balances: HashMap<Address, Mutez>,
    buyer: Option<Address>,
    buy_calls: Vec<BuyCall>,
    confirmation_requests: Vec<u32>,
    loads: u32,
    next_operation: u64,
    submission_failure: Option<ProviderError>,
    confirmation_failure: Option<ProviderError>,
    confirmation_outcome: Option<TransactionOutcome>,
    balance_failure: Option<ProviderError>,
    load_failure: Option<ProviderError>,
}

impl MarketState {
    fn snapshot(&self, account: Option<&Address>) -> ContextSnapshot {
        ContextSnapshot {
            bids: self
                .bids
                .iter()
                .map(|(key, bid)| CatalogueEntry {
                    seller: key.seller.clone(),
                    token_id: key.token_id,
                    price: bid.price,
                    quantity: bid.quantity,
                })
                .collect(),
            token_metadata: self.token_metadata.clone(),
            balance: account.map(|a| self.balance(a)),
        }
    }

    fn balance(&self, address: &Address) -> Mutez {
        self.balances.get(address).copied().unwrap_or_default()
    }

    /// The checks the contract's `buy` entrypoint performs.
    fn check_buy(&self, call: &BuyCall) -> Result<(), ProviderError> {
        let key = BidKey {
            seller: call.seller.clone(),
            token_id: call.token_id,
        };
        let bid = self.bids.get(&key).ok_or_else(|| failwith("BID_NOT_FOUND"))?;
        if call.quantity == 0 || call.quantity > bid.quantity {
            return Err(failwith("NOT_ENOUGH_QUANTITY"));
        }
        if bid.price.checked_mul(call.quantity) != Some(call.amount) {
            return Err(failwith("WRONG_AMOUNT"));
        }
        if let Some(buyer) = &self.buyer {
            if self.balance(buyer) < call.amount {
                return Err(ProviderError::rejected("balance too low"));
            }
        }
        Ok(())
    }

    /// Move units and funds for a confirmed `buy`. Nothing changes on error.
    fn apply_buy(&mut self, call: &BuyCall) -> Result<(), ProviderError> {
        let key = BidKey {
            seller: call.seller.clone(),
            token_id: call.token_id,
        };
        let remaining_units = self
            .bids
            .get(&key)
            .and_then(|bid| bid.quantity.checked_sub(call.quantity))
            .ok_or_else(|| failwith("NOT_ENOUGH_QUANTITY"))?;
        let debited = match &self.buyer {
            Some(buyer) => Some((
                buyer.clone(),
                self.balance(buyer)
                    .checked_sub(call.amount)
                    .ok_or_else(|| ProviderError::rejected("balance too low"))?,
            )),
            None => None,
        };
        let seller_before = match &debited {
            Some((buyer, balance)) if *buyer == call.seller => *balance,
            _ => self.balance(&call.seller),
        };
        let credited = seller_before
            .checked_add(call.amount)
            .ok_or_else(|| ProviderError::rejected("seller balance overflow"))?;

        if let Some(bid) = self.bids.get_mut(&key) {
            bid.quantity = remaining_units;
        }
        if let Some((buyer, balance)) = debited {
            self.balances.insert(buyer, balance);
        }
        self.balances.insert(call.seller.clone(), credited);
        Ok(())
    }
}

/// Contract failure carrying a `FAILWITH` string, shaped like a node error.
fn failwith(value: &str) -> ProviderError {
    ProviderError::rejected("(transaction) proto.michelson_v1.script_rejected").with_data(json!([
        { "kind": "temporary", "id": "proto.michelson_v1.runtime_error" },
        { "kind": "temporary", "id": "proto.michelson_v1.script_rejected",
          "with": { "string": value } },
    ]))
}

#[derive(Debug, Clone, Default)]
pub struct MockMarket {
    state: Rc<RefCell<MarketState>>,
}

impl MockMarket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bid(self, seller: &str, token_id: TokenId, price: Mutez, quantity: u64) -> Self {
        self.state.borrow_mut().bids.insert(
            BidKey {
                seller: Address::new(seller),
                token_id,
            },
            Bid { price, quantity },
        );
        self
    }

    pub fn with_token(self, token_id: TokenId, metadata: TokenMetadata) -> Self {
        self.state
            .borrow_mut()
            .token_metadata
            .insert(token_id, metadata);
        self
    }

    pub fn with_balance(self, address: &str, balance: Mutez) -> Self {
        self.state
            .borrow_mut()
            .balances
            .insert(Address::new(address), balance);
        self
    }

    /// Account that pays for `buy` calls.
    pub fn with_buyer(self, address: &str) -> Self {
        self.state.borrow_mut().buyer = Some(Address::new(address));
        self
    }

    /// Builder form of [`MockMarket::fail_next_submission`].
    pub fn failing_submission(self, err: ProviderError) -> Self {
        self.fail_next_submission(err);
        self
    }

    /// Builder form of [`MockMarket::fail_next_confirmation`].
    pub fn failing_confirmation(self, err: ProviderError) -> Self {
        self.fail_next_confirmation(err);
        self
    }

    /// Report `outcome` for the next confirmation wait, without applying the trade.
    pub fn with_confirmation_outcome(self, outcome: TransactionOutcome) -> Self {
        self.state.borrow_mut().confirmation_outcome = Some(outcome);
        self
    }

    pub fn failing_balance(self, err: ProviderError) -> Self {
        self.state.borrow_mut().balance_failure = Some(err);
        self
    }

    /// Builder form of [`MockMarket::fail_loads`].
    pub fn failing_loads(self, err: ProviderError) -> Self {
        self.fail_loads(err);
        self
    }

    /// Reject the next `buy` injection with `err`.
    pub fn fail_next_submission(&self, err: ProviderError) {
        self.state.borrow_mut().submission_failure = Some(err);
    }

    /// Fail the next confirmation wait with `err`.
    pub fn fail_next_confirmation(&self, err: ProviderError) {
        self.state.borrow_mut().confirmation_failure = Some(err);
    }

    /// Fail every context reload from now on with `err`.
    pub fn fail_loads(&self, err: ProviderError) {
        self.state.borrow_mut().load_failure = Some(err);
    }

    pub fn buy_calls(&self) -> Vec<BuyCall> {
        self.state.borrow().buy_calls.clone()
    }

    pub fn confirmation_requests(&self) -> Vec<u32> {
        self.state.borrow().confirmation_requests.clone()
    }

    pub fn load_count(&self) -> u32 {
        self.state.borrow().loads
    }

    pub fn bid(&self, seller: &str, token_id: TokenId) -> Option<Bid> {
        self.state
            .borrow()
            .bids
            .get(&BidKey {
                seller: Address::new(seller),
                token_id,
            })
            .copied()
    }

    pub fn balance(&self, address: &str) -> Mutez {
        self.state.borrow().balance(&Address::new(address))
    }
}

impl Ledger for MockMarket {
    async fn get_balance(&self, address: &Address) -> Result<Mutez, ProviderError> {
        let state = self.state.borrow();
        if let Some(err) = &state.balance_failure {
            return Err(err.clone());
        }
        Ok(state.balance(address))
    }
}

impl MarketplaceContract for MockMarket {
    type Operation = MockOperation;

    async fn buy(&self, call: &BuyCall) -> Result<MockOperation, ProviderError> {
        let mut state = self.state.borrow_mut();
        state.buy_calls.push(call.clone());
        if let Some(err) = state.submission_failure.take() {
            return Err(err);
        }
        state.check_buy(call)?;

        state.next_operation += 1;
        Ok(MockOperation {
            hash: format!("oo{:049}", state.next_operation),
            call: call.clone(),
            market: self.clone(),
        })
    }
}

impl ContextSource for MockMarket {
    async fn load(&self, account: Option<&Address>) -> Result<ContextSnapshot, ProviderError> {
        let mut state = self.state.borrow_mut();
        state.loads += 1;
        if let Some(err) = &state.load_failure {
            return Err(err.clone());
        }
        Ok(state.snapshot(account))
    }
}

/// A `buy` accepted by [`MockMarket`]. The trade is applied when the
/// confirmation wait succeeds.
#[derive(Debug, Clone)]
pub struct MockOperation {
    hash: String,
    call: BuyCall,
    market: MockMarket,
}

impl PendingOperation for MockOperation {
    fn hash(&self) -> &str {
        &self.hash
    }

    async fn confirmation(&self, depth: u32) -> Result<TransactionOutcome, ProviderError> {
        let mut state = self.market.state.borrow_mut();
        state.confirmation_requests.push(depth);
        if let Some(err) = state.confirmation_failure.take() {
            return Err(err);
        }
        if let Some(outcome) = state.confirmation_outcome.take() {
            return Ok(outcome);
        }
        state.apply_buy(&self.call)?;
        Ok(TransactionOutcome::Confirmed(depth))
    }
}

/// Notifier that keeps everything it is given.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    pub notifications: Vec<Notification>,
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }
}

/// Navigator that keeps every route it is sent to.
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    pub routes: Vec<Route>,
}

impl Navigator for RecordingNavigator {
    fn go_to(&mut self, route: Route) {
        self.routes.push(route);
    }
}
