use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::currency::Mutez;

/// Opaque account identity (implicit account or contract address).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a token kind in the multi-asset contract.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TokenId(pub u64);

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key of a bid in contract storage: one standing offer per seller per token.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BidKey {
    pub seller: Address,
    pub token_id: TokenId,
}

/// Value of a bid in contract storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    /// Unit price in mutez.
    pub price: Mutez,
    /// Units still on offer.
    pub quantity: u64,
}

/// A seller's standing offer, flattened for consumers of the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogueEntry {
    pub seller: Address,
    pub token_id: TokenId,
    pub price: Mutez,
    pub quantity: u64,
}

impl CatalogueEntry {
    pub fn key(&self) -> BidKey {
        BidKey {
            seller: self.seller.clone(),
            token_id: self.token_id,
        }
    }

    pub fn is_available(&self) -> bool {
        self.quantity > 0
    }
}

/// TZIP-21 token metadata, reduced to the fields the catalogue shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub decimals: u8,
    #[serde(default)]
    pub description: String,
}

/// Snapshot of the marketplace contract storage as seen by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalogue {
    bids: BTreeMap<BidKey, Bid>,
    token_metadata: BTreeMap<TokenId, TokenMetadata>,
}

impl Catalogue {
    pub fn new(
        bids: BTreeMap<BidKey, Bid>,
        token_metadata: BTreeMap<TokenId, TokenMetadata>,
    ) -> Self {
        Self {
            bids,
            token_metadata,
        }
    }

    /// Build a catalogue from flattened entries. A later entry for the same
    /// `(seller, token_id)` replaces an earlier one.
    pub fn from_entries(
        entries: impl IntoIterator<Item = CatalogueEntry>,
        token_metadata: BTreeMap<TokenId, TokenMetadata>,
    ) -> Self {
        let bids = entries
            .into_iter()
            .map(|e| {
                (
                    e.key(),
                    Bid {
                        price: e.price,
                        quantity: e.quantity,
                    },
                )
            })
            .collect();
        Self::new(bids, token_metadata)
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty()
    }

    pub fn bid(&self, key: &BidKey) -> Option<&Bid> {
        self.bids.get(key)
    }

    /// All entries, including sold-out ones.
    pub fn entries(&self) -> Vec<CatalogueEntry> {
        self.bids
            .iter()
            .map(|(key, bid)| CatalogueEntry {
                seller: key.seller.clone(),
                token_id: key.token_id,
                price: bid.price,
                quantity: bid.quantity,
            })
            .collect()
    }

    /// Entries a buyer can act on. Sold-out bids never appear here.
    pub fn visible_entries(&self) -> Vec<CatalogueEntry> {
        self.entries()
            .into_iter()
            .filter(CatalogueEntry::is_available)
            .collect()
    }

    pub fn token_metadata(&self) -> &BTreeMap<TokenId, TokenMetadata> {
        &self.token_metadata
    }

    pub fn has_token_metadata(&self) -> bool {
        !self.token_metadata.is_empty()
    }

    pub fn token_name(&self, token_id: TokenId) -> Option<&str> {
        self.token_metadata.get(&token_id).map(|m| m.name.as_str())
    }

    /// Display cards for every visible entry, in storage key order.
    pub fn cards(&self) -> Vec<CatalogueCard> {
        self.visible_entries()
            .iter()
            .map(|entry| CatalogueCard::for_entry(entry, self.token_name(entry.token_id)))
            .collect()
    }
}

/// Text content of one catalogue card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogueCard {
    pub key: String,
    pub avatar: String,
    pub title: Option<String>,
    pub subheader: String,
    pub body: String,
}

impl CatalogueCard {
    pub fn for_entry(entry: &CatalogueEntry, token_name: Option<&str>) -> Self {
        Self {
            key: format!("{}-{}", entry.seller, entry.token_id),
            avatar: entry.token_id.to_string(),
            title: token_name.map(str::to_string),
            subheader: format!("seller : {}", entry.seller),
            body: format!(
                "Bid : {} at price {}",
                entry.quantity,
                entry.price.to_tez_string()
            ),
        }
    }
}
