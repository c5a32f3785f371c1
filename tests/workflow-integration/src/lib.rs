use vintner_client::mock::MockMarket;
use vintner_common::catalogue::{Address, CatalogueEntry, TokenId, TokenMetadata};
use vintner_common::currency::Mutez;


pub const BUYER: &str = "tz1VSUr8wwNhLAzempoch5d6hLRiTh8Cjcjb";
pub const CHATEAU: &str = "tz1aSkwEot3L2kmUvcoxzjMomb9mvBNuzFK6";
pub const DOMAINE: &str = "tz1Zsfi1eqc2obwjFhbG7aZrmJHEqb3Fn3Ps";

/// Starting balance of [`BUYER`].
pub const BUYER_BALANCE: Mutez = Mutez(50_000_000);

/// Enable log output for a test run. Safe to call more than once.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// TZIP-21 metadata for a bottle.
pub fn make_wine_metadata(name: &str) -> TokenMetadata {
    TokenMetadata {
        name: name.to_string(),
        symbol: "WINE".to_string(),
        decimals: 0,
        description: format!("{name}, one bottle"),
    }
}

/// Flattened catalogue entry.
pub fn make_entry(seller: &str, token_id: u64, price: u64, quantity: u64) -> CatalogueEntry {
    CatalogueEntry {
        seller: Address::new(seller),
        token_id: TokenId(token_id),
        price: Mutez(price),
        quantity,
    }
}

/// A market with two sellers, three tokens and one sold-out bid.
///
/// | seller | token | price | quantity |
/// |---|---|---|---|
/// | CHATEAU | 0 | 2 tez | 10 |
/// | CHATEAU | 1 | 5.5 tez | 0 |
/// | DOMAINE | 2 | 0.75 tez | 4 |
pub fn seeded_market() -> MockMarket {
    MockMarket::new()
        .with_token(TokenId(0), make_wine_metadata("Saint-Emilion 2018"))
        .with_token(TokenId(1), make_wine_metadata("Pauillac 2015"))
        .with_token(TokenId(2), make_wine_metadata("Chablis 2021"))
        .with_bid(CHATEAU, TokenId(0), Mutez(2_000_000), 10)
        .with_bid(CHATEAU, TokenId(1), Mutez(5_500_000), 0)
        .with_bid(DOMAINE, TokenId(2), Mutez(750_000), 4)
        .with_balance(BUYER, BUYER_BALANCE)
        .with_buyer(BUYER)
}

/// A market where nothing has been minted yet.
pub fn unminted_market() -> MockMarket {
    MockMarket::new().with_balance(BUYER, BUYER_BALANCE)
}
