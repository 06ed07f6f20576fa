use alloy::primitives::Address;
use rust_decimal::Decimal;

/// A single resolved USD price, ready to persist.
///
/// Mirrors `y._db.entities.Price`: `(block, token)` is the primary key,
/// `price` is a `decimal(38, 18)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRow {
    /// Chain the token and block belong to.
    pub chain_id: i64,
    /// Token this price is for.
    pub token: Address,
    /// Block the price was resolved at.
    pub block: u64,
    /// Resolved USD price.
    pub price: Decimal,
}
