use crate::TokenKey;

/// The router's terminal failure: every strategy and fallback was
/// exhausted for this `(token, block)` pair.
#[derive(Debug, Clone, thiserror::Error)]
#[error("no price found for {token} at block {block} (symbol: {symbol:?})")]
pub struct PriceError {
    /// The token that could not be priced.
    pub token: TokenKey,
    /// The block the price was requested at.
    pub block: u64,
    /// The token's symbol, if known, for a friendlier error message.
    pub symbol: Option<String>,
}

impl PriceError {
    /// Build a new price-not-found error.
    pub const fn new(token: TokenKey, block: u64, symbol: Option<String>) -> Self {
        Self { token, block, symbol }
    }
}
