use alloy::primitives::Address;

/// Cached metadata for a token, as persisted in the `token` table.
///
/// Mirrors the `Address`/`Contract`/`Token` inheritance chain in
/// `y._db.entities`, flattened into one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRow {
    /// Chain the token lives on.
    pub chain_id: i64,
    /// Token contract address.
    pub address: Address,
    /// ERC20 `symbol()`, if known.
    pub symbol: Option<String>,
    /// ERC20 `name()`, if known.
    pub name: Option<String>,
    /// ERC20 `decimals()`, if known.
    pub decimals: Option<u8>,
    /// Detected pricing bucket, serialized as its kebab-case name.
    pub bucket: Option<String>,
}
