use crate::Bucket;
use alloy::primitives::Address;

/// Identifies the chain a `Store` instance is bound to. A process operates
/// on exactly one chain for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Chain(u64);

impl Chain {
    /// Wrap a chain id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The numeric chain id.
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl From<u64> for Chain {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The composite key identifying a token: its chain and checksummed
/// address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TokenKey {
    /// The chain the token lives on.
    pub chain: Chain,
    /// The token's contract address.
    pub address: Address,
}

impl TokenKey {
    /// Build a new token key.
    pub const fn new(chain: Chain, address: Address) -> Self {
        Self { chain, address }
    }
}

impl std::fmt::Display for TokenKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.chain, self.address)
    }
}

/// Metadata describing a token, mirroring the `Token` table's nullable
/// columns.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TokenMeta {
    /// The token's key.
    pub key: TokenKey,
    /// `symbol()`, if known.
    pub symbol: Option<String>,
    /// `name()`, if known.
    pub name: Option<String>,
    /// `decimals()`, if known. Rejected above `i32::MAX` as bogus per the
    /// `Token.decimals` invariant.
    pub decimals: Option<u8>,
    /// The persisted pricing bucket, if it has been probed before.
    pub bucket: Option<Bucket>,
}

impl TokenMeta {
    /// An empty metadata record for a token that has not been probed yet.
    pub const fn unknown(key: TokenKey) -> Self {
        Self { key, symbol: None, name: None, decimals: None, bucket: None }
    }
}
