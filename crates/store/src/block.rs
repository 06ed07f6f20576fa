use alloy::primitives::B256;

/// A block header's identity, as persisted in the `block` table.
///
/// Mirrors `y._db.entities.Block`: keyed by `(chain, number)`, with
/// `hash`/`timestamp` optional since a filter only needs the number to
/// chunk a fetch, and learns the rest from whatever RPC response it was
/// attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRow {
    /// Chain this block belongs to.
    pub chain_id: i64,
    /// Block number.
    pub number: u64,
    /// Block hash, if known.
    pub hash: Option<B256>,
    /// Unix timestamp, if known.
    pub timestamp: Option<u64>,
}
