use alloy::primitives::Address;

/// Cached `[from, thru]` block range already fetched for a `(chain,
/// address, topics)` log filter.
///
/// Mirrors `y._db.entities.LogCacheInfo`. `topics_key` is an opaque
/// fingerprint of the filter's topic list (the filter engine owns its
/// exact encoding); the store only needs it as a cache key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogCacheInfo {
    /// Chain this range was fetched on.
    pub chain_id: i64,
    /// Contract address the logs were filtered by.
    pub address: Address,
    /// Fingerprint of the topic filter.
    pub topics_key: Vec<u8>,
    /// First block (inclusive) known to be fully cached.
    pub cached_from: u64,
    /// Last block (inclusive) known to be fully cached.
    pub cached_thru: u64,
}

/// Cached `[from, thru]` block range already fetched for a `(chain, to,
/// from)` trace filter.
///
/// Mirrors `y._db.entities.TraceCacheInfo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceCacheInfo {
    /// Chain this range was fetched on.
    pub chain_id: i64,
    /// Serialized `to_address` allowlist the trace filter matched on.
    pub to_addresses: Vec<u8>,
    /// Serialized `from_address` allowlist the trace filter matched on.
    pub from_addresses: Vec<u8>,
    /// First block (inclusive) known to be fully cached.
    pub cached_from: u64,
    /// Last block (inclusive) known to be fully cached.
    pub cached_thru: u64,
}
