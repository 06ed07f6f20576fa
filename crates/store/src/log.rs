use alloy::primitives::{Address, B256};

/// A single matched log, as persisted in the `log` table.
///
/// Mirrors `y._db.entities.Log`: primary key is `(block, txHash,
/// logIndex)`, `topic0` is required (every EVM log has at least one
/// topic — its event signature), `topic1..3` are optional, and `raw` is
/// the full serialized item a [`crate::Store`] consumer decodes rather
/// than reconstructing from the indexed columns, which exist purely for
/// querying.
#[derive(Debug, Clone)]
pub struct LogRow {
    /// Chain this log was fetched on.
    pub chain_id: i64,
    /// Block the log was emitted in.
    pub block_number: u64,
    /// Hash of the transaction that emitted the log.
    pub tx_hash: B256,
    /// Index of the log within its block.
    pub log_index: u64,
    /// Address that emitted the log.
    pub address: Address,
    /// The log's topics, in order. Never empty.
    pub topics: Vec<B256>,
    /// Fingerprint of the filter instance this row was fetched to
    /// satisfy (`LogFilter::topics_key`), letting a `DiskCache` reload
    /// exactly the rows it persisted without re-deriving topic/address
    /// predicates.
    pub filter_key: Vec<u8>,
    /// Full serialized log, as produced by the filter engine's source.
    pub raw: Vec<u8>,
}

/// A single matched trace, as persisted in the `trace` table.
///
/// Mirrors `y._db.entities.Trace`. `tx_hash`/`from_address`/
/// `to_address` are optional since not every trace action carries all
/// three (a `CREATE` trace has no `to`; a reward/genesis action has no
/// transaction).
#[derive(Debug, Clone)]
pub struct TraceRow {
    /// Chain this trace was fetched on.
    pub chain_id: i64,
    /// Block the trace belongs to.
    pub block_number: u64,
    /// Hash of the transaction the trace belongs to, if any.
    pub tx_hash: Option<B256>,
    /// The call's `from` address, if any.
    pub from_address: Option<Address>,
    /// The call's `to` address, if any.
    pub to_address: Option<Address>,
    /// Fingerprint of the filter instance this row was fetched to
    /// satisfy (`TraceFilter::to_addresses_key`/`from_addresses_key`,
    /// concatenated).
    pub filter_key: Vec<u8>,
    /// Full serialized trace, as produced by the filter engine's source.
    pub raw: Vec<u8>,
}
