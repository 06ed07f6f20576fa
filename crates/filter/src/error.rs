/// Errors surfaced by the filter engine.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// The RPC call backing a fetch failed.
    #[error("rpc error: {0}")]
    Rpc(#[from] oracle_rpc_client::RpcError),
    /// Persisting a fetched chunk or its cache-range metadata failed.
    #[error("store error: {0}")]
    Store(#[from] oracle_store::StoreError),
    /// A persisted row's `raw` column could not be decoded back into its
    /// item type — most likely an older process version wrote it in a
    /// now-incompatible shape.
    #[error("failed to decode cached row: {0}")]
    Decode(#[from] serde_json::Error),
    /// The background fetch task panicked or was dropped without
    /// completing; the engine can no longer make progress.
    #[error("filter engine's background task terminated unexpectedly")]
    TaskDied,
}
