/// Errors surfaced by [`crate::Runtime`], folding every subsystem's
/// error type into one top-level enum.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// Configuration failed to load or was invalid.
    #[error("config error: {0}")]
    Config(#[from] oracle_config::ConfigError),
    /// Persisting or loading cached state failed.
    #[error("store error: {0}")]
    Store(#[from] oracle_store::StoreError),
    /// The RPC call backing a fetch or price resolution failed.
    #[error("rpc error: {0}")]
    Rpc(#[from] oracle_rpc_client::RpcError),
    /// Resolving a token's price failed.
    #[error("pricing error: {0}")]
    Pricing(#[from] oracle_pricing::RouterError),
    /// A filter engine's fetch or cache-range update failed.
    #[error("filter error: {0}")]
    Filter(#[from] oracle_filter::FilterError),
}
