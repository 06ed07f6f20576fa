//! Fixtures shared by the oracle crates' test suites: a disposable
//! SQLite-backed `Store`, an `OracleConfig` pointed at it, and a small
//! set of well-known mainnet token addresses to price against.

use oracle_config::{DbProvider, OracleConfig};
use oracle_store::Store;
use oracle_types::Chain;
use std::time::Duration;

pub mod tokens;

/// Initialize tracing for tests. Local debugging only.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .try_init()
        .ok();
}

/// A `config` pointed at a fresh temp-file SQLite database, scoped to
/// mainnet. Each call gets its own file so tests never share state.
pub fn test_config() -> OracleConfig {
    let path = std::env::temp_dir().join(format!("oracle-test-{}.sqlite", uuid::Uuid::new_v4()));
    OracleConfig {
        chain: Chain::new(1),
        rpc_url: "http://localhost:8545".parse().unwrap(),
        db_provider: DbProvider::Embedded,
        sqlite_path: path.to_str().unwrap().to_owned(),
        pg: None,
        cache_ttl: Duration::from_secs(60),
        contract_cache_ttl: None,
        getlogs_batch_size: 2_000,
        getlogs_dop: 1,
        checksum_cache_maxsize: 1_000,
        skip_cache: false,
        skip_ypriceapi: true,
        ypriceapi: None,
    }
}

/// Connect (and migrate) a `Store` over a fresh [`test_config`].
pub async fn test_store() -> Store {
    Store::connect(&test_config()).await.expect("failed to open test store")
}
