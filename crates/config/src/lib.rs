//! Typed environment-variable configuration: `env::var` plus a typed
//! parse and a dedicated `ConfigError` per variable.

#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    rustdoc::all
)]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![deny(unused_must_use, rust_2018_idioms)]

mod env_utils;
pub use env_utils::{load_address, load_bool, load_string, load_string_opt, load_u64, load_u64_opt};

mod error;
pub use error::ConfigError;

mod db;
pub use db::DbProvider;

use alloy::primitives::Address;
use oracle_types::Chain;
use std::time::Duration;

/// Fully resolved runtime configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// The chain this process is bound to. Never changes for the
    /// lifetime of the process.
    pub chain: Chain,
    /// URL of the EVM JSON-RPC endpoint `RpcClient` is backed by.
    pub rpc_url: url::Url,
    /// Which storage backend to use.
    pub db_provider: DbProvider,
    /// Path to the embedded SQLite file. Only consulted when
    /// `db_provider == Embedded`.
    pub sqlite_path: String,
    /// Postgres connection pieces. Only consulted when
    /// `db_provider == Networked`.
    pub pg: Option<PgConfig>,
    /// Generic in-memory TTL for memoized values.
    pub cache_ttl: Duration,
    /// Contract-object TTL; `None` disables eviction.
    pub contract_cache_ttl: Option<Duration>,
    /// `eth_getLogs` chunk size. `0` means provider-dependent auto sizing.
    pub getlogs_batch_size: u64,
    /// `eth_getLogs` concurrency (degree of parallelism).
    pub getlogs_dop: usize,
    /// Max cardinality of the checksum cache.
    pub checksum_cache_maxsize: usize,
    /// Bypass the `Price` memo entirely.
    pub skip_cache: bool,
    /// Bypass the optional remote price-oracle fallback.
    pub skip_ypriceapi: bool,
    /// Optional remote price-oracle fallback configuration.
    pub ypriceapi: Option<YpriceApiConfig>,
}

/// Postgres connection parameters (`DB_HOST`, `DB_PORT`, `DB_USER`,
/// `DB_PASSWORD`, `DB_DATABASE`).
#[derive(Debug, Clone)]
pub struct PgConfig {
    /// Hostname.
    pub host: String,
    /// Port.
    pub port: u16,
    /// Username.
    pub user: String,
    /// Password.
    pub password: String,
    /// Database name.
    pub database: String,
}

impl PgConfig {
    /// Render a `postgres://` connection string.
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

/// Configuration for the optional remote price-oracle fallback
/// (`YPRICEAPI_*`).
#[derive(Debug, Clone)]
pub struct YpriceApiConfig {
    /// Base URL of the remote oracle.
    pub url: url::Url,
    /// Request timeout.
    pub timeout: Duration,
    /// Max concurrent in-flight requests.
    pub semaphore: usize,
    /// Signer address used to authenticate requests, if configured.
    pub signer: Option<Address>,
    /// Signature proving control of `signer`, if configured.
    pub signature: Option<String>,
}

impl OracleConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or fails
    /// to parse. `YPRICEAPI_SIGNER`/`YPRICEAPI_SIGNATURE` being only
    /// partially present is a config error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let chain = Chain::new(load_u64("CHAIN_ID")?);
        let rpc_url = url::Url::parse(&load_string("RPC_URL")?).map_err(ConfigError::Url)?;
        let db_provider = DbProvider::from_env()?;

        let sqlite_path = load_string_opt("SQLITE_PATH").unwrap_or_else(default_sqlite_path);

        let pg = if matches!(db_provider, DbProvider::Networked) {
            Some(PgConfig {
                host: load_string("DB_HOST")?,
                port: load_u64_opt("DB_PORT").unwrap_or(5432) as u16,
                user: load_string("DB_USER")?,
                password: load_string("DB_PASSWORD")?,
                database: load_string("DB_DATABASE")?,
            })
        } else {
            None
        };

        let cache_ttl = Duration::from_secs(load_u64_opt("CACHE_TTL").unwrap_or(3600));
        let contract_cache_ttl =
            load_u64_opt("CONTRACT_CACHE_TTL").map(Duration::from_secs).or(Some(cache_ttl));
        let getlogs_batch_size = load_u64_opt("GETLOGS_BATCH_SIZE").unwrap_or(0);
        let getlogs_dop = load_u64_opt("GETLOGS_DOP").unwrap_or(32) as usize;
        let checksum_cache_maxsize =
            load_u64_opt("CHECKSUM_CACHE_MAXSIZE").unwrap_or(100_000) as usize;
        let skip_cache = load_bool("SKIP_CACHE").unwrap_or(false);
        let skip_ypriceapi = load_bool("SKIP_YPRICEAPI").unwrap_or(false);

        let ypriceapi = load_ypriceapi_config()?;

        Ok(Self {
            chain,
            rpc_url,
            db_provider,
            sqlite_path,
            pg,
            cache_ttl,
            contract_cache_ttl,
            getlogs_batch_size,
            getlogs_dop,
            checksum_cache_maxsize,
            skip_cache,
            skip_ypriceapi,
            ypriceapi,
        })
    }
}

fn default_sqlite_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_owned());
    format!("{home}/.oracle/oracle.sqlite")
}

fn load_ypriceapi_config() -> Result<Option<YpriceApiConfig>, ConfigError> {
    let Some(url) = env_utils::load_string_opt("YPRICEAPI_URL") else {
        return Ok(None);
    };
    let url = url::Url::parse(&url).map_err(ConfigError::Url)?;
    let timeout = Duration::from_secs(load_u64_opt("YPRICEAPI_TIMEOUT").unwrap_or(10));
    let semaphore = load_u64_opt("YPRICEAPI_SEMAPHORE").unwrap_or(8) as usize;
    let signer = env_utils::load_string_opt("YPRICEAPI_SIGNER");
    let signature = env_utils::load_string_opt("YPRICEAPI_SIGNATURE");

    // Partial presence of signer+signature is a config error.
    let (signer, signature) = match (signer, signature) {
        (Some(_), Some(sig)) => (Some(load_address("YPRICEAPI_SIGNER")?), Some(sig)),
        (None, None) => (None, None),
        _ => return Err(ConfigError::PartialSigner),
    };

    Ok(Some(YpriceApiConfig { url, timeout, semaphore, signer, signature }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn missing_required_var_is_an_error() {
        std::env::remove_var("CHAIN_ID");
        std::env::remove_var("RPC_URL");
        assert!(matches!(OracleConfig::from_env(), Err(ConfigError::Var(_))));
    }

    #[test]
    #[serial]
    fn partial_ypriceapi_signer_is_an_error() {
        std::env::set_var("CHAIN_ID", "1");
        std::env::set_var("RPC_URL", "http://localhost:8545");
        std::env::set_var("YPRICEAPI_URL", "http://localhost:9000");
        std::env::set_var("YPRICEAPI_SIGNER", "0x0000000000000000000000000000000000000001");
        std::env::remove_var("YPRICEAPI_SIGNATURE");

        assert!(matches!(OracleConfig::from_env(), Err(ConfigError::PartialSigner)));

        std::env::remove_var("CHAIN_ID");
        std::env::remove_var("RPC_URL");
        std::env::remove_var("YPRICEAPI_URL");
        std::env::remove_var("YPRICEAPI_SIGNER");
    }
}
