//! Schema creation and drift detection.
//!
//! The tables are: `chain`,
//! `address`/`contract`/`token`, `block`, `price`, `log_topic`/`hashes`
//! (interning tables for the high-cardinality columns `log`/`trace` index
//! on), `log`, `trace`, `block_at_timestamp`, and the `log_cache_info`/
//! `trace_cache_info` range-cache metadata tables.

use crate::{Pool, StoreError};

const SQLITE_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS chain (
    id INTEGER PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS address (
    chain_id INTEGER NOT NULL REFERENCES chain(id),
    address TEXT NOT NULL,
    PRIMARY KEY (chain_id, address)
);

CREATE TABLE IF NOT EXISTS contract (
    chain_id INTEGER NOT NULL,
    address TEXT NOT NULL,
    deploy_block INTEGER,
    PRIMARY KEY (chain_id, address),
    FOREIGN KEY (chain_id, address) REFERENCES address(chain_id, address)
);

CREATE TABLE IF NOT EXISTS token (
    chain_id INTEGER NOT NULL REFERENCES chain(id),
    address TEXT NOT NULL,
    symbol TEXT,
    name TEXT,
    decimals INTEGER,
    bucket TEXT,
    PRIMARY KEY (chain_id, address)
);
CREATE INDEX IF NOT EXISTS token_bucket_idx ON token(bucket);

CREATE TABLE IF NOT EXISTS block (
    chain_id INTEGER NOT NULL REFERENCES chain(id),
    number INTEGER NOT NULL,
    hash TEXT,
    timestamp INTEGER,
    PRIMARY KEY (chain_id, number)
);
CREATE INDEX IF NOT EXISTS block_hash_idx ON block(chain_id, hash);

CREATE TABLE IF NOT EXISTS block_at_timestamp (
    chain_id INTEGER NOT NULL,
    timestamp INTEGER NOT NULL,
    block_number INTEGER NOT NULL,
    PRIMARY KEY (chain_id, timestamp)
);

CREATE TABLE IF NOT EXISTS price (
    chain_id INTEGER NOT NULL,
    token_address TEXT NOT NULL,
    block_number INTEGER NOT NULL,
    price TEXT NOT NULL,
    PRIMARY KEY (chain_id, token_address, block_number)
);

CREATE TABLE IF NOT EXISTS log_topic (
    dbid INTEGER PRIMARY KEY AUTOINCREMENT,
    topic TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS hashes (
    dbid INTEGER PRIMARY KEY AUTOINCREMENT,
    hash TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS log (
    chain_id INTEGER NOT NULL,
    block_number INTEGER NOT NULL,
    tx_hash_id INTEGER NOT NULL REFERENCES hashes(dbid),
    log_index INTEGER NOT NULL,
    address_id INTEGER NOT NULL REFERENCES hashes(dbid),
    topic0_id INTEGER REFERENCES log_topic(dbid),
    topic1_id INTEGER REFERENCES log_topic(dbid),
    topic2_id INTEGER REFERENCES log_topic(dbid),
    topic3_id INTEGER REFERENCES log_topic(dbid),
    filter_key BLOB NOT NULL,
    raw BLOB NOT NULL,
    PRIMARY KEY (chain_id, block_number, tx_hash_id, log_index)
);
CREATE INDEX IF NOT EXISTS log_address_topic0_idx ON log(address_id, topic0_id);
CREATE INDEX IF NOT EXISTS log_topic0_topic1_idx ON log(topic0_id, topic1_id);
CREATE INDEX IF NOT EXISTS log_block_topic0_idx ON log(chain_id, block_number, topic0_id);
CREATE INDEX IF NOT EXISTS log_filter_key_idx ON log(chain_id, filter_key, block_number);

CREATE TABLE IF NOT EXISTS trace (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    chain_id INTEGER NOT NULL,
    block_number INTEGER NOT NULL,
    tx_hash_id INTEGER REFERENCES hashes(dbid),
    from_address_id INTEGER REFERENCES hashes(dbid),
    to_address_id INTEGER REFERENCES hashes(dbid),
    filter_key BLOB NOT NULL,
    raw BLOB NOT NULL
);
CREATE INDEX IF NOT EXISTS trace_block_idx ON trace(chain_id, block_number);
CREATE INDEX IF NOT EXISTS trace_to_from_idx ON trace(to_address_id, from_address_id);
CREATE INDEX IF NOT EXISTS trace_filter_key_idx ON trace(chain_id, filter_key, block_number);

CREATE TABLE IF NOT EXISTS log_cache_info (
    chain_id INTEGER NOT NULL,
    address TEXT NOT NULL,
    topics_key BLOB NOT NULL,
    cached_from INTEGER NOT NULL,
    cached_thru INTEGER NOT NULL,
    PRIMARY KEY (chain_id, address, topics_key)
);

CREATE TABLE IF NOT EXISTS trace_cache_info (
    chain_id INTEGER NOT NULL,
    to_addresses BLOB NOT NULL,
    from_addresses BLOB NOT NULL,
    cached_from INTEGER NOT NULL,
    cached_thru INTEGER NOT NULL,
    PRIMARY KEY (chain_id, to_addresses, from_addresses)
);
"#;

const POSTGRES_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS chain (
    id BIGINT PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS address (
    chain_id BIGINT NOT NULL REFERENCES chain(id),
    address TEXT NOT NULL,
    PRIMARY KEY (chain_id, address)
);

CREATE TABLE IF NOT EXISTS contract (
    chain_id BIGINT NOT NULL,
    address TEXT NOT NULL,
    deploy_block BIGINT,
    PRIMARY KEY (chain_id, address),
    FOREIGN KEY (chain_id, address) REFERENCES address(chain_id, address)
);

CREATE TABLE IF NOT EXISTS token (
    chain_id BIGINT NOT NULL REFERENCES chain(id),
    address TEXT NOT NULL,
    symbol TEXT,
    name TEXT,
    decimals INTEGER,
    bucket TEXT,
    PRIMARY KEY (chain_id, address)
);
CREATE INDEX IF NOT EXISTS token_bucket_idx ON token(bucket);

CREATE TABLE IF NOT EXISTS block (
    chain_id BIGINT NOT NULL REFERENCES chain(id),
    number BIGINT NOT NULL,
    hash TEXT,
    timestamp BIGINT,
    PRIMARY KEY (chain_id, number)
);
CREATE INDEX IF NOT EXISTS block_hash_idx ON block(chain_id, hash);

CREATE TABLE IF NOT EXISTS block_at_timestamp (
    chain_id BIGINT NOT NULL,
    timestamp BIGINT NOT NULL,
    block_number BIGINT NOT NULL,
    PRIMARY KEY (chain_id, timestamp)
);

CREATE TABLE IF NOT EXISTS price (
    chain_id BIGINT NOT NULL,
    token_address TEXT NOT NULL,
    block_number BIGINT NOT NULL,
    price NUMERIC(38, 18) NOT NULL,
    PRIMARY KEY (chain_id, token_address, block_number)
);

CREATE TABLE IF NOT EXISTS log_topic (
    dbid BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
    topic TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS hashes (
    dbid BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
    hash TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS log (
    chain_id BIGINT NOT NULL,
    block_number BIGINT NOT NULL,
    tx_hash_id BIGINT NOT NULL REFERENCES hashes(dbid),
    log_index BIGINT NOT NULL,
    address_id BIGINT NOT NULL REFERENCES hashes(dbid),
    topic0_id BIGINT REFERENCES log_topic(dbid),
    topic1_id BIGINT REFERENCES log_topic(dbid),
    topic2_id BIGINT REFERENCES log_topic(dbid),
    topic3_id BIGINT REFERENCES log_topic(dbid),
    filter_key BYTEA NOT NULL,
    raw BYTEA NOT NULL,
    PRIMARY KEY (chain_id, block_number, tx_hash_id, log_index)
);
CREATE INDEX IF NOT EXISTS log_address_topic0_idx ON log(address_id, topic0_id);
CREATE INDEX IF NOT EXISTS log_topic0_topic1_idx ON log(topic0_id, topic1_id);
CREATE INDEX IF NOT EXISTS log_block_topic0_idx ON log(chain_id, block_number, topic0_id);
CREATE INDEX IF NOT EXISTS log_filter_key_idx ON log(chain_id, filter_key, block_number);

CREATE TABLE IF NOT EXISTS trace (
    id BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
    chain_id BIGINT NOT NULL,
    block_number BIGINT NOT NULL,
    tx_hash_id BIGINT REFERENCES hashes(dbid),
    from_address_id BIGINT REFERENCES hashes(dbid),
    to_address_id BIGINT REFERENCES hashes(dbid),
    filter_key BYTEA NOT NULL,
    raw BYTEA NOT NULL
);
CREATE INDEX IF NOT EXISTS trace_block_idx ON trace(chain_id, block_number);
CREATE INDEX IF NOT EXISTS trace_to_from_idx ON trace(to_address_id, from_address_id);
CREATE INDEX IF NOT EXISTS trace_filter_key_idx ON trace(chain_id, filter_key, block_number);

CREATE TABLE IF NOT EXISTS log_cache_info (
    chain_id BIGINT NOT NULL,
    address TEXT NOT NULL,
    topics_key BYTEA NOT NULL,
    cached_from BIGINT NOT NULL,
    cached_thru BIGINT NOT NULL,
    PRIMARY KEY (chain_id, address, topics_key)
);

CREATE TABLE IF NOT EXISTS trace_cache_info (
    chain_id BIGINT NOT NULL,
    to_addresses BYTEA NOT NULL,
    from_addresses BYTEA NOT NULL,
    cached_from BIGINT NOT NULL,
    cached_thru BIGINT NOT NULL,
    PRIMARY KEY (chain_id, to_addresses, from_addresses)
);
"#;

/// Create the schema if it doesn't exist yet, or confirm it matches what
/// this build expects.
pub async fn ensure_schema(pool: &Pool) -> Result<(), StoreError> {
    match pool {
        Pool::Sqlite(p) => {
            for stmt in SQLITE_DDL.split(';').map(str::trim).filter(|s| !s.is_empty()) {
                sqlx::query(stmt).execute(p).await.map_err(StoreError::classify)?;
            }
        }
        Pool::Postgres(p) => {
            for stmt in POSTGRES_DDL.split(';').map(str::trim).filter(|s| !s.is_empty()) {
                sqlx::query(stmt).execute(p).await.map_err(StoreError::classify)?;
            }
        }
    }
    check_price_column_type(pool).await
}

/// Guard against a previous run of this process (or a different schema
/// version) having created a `price` column with an incompatible type.
/// `y._db` has no equivalent check (Pony ORM owns its own migrations);
/// this is new ambient robustness for a schema we hand-roll.
async fn check_price_column_type(pool: &Pool) -> Result<(), StoreError> {
    if let Pool::Postgres(p) = pool {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT data_type FROM information_schema.columns \
             WHERE table_name = 'price' AND column_name = 'price'",
        )
        .fetch_optional(p)
        .await
        .map_err(StoreError::classify)?;
        if let Some((data_type,)) = row {
            if data_type != "numeric" {
                return Err(StoreError::SchemaDrift(format!(
                    "price.price column has type {data_type}, expected numeric"
                )));
            }
        }
    }
    Ok(())
}
