use crate::{cache_info::LogCacheInfo, cache_info::TraceCacheInfo, price::PriceRow, token::TokenRow};
use crate::{BlockRow, LogRow, StoreError, StoreInfo, TraceRow};
use alloy::primitives::Address;
use rust_decimal::Decimal;
use sqlx::{postgres::PgPoolOptions, sqlite::SqlitePoolOptions, PgPool, QueryBuilder, Row, SqlitePool};
use std::str::FromStr;

/// The two storage backends a `Store` can bind to: embedded SQLite and
/// networked Postgres, behind one surface.
///
/// Grounded on the `sqlx::SqlitePool` + `QueryBuilder` bulk-insert pattern
/// used for Frontier's log-indexing cache.
#[derive(Debug, Clone)]
pub enum Pool {
    /// The embedded, file-backed default.
    Sqlite(SqlitePool),
    /// A networked Postgres database.
    Postgres(PgPool),
}

impl Pool {
    /// Open (creating if missing) a SQLite database at `path`.
    pub async fn connect_sqlite(path: &str) -> Result<Self, StoreError> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let opts = sqlx::sqlite::SqliteConnectOptions::from_str(path)
            .map_err(StoreError::classify)?
            .create_if_missing(true)
            .busy_timeout(std::time::Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(16)
            .connect_with(opts)
            .await
            .map_err(StoreError::classify)?;
        Ok(Self::Sqlite(pool))
    }

    /// Connect to a Postgres database.
    pub async fn connect_postgres(connection_string: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(16)
            .connect(connection_string)
            .await
            .map_err(StoreError::classify)?;
        Ok(Self::Postgres(pool))
    }

    pub(crate) async fn insert_or_ignore_chain(&self, chain_id: i64) -> Result<(), StoreError> {
        match self {
            Self::Sqlite(p) => {
                sqlx::query("INSERT OR IGNORE INTO chain(id) VALUES (?)")
                    .bind(chain_id)
                    .execute(p)
                    .await
                    .map_err(StoreError::classify)?;
            }
            Self::Postgres(p) => {
                sqlx::query("INSERT INTO chain(id) VALUES ($1) ON CONFLICT DO NOTHING")
                    .bind(chain_id)
                    .execute(p)
                    .await
                    .map_err(StoreError::classify)?;
            }
        }
        Ok(())
    }

    pub(crate) async fn select_token(
        &self,
        chain_id: i64,
        address: Address,
    ) -> Result<Option<TokenRow>, StoreError> {
        let addr = address.to_string();
        let row = match self {
            Self::Sqlite(p) => sqlx::query(
                "SELECT chain_id, address, symbol, name, decimals, bucket FROM token \
                     WHERE chain_id = ? AND address = ?",
            )
            .bind(chain_id)
            .bind(&addr)
            .fetch_optional(p)
            .await
            .map_err(StoreError::classify)?
            .map(|r| TokenRow {
                chain_id: r.get::<i64, _>("chain_id"),
                address: r.get::<String, _>("address").parse().unwrap_or(address),
                symbol: r.get("symbol"),
                name: r.get("name"),
                decimals: r.get::<Option<i32>, _>("decimals").map(|d| d as u8),
                bucket: r.get("bucket"),
            }),
            Self::Postgres(p) => sqlx::query(
                "SELECT chain_id, address, symbol, name, decimals, bucket FROM token \
                     WHERE chain_id = $1 AND address = $2",
            )
            .bind(chain_id)
            .bind(&addr)
            .fetch_optional(p)
            .await
            .map_err(StoreError::classify)?
            .map(|r| TokenRow {
                chain_id: r.get::<i64, _>("chain_id"),
                address: r.get::<String, _>("address").parse().unwrap_or(address),
                symbol: r.get("symbol"),
                name: r.get("name"),
                decimals: r.get::<Option<i32>, _>("decimals").map(|d| d as u8),
                bucket: r.get("bucket"),
            }),
        };

        Ok(row)
    }

    pub(crate) async fn upsert_token(&self, row: &TokenRow) -> Result<(), StoreError> {
        let addr = row.address.to_string();
        let decimals = row.decimals.map(i32::from);
        match self {
            Self::Sqlite(p) => {
                sqlx::query(
                    "INSERT INTO token(chain_id, address, symbol, name, decimals, bucket) \
                     VALUES (?, ?, ?, ?, ?, ?) \
                     ON CONFLICT(chain_id, address) DO UPDATE SET \
                     symbol = excluded.symbol, name = excluded.name, \
                     decimals = excluded.decimals, bucket = excluded.bucket",
                )
                .bind(row.chain_id)
                .bind(&addr)
                .bind(&row.symbol)
                .bind(&row.name)
                .bind(decimals)
                .bind(&row.bucket)
                .execute(p)
                .await
                .map_err(StoreError::classify)?;
            }
            Self::Postgres(p) => {
                sqlx::query(
                    "INSERT INTO token(chain_id, address, symbol, name, decimals, bucket) \
                     VALUES ($1, $2, $3, $4, $5, $6) \
                     ON CONFLICT(chain_id, address) DO UPDATE SET \
                     symbol = excluded.symbol, name = excluded.name, \
                     decimals = excluded.decimals, bucket = excluded.bucket",
                )
                .bind(row.chain_id)
                .bind(&addr)
                .bind(&row.symbol)
                .bind(&row.name)
                .bind(decimals)
                .bind(&row.bucket)
                .execute(p)
                .await
                .map_err(StoreError::classify)?;
            }
        }
        Ok(())
    }

    pub(crate) async fn select_price(
        &self,
        chain_id: i64,
        token: Address,
        block: i64,
    ) -> Result<Option<Decimal>, StoreError> {
        let addr = token.to_string();
        let row: Option<(String,)> = match self {
            Self::Sqlite(p) => {
                sqlx::query_as(
                    "SELECT price FROM price WHERE chain_id = ? AND token_address = ? AND block_number = ?",
                )
                .bind(chain_id)
                .bind(&addr)
                .bind(block)
                .fetch_optional(p)
                .await
            }
            Self::Postgres(p) => {
                sqlx::query_as(
                    "SELECT price::text FROM price WHERE chain_id = $1 AND token_address = $2 AND block_number = $3",
                )
                .bind(chain_id)
                .bind(&addr)
                .bind(block)
                .fetch_optional(p)
                .await
            }
        }
        .map_err(StoreError::classify)?;

        row.map(|(s,)| Decimal::from_str(&s).map_err(|e| StoreError::SchemaDrift(e.to_string())))
            .transpose()
    }

    pub(crate) async fn bulk_insert_prices(&self, rows: &[PriceRow]) -> Result<(), StoreError> {
        match self {
            Self::Sqlite(p) => {
                let mut tx = p.begin().await.map_err(StoreError::classify)?;
                let mut builder: QueryBuilder<'_, sqlx::Sqlite> =
                    QueryBuilder::new("INSERT OR IGNORE INTO price(chain_id, token_address, block_number, price) ");
                builder.push_values(rows, |mut b, row| {
                    b.push_bind(row.chain_id)
                        .push_bind(row.token.to_string())
                        .push_bind(row.block as i64)
                        .push_bind(row.price.to_string());
                });
                builder.build().execute(&mut *tx).await.map_err(StoreError::classify)?;
                tx.commit().await.map_err(StoreError::classify)?;
            }
            Self::Postgres(p) => {
                let mut tx = p.begin().await.map_err(StoreError::classify)?;
                let mut builder: QueryBuilder<'_, sqlx::Postgres> =
                    QueryBuilder::new("INSERT INTO price(chain_id, token_address, block_number, price) ");
                builder.push_values(rows, |mut b, row| {
                    b.push_bind(row.chain_id)
                        .push_bind(row.token.to_string())
                        .push_bind(row.block as i64)
                        .push_bind(row.price);
                });
                builder.push(" ON CONFLICT DO NOTHING");
                builder.build().execute(&mut *tx).await.map_err(StoreError::classify)?;
                tx.commit().await.map_err(StoreError::classify)?;
            }
        }
        Ok(())
    }

    pub(crate) async fn select_log_cache_info(
        &self,
        chain_id: i64,
        address: Address,
        topics_key: &[u8],
    ) -> Result<Option<LogCacheInfo>, StoreError> {
        let addr = address.to_string();
        let row = match self {
            Self::Sqlite(p) => sqlx::query(
                "SELECT cached_from, cached_thru FROM log_cache_info \
                     WHERE chain_id = ? AND address = ? AND topics_key = ?",
            )
            .bind(chain_id)
            .bind(&addr)
            .bind(topics_key)
            .fetch_optional(p)
            .await
            .map_err(StoreError::classify)?
            .map(|r| LogCacheInfo {
                chain_id,
                address,
                topics_key: topics_key.to_vec(),
                cached_from: r.get::<i64, _>("cached_from") as u64,
                cached_thru: r.get::<i64, _>("cached_thru") as u64,
            }),
            Self::Postgres(p) => sqlx::query(
                "SELECT cached_from, cached_thru FROM log_cache_info \
                     WHERE chain_id = $1 AND address = $2 AND topics_key = $3",
            )
            .bind(chain_id)
            .bind(&addr)
            .bind(topics_key)
            .fetch_optional(p)
            .await
            .map_err(StoreError::classify)?
            .map(|r| LogCacheInfo {
                chain_id,
                address,
                topics_key: topics_key.to_vec(),
                cached_from: r.get::<i64, _>("cached_from") as u64,
                cached_thru: r.get::<i64, _>("cached_thru") as u64,
            }),
        };

        Ok(row)
    }

    pub(crate) async fn upsert_log_cache_info(&self, info: &LogCacheInfo) -> Result<(), StoreError> {
        let addr = info.address.to_string();
        match self {
            Self::Sqlite(p) => {
                sqlx::query(
                    "INSERT INTO log_cache_info(chain_id, address, topics_key, cached_from, cached_thru) \
                     VALUES (?, ?, ?, ?, ?) \
                     ON CONFLICT(chain_id, address, topics_key) DO UPDATE SET \
                     cached_from = MIN(cached_from, excluded.cached_from), \
                     cached_thru = MAX(cached_thru, excluded.cached_thru)",
                )
                .bind(info.chain_id)
                .bind(&addr)
                .bind(&info.topics_key)
                .bind(info.cached_from as i64)
                .bind(info.cached_thru as i64)
                .execute(p)
                .await
                .map_err(StoreError::classify)?;
            }
            Self::Postgres(p) => {
                sqlx::query(
                    "INSERT INTO log_cache_info(chain_id, address, topics_key, cached_from, cached_thru) \
                     VALUES ($1, $2, $3, $4, $5) \
                     ON CONFLICT(chain_id, address, topics_key) DO UPDATE SET \
                     cached_from = LEAST(log_cache_info.cached_from, excluded.cached_from), \
                     cached_thru = GREATEST(log_cache_info.cached_thru, excluded.cached_thru)",
                )
                .bind(info.chain_id)
                .bind(&addr)
                .bind(&info.topics_key)
                .bind(info.cached_from as i64)
                .bind(info.cached_thru as i64)
                .execute(p)
                .await
                .map_err(StoreError::classify)?;
            }
        }
        Ok(())
    }

    pub(crate) async fn select_trace_cache_info(
        &self,
        chain_id: i64,
        to_addresses: &[u8],
        from_addresses: &[u8],
    ) -> Result<Option<TraceCacheInfo>, StoreError> {
        let row = match self {
            Self::Sqlite(p) => sqlx::query(
                "SELECT cached_from, cached_thru FROM trace_cache_info \
                     WHERE chain_id = ? AND to_addresses = ? AND from_addresses = ?",
            )
            .bind(chain_id)
            .bind(to_addresses)
            .bind(from_addresses)
            .fetch_optional(p)
            .await
            .map_err(StoreError::classify)?
            .map(|r| TraceCacheInfo {
                chain_id,
                to_addresses: to_addresses.to_vec(),
                from_addresses: from_addresses.to_vec(),
                cached_from: r.get::<i64, _>("cached_from") as u64,
                cached_thru: r.get::<i64, _>("cached_thru") as u64,
            }),
            Self::Postgres(p) => sqlx::query(
                "SELECT cached_from, cached_thru FROM trace_cache_info \
                     WHERE chain_id = $1 AND to_addresses = $2 AND from_addresses = $3",
            )
            .bind(chain_id)
            .bind(to_addresses)
            .bind(from_addresses)
            .fetch_optional(p)
            .await
            .map_err(StoreError::classify)?
            .map(|r| TraceCacheInfo {
                chain_id,
                to_addresses: to_addresses.to_vec(),
                from_addresses: from_addresses.to_vec(),
                cached_from: r.get::<i64, _>("cached_from") as u64,
                cached_thru: r.get::<i64, _>("cached_thru") as u64,
            }),
        };

        Ok(row)
    }

    pub(crate) async fn upsert_trace_cache_info(&self, info: &TraceCacheInfo) -> Result<(), StoreError> {
        match self {
            Self::Sqlite(p) => {
                sqlx::query(
                    "INSERT INTO trace_cache_info(chain_id, to_addresses, from_addresses, cached_from, cached_thru) \
                     VALUES (?, ?, ?, ?, ?) \
                     ON CONFLICT(chain_id, to_addresses, from_addresses) DO UPDATE SET \
                     cached_from = MIN(cached_from, excluded.cached_from), \
                     cached_thru = MAX(cached_thru, excluded.cached_thru)",
                )
                .bind(info.chain_id)
                .bind(&info.to_addresses)
                .bind(&info.from_addresses)
                .bind(info.cached_from as i64)
                .bind(info.cached_thru as i64)
                .execute(p)
                .await
                .map_err(StoreError::classify)?;
            }
            Self::Postgres(p) => {
                sqlx::query(
                    "INSERT INTO trace_cache_info(chain_id, to_addresses, from_addresses, cached_from, cached_thru) \
                     VALUES ($1, $2, $3, $4, $5) \
                     ON CONFLICT(chain_id, to_addresses, from_addresses) DO UPDATE SET \
                     cached_from = LEAST(trace_cache_info.cached_from, excluded.cached_from), \
                     cached_thru = GREATEST(trace_cache_info.cached_thru, excluded.cached_thru)",
                )
                .bind(info.chain_id)
                .bind(&info.to_addresses)
                .bind(&info.from_addresses)
                .bind(info.cached_from as i64)
                .bind(info.cached_thru as i64)
                .execute(p)
                .await
                .map_err(StoreError::classify)?;
            }
        }
        Ok(())
    }

    /// Delete every cached price for the token matching `address`, plus
    /// the token row itself.
    pub(crate) async fn clear_prices_for_token(
        &self,
        chain_id: i64,
        address: Address,
    ) -> Result<u64, StoreError> {
        let addr = address.to_string();
        let deleted = match self {
            Self::Sqlite(p) => {
                let result = sqlx::query("DELETE FROM price WHERE chain_id = ? AND token_address = ?")
                    .bind(chain_id)
                    .bind(&addr)
                    .execute(p)
                    .await
                    .map_err(StoreError::classify)?;
                sqlx::query("DELETE FROM token WHERE chain_id = ? AND address = ?")
                    .bind(chain_id)
                    .bind(&addr)
                    .execute(p)
                    .await
                    .map_err(StoreError::classify)?;
                result.rows_affected()
            }
            Self::Postgres(p) => {
                let result = sqlx::query("DELETE FROM price WHERE chain_id = $1 AND token_address = $2")
                    .bind(chain_id)
                    .bind(&addr)
                    .execute(p)
                    .await
                    .map_err(StoreError::classify)?;
                sqlx::query("DELETE FROM token WHERE chain_id = $1 AND address = $2")
                    .bind(chain_id)
                    .bind(&addr)
                    .execute(p)
                    .await
                    .map_err(StoreError::classify)?;
                result.rows_affected()
            }
        };
        Ok(deleted)
    }

    /// Delete every cached price for the token whose `symbol` matches
    /// `symbol` (case-insensitive), plus the token row itself.
    pub(crate) async fn clear_prices_for_symbol(&self, chain_id: i64, symbol: &str) -> Result<u64, StoreError> {
        match self {
            Self::Sqlite(p) => {
                let result = sqlx::query(
                    "DELETE FROM price WHERE chain_id = ? AND token_address IN \
                     (SELECT address FROM token WHERE chain_id = ? AND LOWER(symbol) = LOWER(?))",
                )
                .bind(chain_id)
                .bind(chain_id)
                .bind(symbol)
                .execute(p)
                .await
                .map_err(StoreError::classify)?;
                sqlx::query("DELETE FROM token WHERE chain_id = ? AND LOWER(symbol) = LOWER(?)")
                    .bind(chain_id)
                    .bind(symbol)
                    .execute(p)
                    .await
                    .map_err(StoreError::classify)?;
                Ok(result.rows_affected())
            }
            Self::Postgres(p) => {
                let result = sqlx::query(
                    "DELETE FROM price WHERE chain_id = $1 AND token_address IN \
                     (SELECT address FROM token WHERE chain_id = $1 AND LOWER(symbol) = LOWER($2))",
                )
                .bind(chain_id)
                .bind(symbol)
                .execute(p)
                .await
                .map_err(StoreError::classify)?;
                sqlx::query("DELETE FROM token WHERE chain_id = $1 AND LOWER(symbol) = LOWER($2)")
                    .bind(chain_id)
                    .bind(symbol)
                    .execute(p)
                    .await
                    .map_err(StoreError::classify)?;
                Ok(result.rows_affected())
            }
        }
    }

    /// Delete every cached price at `block`.
    pub(crate) async fn clear_prices_for_block(&self, chain_id: i64, block: i64) -> Result<u64, StoreError> {
        let deleted = match self {
            Self::Sqlite(p) => sqlx::query("DELETE FROM price WHERE chain_id = ? AND block_number = ?")
                .bind(chain_id)
                .bind(block)
                .execute(p)
                .await
                .map_err(StoreError::classify)?
                .rows_affected(),
            Self::Postgres(p) => sqlx::query("DELETE FROM price WHERE chain_id = $1 AND block_number = $2")
                .bind(chain_id)
                .bind(block)
                .execute(p)
                .await
                .map_err(StoreError::classify)?
                .rows_affected(),
        };
        Ok(deleted)
    }

    pub(crate) async fn nuke(&self) -> Result<(), StoreError> {
        for table in [
            "log",
            "trace",
            "log_cache_info",
            "trace_cache_info",
            "block_at_timestamp",
            "block",
            "price",
            "token",
            "contract",
            "address",
            "log_topic",
            "hashes",
            "chain",
        ] {
            let stmt = format!("DELETE FROM {table}");
            match self {
                Self::Sqlite(p) => {
                    sqlx::query(&stmt).execute(p).await.map_err(StoreError::classify)?;
                }
                Self::Postgres(p) => {
                    sqlx::query(&stmt).execute(p).await.map_err(StoreError::classify)?;
                }
            }
        }
        Ok(())
    }

    /// Record that `address` exists on `chain_id`, if it is not already
    /// known.
    pub(crate) async fn ensure_address(&self, chain_id: i64, address: Address) -> Result<(), StoreError> {
        let addr = address.to_string();
        match self {
            Self::Sqlite(p) => {
                sqlx::query("INSERT OR IGNORE INTO address(chain_id, address) VALUES (?, ?)")
                    .bind(chain_id)
                    .bind(&addr)
                    .execute(p)
                    .await
                    .map_err(StoreError::classify)?;
            }
            Self::Postgres(p) => {
                sqlx::query("INSERT INTO address(chain_id, address) VALUES ($1, $2) ON CONFLICT DO NOTHING")
                    .bind(chain_id)
                    .bind(&addr)
                    .execute(p)
                    .await
                    .map_err(StoreError::classify)?;
            }
        }
        Ok(())
    }

    /// Record that `address` is a contract, deployed at `deploy_block` if
    /// known. Implies [`Self::ensure_address`].
    pub(crate) async fn ensure_contract(
        &self,
        chain_id: i64,
        address: Address,
        deploy_block: Option<u64>,
    ) -> Result<(), StoreError> {
        self.ensure_address(chain_id, address).await?;
        let addr = address.to_string();
        let deploy_block = deploy_block.map(|b| b as i64);
        match self {
            Self::Sqlite(p) => {
                sqlx::query(
                    "INSERT INTO contract(chain_id, address, deploy_block) VALUES (?, ?, ?) \
                     ON CONFLICT(chain_id, address) DO UPDATE SET \
                     deploy_block = COALESCE(contract.deploy_block, excluded.deploy_block)",
                )
                .bind(chain_id)
                .bind(&addr)
                .bind(deploy_block)
                .execute(p)
                .await
                .map_err(StoreError::classify)?;
            }
            Self::Postgres(p) => {
                sqlx::query(
                    "INSERT INTO contract(chain_id, address, deploy_block) VALUES ($1, $2, $3) \
                     ON CONFLICT(chain_id, address) DO UPDATE SET \
                     deploy_block = COALESCE(contract.deploy_block, excluded.deploy_block)",
                )
                .bind(chain_id)
                .bind(&addr)
                .bind(deploy_block)
                .execute(p)
                .await
                .map_err(StoreError::classify)?;
            }
        }
        Ok(())
    }

    /// Insert or update a block's identity.
    pub(crate) async fn upsert_block(&self, row: &BlockRow) -> Result<(), StoreError> {
        let hash = row.hash.map(|h| h.to_string());
        let timestamp = row.timestamp.map(|t| t as i64);
        match self {
            Self::Sqlite(p) => {
                sqlx::query(
                    "INSERT INTO block(chain_id, number, hash, timestamp) VALUES (?, ?, ?, ?) \
                     ON CONFLICT(chain_id, number) DO UPDATE SET \
                     hash = COALESCE(excluded.hash, block.hash), \
                     timestamp = COALESCE(excluded.timestamp, block.timestamp)",
                )
                .bind(row.chain_id)
                .bind(row.number as i64)
                .bind(&hash)
                .bind(timestamp)
                .execute(p)
                .await
                .map_err(StoreError::classify)?;
            }
            Self::Postgres(p) => {
                sqlx::query(
                    "INSERT INTO block(chain_id, number, hash, timestamp) VALUES ($1, $2, $3, $4) \
                     ON CONFLICT(chain_id, number) DO UPDATE SET \
                     hash = COALESCE(excluded.hash, block.hash), \
                     timestamp = COALESCE(excluded.timestamp, block.timestamp)",
                )
                .bind(row.chain_id)
                .bind(row.number as i64)
                .bind(&hash)
                .bind(timestamp)
                .execute(p)
                .await
                .map_err(StoreError::classify)?;
            }
        }
        Ok(())
    }

    pub(crate) async fn select_block(&self, chain_id: i64, number: u64) -> Result<Option<BlockRow>, StoreError> {
        let row = match self {
            Self::Sqlite(p) => sqlx::query("SELECT hash, timestamp FROM block WHERE chain_id = ? AND number = ?")
                .bind(chain_id)
                .bind(number as i64)
                .fetch_optional(p)
                .await
                .map_err(StoreError::classify)?
                .map(|r| BlockRow {
                    chain_id,
                    number,
                    hash: r.get::<Option<String>, _>("hash").and_then(|h| h.parse().ok()),
                    timestamp: r.get::<Option<i64>, _>("timestamp").map(|t| t as u64),
                }),
            Self::Postgres(p) => sqlx::query("SELECT hash, timestamp FROM block WHERE chain_id = $1 AND number = $2")
                .bind(chain_id)
                .bind(number as i64)
                .fetch_optional(p)
                .await
                .map_err(StoreError::classify)?
                .map(|r| BlockRow {
                    chain_id,
                    number,
                    hash: r.get::<Option<String>, _>("hash").and_then(|h| h.parse().ok()),
                    timestamp: r.get::<Option<i64>, _>("timestamp").map(|t| t as u64),
                }),
        };

        Ok(row)
    }

    /// Record the block found to be current at `timestamp` (`y._db`'s
    /// `BlockAtTimestamp`, a cache for the binary-search-by-timestamp
    /// lookup strategies use to resolve "price at this time" requests).
    pub(crate) async fn set_block_at_timestamp(
        &self,
        chain_id: i64,
        timestamp: u64,
        block_number: u64,
    ) -> Result<(), StoreError> {
        match self {
            Self::Sqlite(p) => {
                sqlx::query(
                    "INSERT OR IGNORE INTO block_at_timestamp(chain_id, timestamp, block_number) VALUES (?, ?, ?)",
                )
                .bind(chain_id)
                .bind(timestamp as i64)
                .bind(block_number as i64)
                .execute(p)
                .await
                .map_err(StoreError::classify)?;
            }
            Self::Postgres(p) => {
                sqlx::query(
                    "INSERT INTO block_at_timestamp(chain_id, timestamp, block_number) VALUES ($1, $2, $3) \
                     ON CONFLICT DO NOTHING",
                )
                .bind(chain_id)
                .bind(timestamp as i64)
                .bind(block_number as i64)
                .execute(p)
                .await
                .map_err(StoreError::classify)?;
            }
        }
        Ok(())
    }

    pub(crate) async fn get_block_at_timestamp(
        &self,
        chain_id: i64,
        timestamp: u64,
    ) -> Result<Option<u64>, StoreError> {
        let row: Option<(i64,)> = match self {
            Self::Sqlite(p) => {
                sqlx::query_as("SELECT block_number FROM block_at_timestamp WHERE chain_id = ? AND timestamp = ?")
                    .bind(chain_id)
                    .bind(timestamp as i64)
                    .fetch_optional(p)
                    .await
            }
            Self::Postgres(p) => {
                sqlx::query_as("SELECT block_number FROM block_at_timestamp WHERE chain_id = $1 AND timestamp = $2")
                    .bind(chain_id)
                    .bind(timestamp as i64)
                    .fetch_optional(p)
                    .await
            }
        }
        .map_err(StoreError::classify)?;
        Ok(row.map(|(b,)| b as u64))
    }

    /// Intern `hash` (a tx hash or an address, both stored as hex text)
    /// into the `hashes` table, returning its row id. Select-then-insert-
    /// then-select rather than `RETURNING`, so the same code path works
    /// whether or not this row already existed.
    async fn intern_hash(&self, hash: &str) -> Result<i64, StoreError> {
        if let Some(id) = self.lookup_interned("hashes", "hash", hash).await? {
            return Ok(id);
        }
        match self {
            Self::Sqlite(p) => {
                sqlx::query("INSERT OR IGNORE INTO hashes(hash) VALUES (?)")
                    .bind(hash)
                    .execute(p)
                    .await
                    .map_err(StoreError::classify)?;
            }
            Self::Postgres(p) => {
                sqlx::query("INSERT INTO hashes(hash) VALUES ($1) ON CONFLICT DO NOTHING")
                    .bind(hash)
                    .execute(p)
                    .await
                    .map_err(StoreError::classify)?;
            }
        }
        self.lookup_interned("hashes", "hash", hash)
            .await?
            .ok_or_else(|| StoreError::SchemaDrift("hash failed to intern".to_owned()))
    }

    /// As [`Self::intern_hash`], for the `log_topic` table.
    async fn intern_topic(&self, topic: &str) -> Result<i64, StoreError> {
        if let Some(id) = self.lookup_interned("log_topic", "topic", topic).await? {
            return Ok(id);
        }
        match self {
            Self::Sqlite(p) => {
                sqlx::query("INSERT OR IGNORE INTO log_topic(topic) VALUES (?)")
                    .bind(topic)
                    .execute(p)
                    .await
                    .map_err(StoreError::classify)?;
            }
            Self::Postgres(p) => {
                sqlx::query("INSERT INTO log_topic(topic) VALUES ($1) ON CONFLICT DO NOTHING")
                    .bind(topic)
                    .execute(p)
                    .await
                    .map_err(StoreError::classify)?;
            }
        }
        self.lookup_interned("log_topic", "topic", topic)
            .await?
            .ok_or_else(|| StoreError::SchemaDrift("topic failed to intern".to_owned()))
    }

    async fn lookup_interned(&self, table: &'static str, column: &'static str, value: &str) -> Result<Option<i64>, StoreError> {
        let row: Option<(i64,)> = match self {
            Self::Sqlite(p) => {
                sqlx::query_as(&format!("SELECT dbid FROM {table} WHERE {column} = ?")).bind(value).fetch_optional(p).await
            }
            Self::Postgres(p) => {
                sqlx::query_as(&format!("SELECT dbid FROM {table} WHERE {column} = $1"))
                    .bind(value)
                    .fetch_optional(p)
                    .await
            }
        }
        .map_err(StoreError::classify)?;
        Ok(row.map(|(id,)| id))
    }

    /// Insert every log in `rows`, interning their address/topics/tx hash
    /// first. Idempotent: replaying the same rows is a no-op past the
    /// first insert.
    pub(crate) async fn bulk_insert_logs(&self, rows: &[LogRow]) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }

        struct Resolved<'a> {
            row: &'a LogRow,
            tx_hash_id: i64,
            address_id: i64,
            topic_ids: [Option<i64>; 4],
        }
        let mut resolved = Vec::with_capacity(rows.len());
        for row in rows {
            let tx_hash_id = self.intern_hash(&row.tx_hash.to_string()).await?;
            let address_id = self.intern_hash(&row.address.to_string()).await?;
            let mut topic_ids = [None; 4];
            for (slot, topic) in topic_ids.iter_mut().zip(row.topics.iter()) {
                *slot = Some(self.intern_topic(&topic.to_string()).await?);
            }
            resolved.push(Resolved { row, tx_hash_id, address_id, topic_ids });
        }

        match self {
            Self::Sqlite(p) => {
                let mut tx = p.begin().await.map_err(StoreError::classify)?;
                let mut builder: QueryBuilder<'_, sqlx::Sqlite> = QueryBuilder::new(
                    "INSERT OR IGNORE INTO log(chain_id, block_number, tx_hash_id, log_index, address_id, \
                     topic0_id, topic1_id, topic2_id, topic3_id, filter_key, raw) ",
                );
                builder.push_values(&resolved, |mut b, r| {
                    b.push_bind(r.row.chain_id)
                        .push_bind(r.row.block_number as i64)
                        .push_bind(r.tx_hash_id)
                        .push_bind(r.row.log_index as i64)
                        .push_bind(r.address_id)
                        .push_bind(r.topic_ids[0])
                        .push_bind(r.topic_ids[1])
                        .push_bind(r.topic_ids[2])
                        .push_bind(r.topic_ids[3])
                        .push_bind(r.row.filter_key.clone())
                        .push_bind(r.row.raw.clone());
                });
                builder.build().execute(&mut *tx).await.map_err(StoreError::classify)?;
                tx.commit().await.map_err(StoreError::classify)?;
            }
            Self::Postgres(p) => {
                let mut tx = p.begin().await.map_err(StoreError::classify)?;
                let mut builder: QueryBuilder<'_, sqlx::Postgres> = QueryBuilder::new(
                    "INSERT INTO log(chain_id, block_number, tx_hash_id, log_index, address_id, \
                     topic0_id, topic1_id, topic2_id, topic3_id, filter_key, raw) ",
                );
                builder.push_values(&resolved, |mut b, r| {
                    b.push_bind(r.row.chain_id)
                        .push_bind(r.row.block_number as i64)
                        .push_bind(r.tx_hash_id)
                        .push_bind(r.row.log_index as i64)
                        .push_bind(r.address_id)
                        .push_bind(r.topic_ids[0])
                        .push_bind(r.topic_ids[1])
                        .push_bind(r.topic_ids[2])
                        .push_bind(r.topic_ids[3])
                        .push_bind(r.row.filter_key.clone())
                        .push_bind(r.row.raw.clone());
                });
                builder.push(" ON CONFLICT DO NOTHING");
                builder.build().execute(&mut *tx).await.map_err(StoreError::classify)?;
                tx.commit().await.map_err(StoreError::classify)?;
            }
        }
        Ok(())
    }

    /// Every persisted log matching `filter_key` in `[from, to]`, in
    /// `(block_number, tx_hash, log_index)` order.
    pub(crate) async fn select_logs_by_filter_key(
        &self,
        chain_id: i64,
        filter_key: &[u8],
        from: u64,
        to: u64,
    ) -> Result<Vec<LogRow>, StoreError> {
        const SELECT: &str = "l.block_number, h_tx.hash AS tx_hash, l.log_index, h_addr.hash AS address, \
             t0.topic AS topic0, t1.topic AS topic1, t2.topic AS topic2, t3.topic AS topic3, l.raw \
             FROM log l \
             JOIN hashes h_tx ON h_tx.dbid = l.tx_hash_id \
             JOIN hashes h_addr ON h_addr.dbid = l.address_id \
             LEFT JOIN log_topic t0 ON t0.dbid = l.topic0_id \
             LEFT JOIN log_topic t1 ON t1.dbid = l.topic1_id \
             LEFT JOIN log_topic t2 ON t2.dbid = l.topic2_id \
             LEFT JOIN log_topic t3 ON t3.dbid = l.topic3_id ";
        let rows = match self {
            Self::Sqlite(p) => {
                let rows = sqlx::query(&format!(
                    "SELECT {SELECT} WHERE l.chain_id = ? AND l.filter_key = ? AND l.block_number BETWEEN ? AND ? \
                     ORDER BY l.block_number, h_tx.hash, l.log_index"
                ))
                .bind(chain_id)
                .bind(filter_key)
                .bind(from as i64)
                .bind(to as i64)
                .fetch_all(p)
                .await
                .map_err(StoreError::classify)?;
                rows.into_iter()
                    .map(|r| {
                        let mut topics = Vec::new();
                        for col in ["topic0", "topic1", "topic2", "topic3"] {
                            if let Some(t) = r.get::<Option<String>, _>(col) {
                                topics.push(
                                    t.parse()
                                        .map_err(|_| StoreError::SchemaDrift(format!("bad topic hex in {col}")))?,
                                );
                            }
                        }
                        Ok(LogRow {
                            chain_id,
                            block_number: r.get::<i64, _>("block_number") as u64,
                            tx_hash: r
                                .get::<String, _>("tx_hash")
                                .parse()
                                .map_err(|_| StoreError::SchemaDrift("bad tx_hash hex".to_owned()))?,
                            log_index: r.get::<i64, _>("log_index") as u64,
                            address: r
                                .get::<String, _>("address")
                                .parse()
                                .map_err(|_| StoreError::SchemaDrift("bad address hex".to_owned()))?,
                            topics,
                            filter_key: filter_key.to_vec(),
                            raw: r.get("raw"),
                        })
                    })
                    .collect::<Result<Vec<_>, StoreError>>()?
            }
            Self::Postgres(p) => {
                let rows = sqlx::query(&format!(
                    "SELECT {SELECT} WHERE l.chain_id = $1 AND l.filter_key = $2 AND l.block_number BETWEEN $3 AND $4 \
                     ORDER BY l.block_number, h_tx.hash, l.log_index"
                ))
                .bind(chain_id)
                .bind(filter_key)
                .bind(from as i64)
                .bind(to as i64)
                .fetch_all(p)
                .await
                .map_err(StoreError::classify)?;
                rows.into_iter()
                    .map(|r| {
                        let mut topics = Vec::new();
                        for col in ["topic0", "topic1", "topic2", "topic3"] {
                            if let Some(t) = r.get::<Option<String>, _>(col) {
                                topics.push(
                                    t.parse()
                                        .map_err(|_| StoreError::SchemaDrift(format!("bad topic hex in {col}")))?,
                                );
                            }
                        }
                        Ok(LogRow {
                            chain_id,
                            block_number: r.get::<i64, _>("block_number") as u64,
                            tx_hash: r
                                .get::<String, _>("tx_hash")
                                .parse()
                                .map_err(|_| StoreError::SchemaDrift("bad tx_hash hex".to_owned()))?,
                            log_index: r.get::<i64, _>("log_index") as u64,
                            address: r
                                .get::<String, _>("address")
                                .parse()
                                .map_err(|_| StoreError::SchemaDrift("bad address hex".to_owned()))?,
                            topics,
                            filter_key: filter_key.to_vec(),
                            raw: r.get("raw"),
                        })
                    })
                    .collect::<Result<Vec<_>, StoreError>>()?
            }
        };

        Ok(rows)
    }

    /// Insert every trace in `rows`, interning their tx hash/from/to
    /// addresses first.
    pub(crate) async fn bulk_insert_traces(&self, rows: &[TraceRow]) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }

        struct Resolved<'a> {
            row: &'a TraceRow,
            tx_hash_id: Option<i64>,
            from_id: Option<i64>,
            to_id: Option<i64>,
        }
        let mut resolved = Vec::with_capacity(rows.len());
        for row in rows {
            let tx_hash_id = match row.tx_hash {
                Some(h) => Some(self.intern_hash(&h.to_string()).await?),
                None => None,
            };
            let from_id = match row.from_address {
                Some(a) => Some(self.intern_hash(&a.to_string()).await?),
                None => None,
            };
            let to_id = match row.to_address {
                Some(a) => Some(self.intern_hash(&a.to_string()).await?),
                None => None,
            };
            resolved.push(Resolved { row, tx_hash_id, from_id, to_id });
        }

        match self {
            Self::Sqlite(p) => {
                let mut tx = p.begin().await.map_err(StoreError::classify)?;
                let mut builder: QueryBuilder<'_, sqlx::Sqlite> = QueryBuilder::new(
                    "INSERT INTO trace(chain_id, block_number, tx_hash_id, from_address_id, to_address_id, filter_key, raw) ",
                );
                builder.push_values(&resolved, |mut b, r| {
                    b.push_bind(r.row.chain_id)
                        .push_bind(r.row.block_number as i64)
                        .push_bind(r.tx_hash_id)
                        .push_bind(r.from_id)
                        .push_bind(r.to_id)
                        .push_bind(r.row.filter_key.clone())
                        .push_bind(r.row.raw.clone());
                });
                builder.build().execute(&mut *tx).await.map_err(StoreError::classify)?;
                tx.commit().await.map_err(StoreError::classify)?;
            }
            Self::Postgres(p) => {
                let mut tx = p.begin().await.map_err(StoreError::classify)?;
                let mut builder: QueryBuilder<'_, sqlx::Postgres> = QueryBuilder::new(
                    "INSERT INTO trace(chain_id, block_number, tx_hash_id, from_address_id, to_address_id, filter_key, raw) ",
                );
                builder.push_values(&resolved, |mut b, r| {
                    b.push_bind(r.row.chain_id)
                        .push_bind(r.row.block_number as i64)
                        .push_bind(r.tx_hash_id)
                        .push_bind(r.from_id)
                        .push_bind(r.to_id)
                        .push_bind(r.row.filter_key.clone())
                        .push_bind(r.row.raw.clone());
                });
                builder.build().execute(&mut *tx).await.map_err(StoreError::classify)?;
                tx.commit().await.map_err(StoreError::classify)?;
            }
        }
        Ok(())
    }

    /// Every persisted trace matching `filter_key` in `[from, to]`, in
    /// block order.
    pub(crate) async fn select_traces_by_filter_key(
        &self,
        chain_id: i64,
        filter_key: &[u8],
        from: u64,
        to: u64,
    ) -> Result<Vec<TraceRow>, StoreError> {
        const SELECT: &str = "t.block_number, h_tx.hash AS tx_hash, h_from.hash AS from_address, h_to.hash AS to_address, t.raw \
             FROM trace t \
             LEFT JOIN hashes h_tx ON h_tx.dbid = t.tx_hash_id \
             LEFT JOIN hashes h_from ON h_from.dbid = t.from_address_id \
             LEFT JOIN hashes h_to ON h_to.dbid = t.to_address_id ";
        let rows = match self {
            Self::Sqlite(p) => sqlx::query(&format!(
                "SELECT {SELECT} WHERE t.chain_id = ? AND t.filter_key = ? AND t.block_number BETWEEN ? AND ? \
                     ORDER BY t.block_number, t.id"
            ))
            .bind(chain_id)
            .bind(filter_key)
            .bind(from as i64)
            .bind(to as i64)
            .fetch_all(p)
            .await
            .map_err(StoreError::classify)?
            .into_iter()
            .map(|r| TraceRow {
                chain_id,
                block_number: r.get::<i64, _>("block_number") as u64,
                tx_hash: r.get::<Option<String>, _>("tx_hash").and_then(|s| s.parse().ok()),
                from_address: r.get::<Option<String>, _>("from_address").and_then(|s| s.parse().ok()),
                to_address: r.get::<Option<String>, _>("to_address").and_then(|s| s.parse().ok()),
                filter_key: filter_key.to_vec(),
                raw: r.get("raw"),
            })
            .collect::<Vec<_>>(),
            Self::Postgres(p) => sqlx::query(&format!(
                "SELECT {SELECT} WHERE t.chain_id = $1 AND t.filter_key = $2 AND t.block_number BETWEEN $3 AND $4 \
                     ORDER BY t.block_number, t.id"
            ))
            .bind(chain_id)
            .bind(filter_key)
            .bind(from as i64)
            .bind(to as i64)
            .fetch_all(p)
            .await
            .map_err(StoreError::classify)?
            .into_iter()
            .map(|r| TraceRow {
                chain_id,
                block_number: r.get::<i64, _>("block_number") as u64,
                tx_hash: r.get::<Option<String>, _>("tx_hash").and_then(|s| s.parse().ok()),
                from_address: r.get::<Option<String>, _>("from_address").and_then(|s| s.parse().ok()),
                to_address: r.get::<Option<String>, _>("to_address").and_then(|s| s.parse().ok()),
                filter_key: filter_key.to_vec(),
                raw: r.get("raw"),
            })
            .collect::<Vec<_>>(),
        };

        Ok(rows)
    }

    pub(crate) async fn vacuum(&self) -> Result<(), StoreError> {
        if let Self::Sqlite(p) = self {
            sqlx::query("VACUUM").execute(p).await.map_err(StoreError::classify)?;
        }
        Ok(())
    }

    pub(crate) async fn info(&self) -> Result<StoreInfo, StoreError> {
        let count = |stmt: &'static str| async move {
            let row: (i64,) = match self {
                Self::Sqlite(p) => sqlx::query_as(stmt).fetch_one(p).await,
                Self::Postgres(p) => sqlx::query_as(stmt).fetch_one(p).await,
            }
            .map_err(StoreError::classify)?;
            Ok::<i64, StoreError>(row.0)
        };
        Ok(StoreInfo {
            chains: count("SELECT COUNT(*) FROM chain").await?,
            tokens: count("SELECT COUNT(*) FROM token").await?,
            prices: count("SELECT COUNT(*) FROM price").await?,
            log_caches: count("SELECT COUNT(*) FROM log_cache_info").await?,
            trace_caches: count("SELECT COUNT(*) FROM trace_cache_info").await?,
            logs: count("SELECT COUNT(*) FROM log").await?,
            traces: count("SELECT COUNT(*) FROM trace").await?,
        })
    }
}
