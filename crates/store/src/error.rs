/// Errors surfaced by [`crate::Store`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The underlying `sqlx` call failed.
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    /// The database reported a lock conflict (`SQLITE_BUSY`, "database is
    /// locked", or a cross-transaction mix-up). Transient; callers should
    /// go through [`crate::retry_locked`] rather than match this directly.
    #[error("database locked: {0}")]
    Locked(String),
    /// `DB_PROVIDER=networked` was requested but no Postgres connection
    /// parameters were configured.
    #[error("DB_PROVIDER=networked requires DB_HOST/DB_USER/DB_PASSWORD/DB_DATABASE")]
    MissingPgConfig,
    /// A migration produced a schema that doesn't match what this build
    /// expects, most likely because an older or newer binary touched the
    /// same database file.
    #[error("schema mismatch: {0}")]
    SchemaDrift(String),
}

impl StoreError {
    /// Classify a raw `sqlx` error, promoting lock-contention errors to
    /// [`StoreError::Locked`] so [`crate::retry_locked`] can recognize
    /// them.
    ///
    /// Grounded on `y._db.decorators.retry_locked`, which retries only on
    /// "database is locked" and the Pony ORM cross-transaction-mix error.
    pub fn classify(e: sqlx::Error) -> Self {
        let msg = e.to_string();
        if msg.contains("database is locked")
            || msg.contains("SQLITE_BUSY")
            || msg.contains("different transactions")
        {
            Self::Locked(msg)
        } else {
            Self::Sqlx(e)
        }
    }

    /// Whether this error is the transient condition [`crate::retry_locked`]
    /// should retry, rather than a permanent failure.
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked(_))
    }
}
