/// Error type for [`crate`]'s environment-configuration loading. Any
/// instance of this error is fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Missing or non-unicode environment variable.
    #[error("missing or non-unicode environment variable: {0}")]
    Var(String),
    /// Error parsing an integer environment variable.
    #[error("failed to parse environment variable: {0}")]
    Parse(#[from] std::num::ParseIntError),
    /// Error parsing a URL environment variable.
    #[error("failed to parse URL: {0}")]
    Url(url::ParseError),
    /// `DB_PROVIDER` was set to something other than `embedded`/`networked`.
    #[error("unrecognized DB_PROVIDER: {0}")]
    UnknownDbProvider(String),
    /// `YPRICEAPI_SIGNER`/`YPRICEAPI_SIGNATURE` must be set together or
    /// not at all.
    #[error("YPRICEAPI_SIGNER and YPRICEAPI_SIGNATURE must be set together")]
    PartialSigner,
}

impl ConfigError {
    /// Build a missing-variable error.
    pub fn missing(key: &str) -> Self {
        Self::Var(key.to_owned())
    }
}
