use crate::{env_utils, ConfigError};

/// Which storage backend the `Store` binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DbProvider {
    /// The embedded, file-backed SQLite database. The default.
    #[default]
    Embedded,
    /// A networked Postgres database.
    Networked,
}

impl DbProvider {
    /// Load `DB_PROVIDER` from the environment, defaulting to `Embedded`.
    pub fn from_env() -> Result<Self, ConfigError> {
        match env_utils::load_string_opt("DB_PROVIDER").as_deref() {
            None => Ok(Self::Embedded),
            Some("embedded") => Ok(Self::Embedded),
            Some("networked") => Ok(Self::Networked),
            Some(other) => Err(ConfigError::UnknownDbProvider(other.to_owned())),
        }
    }
}
