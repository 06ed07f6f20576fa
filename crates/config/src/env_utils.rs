use crate::ConfigError;
use alloy::primitives::Address;
use std::env;

/// Load a required string variable from the environment.
pub fn load_string(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::missing(key))
}

/// Load an optional string variable from the environment.
pub fn load_string_opt(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Load a required `u64` variable from the environment.
pub fn load_u64(key: &str) -> Result<u64, ConfigError> {
    load_string(key)?.parse::<u64>().map_err(Into::into)
}

/// Load an optional `u64` variable from the environment.
pub fn load_u64_opt(key: &str) -> Option<u64> {
    load_string_opt(key)?.parse().ok()
}

/// Load a required `Address` variable from the environment.
pub fn load_address(key: &str) -> Result<Address, ConfigError> {
    load_string(key)?.parse().map_err(|_| ConfigError::missing(key))
}

/// Load an optional boolean variable from the environment. Accepts
/// `"true"`/`"false"` case-insensitively, or `"1"`/`"0"`.
pub fn load_bool(key: &str) -> Option<bool> {
    match load_string_opt(key)?.to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}
