//! Per-chain constants the price router needs before it ever makes an RPC
//! call: known stablecoins, each chain's wrapped-native-gas-coin token, the
//! allowlist of tokens exempt from the high-price sanity check, and the
//! hardcoded Chainlink feed map used as a fallback to the on-chain feed
//! registry.

#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    clippy::missing_const_for_fn,
    rustdoc::all
)]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![deny(unused_must_use, rust_2018_idioms)]

mod chains;
pub use chains::{mainnet, ChainConstants};

mod one_to_one;
pub use one_to_one::ONE_TO_ONE_PEGS;

use alloy::primitives::Address;
use oracle_types::Chain;

/// Placeholder address for the native token of the current chain. By
/// convention this is `0xEeee...eEe`, matching `oracle_types::EEE_ADDRESS`.
pub const NATIVE_TOKEN_ADDRESS: Address = oracle_types::EEE_ADDRESS;

/// Look up the constants table for a given chain.
///
/// Returns `None` for chains without a hardcoded table; such chains still
/// function, but lose the zero-RPC stablecoin short-circuit and the
/// hardcoded Chainlink feed fallback.
pub fn constants_for_chain(chain: Chain) -> Option<&'static ChainConstants> {
    match chain.id() {
        1 => Some(&mainnet::CONSTANTS),
        _ => None,
    }
}
