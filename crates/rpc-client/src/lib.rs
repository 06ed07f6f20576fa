//! A narrow, mockable seam between the filter engine/price router and
//! the EVM JSON-RPC methods they actually use: `eth_call`,
//! `eth_getLogs`, `eth_getCode`, `eth_getBlockByNumber`,
//! `eth_getStorageAt`, and `trace_filter`/`trace_block`.
//!
//! Grounded on the `async_trait` + narrow-surface-over-a-transport shape
//! of `init4tech-signet-sdk/crates/rpc/src/cache.rs` (`TxCache`), adapted
//! from a reqwest-forwarding client to an `alloy::providers::Provider`
//! wrapper, since here the transport genuinely is raw JSON-RPC rather
//! than a REST cache.

#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    rustdoc::all
)]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![deny(unused_must_use, rust_2018_idioms)]

mod error;
pub use error::RpcError;

mod client;
pub use client::RpcClient;

mod alloy_client;
pub use alloy_client::AlloyRpcClient;

mod mock;
pub use mock::MockRpcClient;
