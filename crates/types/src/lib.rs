//! Domain types shared across the price oracle core: chain/block/token
//! identity, USD prices, pricing buckets, and router options.

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

mod price;
pub use price::UsdPrice;

mod bucket;
pub use bucket::Bucket;

mod token;
pub use token::{Chain, TokenKey, TokenMeta};

mod opts;
pub use opts::GetPriceOpts;

mod error;
pub use error::PriceError;

/// The pseudo-address used by ERC-20-only APIs to denote the chain's native
/// asset. By convention this is `0xEeee...eEe`.
pub const EEE_ADDRESS: alloy::primitives::Address = alloy::primitives::Address::repeat_byte(0xee);

/// Maximum nesting depth `PriceRouter::get_price` will follow through
/// composite-token unwraps before giving up and returning `None`.
pub const MAX_RECURSION_DEPTH: u8 = 10;

/// A block number on the configured chain.
pub type BlockNumber = u64;
