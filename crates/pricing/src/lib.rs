//! Dispatches `get_price` requests to the bucket-specific strategy that
//! prices a token, memoizing resolved prices and persisting both the
//! detected bucket and the resolved price through `oracle_store`.

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

mod abi;
mod contract;

mod error;
pub use error::RouterError;

mod recursion;
pub use recursion::RecursionGuard;

mod strategy;
pub use strategy::PriceStrategy;

mod strategies;

mod pair_registry;
pub use pair_registry::{PairRegistry, Pool};

mod router;
pub use router::{Context, PriceRouter};
