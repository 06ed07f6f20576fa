//! Concurrency substrate shared by the filter engine and the price
//! router: named bounded worker pools, single-flight deduplication of
//! identical in-flight work, TTL memoization, and per-block semaphores
//! that cap how many concurrent resolutions touch the same block.
//!
//! Grounded on `init4tech-signet-sdk/crates/sim/src/cache/store.rs`
//! (`Arc<RwLock<_>>` + `lru::LruCache` cache shape) and
//! `crates/rpc/src/interest/filters.rs` (`DashMap`-keyed registries with
//! `Arc`/`Weak` handles). The named-pool sizing itself mirrors
//! `original_source/y/_db/common.py::make_executor`, which hands out a
//! small thread pool for cheap lookups and a large one for RPC-bound
//! work.

#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    rustdoc::all
)]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![deny(unused_must_use, rust_2018_idioms)]

mod pools;
pub use pools::{Executors, PoolName};

mod single_flight;
pub use single_flight::SingleFlight;

mod memo;
pub use memo::Memo;

mod block_semaphore;
pub use block_semaphore::{BlockPermit, BlockSemaphore};
