//! Top-level runtime assembling the price oracle's subsystems —
//! storage, the filter engine, the RPC client, and the price router —
//! into one handle a binary can bootstrap from config and hold for its
//! lifetime.

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
pub use error::RuntimeError;

mod watch;
pub use watch::{LogWatch, TraceWatch};

mod runtime;
pub use runtime::Runtime;
