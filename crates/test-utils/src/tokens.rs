//! Well-known mainnet tokens, re-exported for tests that want a
//! recognizable stable, a wrapped-native, and a Chainlink-fed asset
//! without reaching into `oracle-constants` themselves.

pub use oracle_constants::mainnet::{DAI, LINK, USDC, USDT, WBTC, WETH};
