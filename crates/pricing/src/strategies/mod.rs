mod stable;
pub use stable::Stable;

mod wrapped_native;
pub use wrapped_native::WrappedNative;

mod one_to_one;
pub use one_to_one::OneToOnePeg;

mod chainlink;
pub use chainlink::chainlink_price;

mod uniswap_v2;
pub use uniswap_v2::UniswapV2Lp;

mod exchange_rate_wrapped;
pub use exchange_rate_wrapped::ExchangeRateWrapped;

mod vault_share;
pub use vault_share::VaultShare;

mod virtual_price_lp;
pub use virtual_price_lp::VirtualPriceLp;

mod generic_amm;
pub use generic_amm::generic_amm_price;
