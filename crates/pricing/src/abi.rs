//! Minimal Solidity interfaces for the view functions every strategy
//! calls. Kept in one place since most strategies only need one or two
//! selectors out of a much larger real ABI.

alloy::sol! {
    #[sol(rpc)]
    interface IErc20 {
        function decimals() external view returns (uint8);
        function symbol() external view returns (string);
        function totalSupply() external view returns (uint256);
    }

    #[sol(rpc)]
    interface IUniswapV2Pair {
        function token0() external view returns (address);
        function token1() external view returns (address);
        function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast);
    }

    #[sol(rpc)]
    interface IChainlinkAggregator {
        function latestAnswer() external view returns (int256);
        function latestTimestamp() external view returns (uint256);
        function decimals() external view returns (uint8);
    }

    #[sol(rpc)]
    interface IExchangeRateVault {
        // Covers cToken.exchangeRateStored(), aToken-style liquidityIndex
        // reads, and Iron Bank ibTokens, all of which expose a scaled
        // exchange rate against one underlying unit.
        function exchangeRateStored() external view returns (uint256);
        function underlying() external view returns (address);
    }

    #[sol(rpc)]
    interface IVaultShare {
        // Covers Yearn-like vaults (`pricePerShare`) and ERC4626 vaults
        // (`convertToAssets`), both of which reduce to "value of one
        // share in underlying units".
        function pricePerShare() external view returns (uint256);
        function token() external view returns (address);
    }

    #[sol(rpc)]
    interface IUniswapV2Factory {
        // Covers every Uniswap-V2-shaped factory (Sushi, Pancake-on-fork
        // chains, ...) used to discover pools for the generic-AMM price
        // fallback.
        event PairCreated(address indexed token0, address indexed token1, address pair, uint256 allPairsLength);
        function getPair(address tokenA, address tokenB) external view returns (address pair);
    }

    #[sol(rpc)]
    interface IVirtualPriceLp {
        // Covers Curve/Saddle/Ellipsis/Stargate/mStable-feeder-style
        // stableswap pools, which all expose a USD-scaled invariant
        // accessor for one LP share.
        function get_virtual_price() external view returns (uint256);
    }
}
