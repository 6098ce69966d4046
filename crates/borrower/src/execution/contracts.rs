//! Compile-time ABI definitions for on-chain contracts via Alloy `sol!`.

use alloy::sol;

// ---------------------------------------------------------------------------
// Aave V2 LendingPool
// ---------------------------------------------------------------------------

sol! {
    /// Aave V2 LendingPool: deposit, borrow, repay and account data.
    #[sol(rpc)]
    interface ILendingPool {
        /// Deposit `amount` of `asset`, crediting aTokens to `onBehalfOf`.
        function deposit(
            address asset,
            uint256 amount,
            address onBehalfOf,
            uint16 referralCode
        ) external;

        /// Borrow `amount` of `asset` against the caller's collateral.
        function borrow(
            address asset,
            uint256 amount,
            uint256 interestRateMode,
            uint16 referralCode,
            address onBehalfOf
        ) external;

        /// Repay up to `amount` of `asset` debt held by `onBehalfOf`.
        function repay(
            address asset,
            uint256 amount,
            uint256 rateMode,
            address onBehalfOf
        ) external returns (uint256);

        /// Aggregated user position, denominated in ETH wei.
        function getUserAccountData(address user) external view returns (
            uint256 totalCollateralETH,
            uint256 totalDebtETH,
            uint256 availableBorrowsETH,
            uint256 currentLiquidationThreshold,
            uint256 ltv,
            uint256 healthFactor
        );
    }
}

sol! {
    /// Registry resolving the current LendingPool proxy for a market.
    #[sol(rpc)]
    interface ILendingPoolAddressesProvider {
        function getLendingPool() external view returns (address);
    }
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

sol! {
    #[sol(rpc)]
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
    }
}

sol! {
    /// Wrapped ether: `deposit()` mints WETH 1:1 for the attached value.
    #[sol(rpc)]
    interface IWETH {
        function deposit() external payable;
    }
}

// ---------------------------------------------------------------------------
// Chainlink Aggregator V3
// ---------------------------------------------------------------------------

sol! {
    #[sol(rpc)]
    interface IAggregatorV3 {
        function latestRoundData() external view returns (
            uint80 roundId,
            int256 answer,
            uint256 startedAt,
            uint256 updatedAt,
            uint80 answeredInRound
        );

        function decimals() external view returns (uint8);
    }
}
