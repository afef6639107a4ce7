//! Typed call bindings for the contracts the client talks to
//!
//! Only the entry points the client uses are declared. Return values are
//! named so decoded structs read naturally at call sites.

use alloy::sol;

sol! {
    interface IERC20 {
        function totalSupply() external view returns (uint256 supply);
        function balanceOf(address account) external view returns (uint256 balance);
        function allowance(address owner, address spender) external view returns (uint256 remaining);
        function approve(address spender, uint256 amount) external returns (bool success);
    }

    interface IUniswapV2Pair {
        function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast);
    }

    interface ISeigniorageOracle {
        function expectedPrice(address token, uint256 amountIn) external view returns (uint256 amountOut);
    }

    #[derive(Debug)]
    interface ITreasury {
        function getSeigniorageOraclePrice() external view returns (uint256 price);
        function getBondOraclePrice() external view returns (uint256 price);
        function nextEpochPoint() external view returns (uint256 point);
        function getPeriod() external view returns (uint256 period);
        function buyBonds(uint256 amount, uint256 targetPrice) external;
        function redeemBonds(uint256 amount) external;
    }

    interface IRewardPool {
        function earned(address account) external view returns (uint256 reward);
        function balanceOf(address account) external view returns (uint256 balance);
        function stake(uint256 amount) external;
        function withdraw(uint256 amount) external;
        function getReward() external;
        function exit() external;
    }

    /// Pools that take the chain's native coin as deposit
    interface IEthPool {
        function stake() external payable;
        function withdraw(uint256 amount) external;
    }

    interface IAcceleratorPool {
        function acceleratorEarned(address account) external view returns (uint256 reward);
        function balanceFBGOf(address account) external view returns (uint256 balance);
        function stakeFBG(uint256 amount) external;
        function withdrawFBG(uint256 amount) external;
    }

    /// First-generation boardroom
    interface IBoardroomV1 {
        function getShareOf(address account) external view returns (uint256 shares);
        function getCashEarningsOf(address account) external view returns (uint256 earnings);
        function stake(uint256 amount) external;
        function withdraw(uint256 amount) external;
        function claimDividends() external;
        function exit() external;
    }

    /// Second generation onwards
    interface IBoardroom {
        function balanceOf(address account) external view returns (uint256 balance);
        function earned(address account) external view returns (uint256 reward);
        function stake(uint256 amount) external;
        function withdraw(uint256 amount) external;
        function claimReward() external;
        function exit() external;
    }
}
