use ethers::contract::abigen;

// Both tokens expose the same ERC20 surface, so one binding covers GRN and RWD.
abigen!(
    Erc20Token,
    r#"[
        function balanceOf(address account) external view returns (uint256)
        function allowance(address owner, address spender) external view returns (uint256)
        function transfer(address to, uint256 amount) external returns (bool)
        function approve(address spender, uint256 amount) external returns (bool)
        function decimals() external view returns (uint8)
    ]"#
);

abigen!(
    GreenLoop,
    r#"[
        struct SwapEntry { uint256 grnAmount; uint256 rwdAmount; uint256 timestamp; }
        function owner() external view returns (address)
        function swapRate() external view returns (uint256)
        function getSwapHistory(address account) external view returns (SwapEntry[] memory)
        function swap(uint256 amountIn) external
        function setSwapRate(uint256 newRate) external
        function withdrawTokens() external
    ]"#
);
