use async_trait::async_trait;
use ethers::types::{Address, H256, U256};
use serde::{Deserialize, Serialize};

use crate::error::SwapClientError;

pub mod eth;

pub type GatewayResult<T> = Result<T, SwapClientError>;

/// One past swap for an account, as the exchange reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRecord {
    pub amount_in: U256,
    pub amount_out: U256,
    pub timestamp: u64,
}

/// Every mutating call the client can submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Transfer { to: Address, amount: U256 },
    Approve { amount: U256 },
    Swap { amount: U256 },
    SetRate { rate: U256 },
    Withdraw,
    RewardTransfer { amount: U256 },
}

/// Seam between the synchronizer and the chain: wallet authorization, contract
/// reads, and the simulate/submit pair for mutations. Kept as a trait so tests
/// can stand in a mock.
#[async_trait]
pub trait SwapGateway: Send + Sync {
    fn grn_address(&self) -> Address;
    fn rwd_address(&self) -> Address;
    fn exchange_address(&self) -> Address;

    /// Already-authorized accounts, without prompting. Empty means none.
    async fn authorized_accounts(&self) -> GatewayResult<Vec<Address>>;
    /// Prompts the wallet for authorization. Empty means the user declined.
    async fn request_accounts(&self) -> GatewayResult<Vec<Address>>;

    async fn grn_balance(&self, owner: Address) -> GatewayResult<U256>;
    async fn rwd_balance(&self, owner: Address) -> GatewayResult<U256>;
    /// Spending permission `owner` has granted to the exchange, in GRN.
    async fn allowance(&self, owner: Address) -> GatewayResult<U256>;
    async fn swap_rate(&self) -> GatewayResult<U256>;
    async fn exchange_owner(&self) -> GatewayResult<Address>;
    async fn swap_history(&self, account: Address) -> GatewayResult<Vec<SwapRecord>>;
    async fn token_decimals(&self) -> GatewayResult<(u8, u8)>;

    /// Dry run of a mutation. Alters nothing on chain.
    async fn simulate(&self, mutation: Mutation) -> GatewayResult<()>;
    /// Sends the mutation and waits for on-chain inclusion.
    async fn submit(&self, mutation: Mutation) -> GatewayResult<H256>;
}
