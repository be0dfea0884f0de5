use std::sync::Arc;

use async_trait::async_trait;
use ethers::{
    abi::Detokenize,
    contract::{ContractCall, ContractError},
    middleware::SignerMiddleware,
    providers::{Http, Provider},
    signers::{LocalWallet, Signer},
    types::{Address, H256, U256, U64},
};
use log::debug;

use crate::abi::{Erc20Token, GreenLoop};
use crate::config::Env;
use crate::error::{classify_failure, revert_reason, FailureCode, SwapClientError};

use super::{GatewayResult, Mutation, SwapGateway, SwapRecord};

type Client = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Production gateway over an HTTP provider and a local signing key. The
/// signer plays the role of the wallet integration: its single key is the one
/// pre-authorized account.
pub struct EthersGateway {
    client: Arc<Client>,
    grn: Erc20Token<Client>,
    rwd: Erc20Token<Client>,
    exchange: GreenLoop<Client>,
}

impl EthersGateway {
    pub fn new(env: &Env) -> anyhow::Result<Self> {
        let provider = Provider::<Http>::try_from(env.https_url.as_str())?;
        let wallet = env
            .private_key
            .parse::<LocalWallet>()?
            .with_chain_id(env.chain_id);
        let client = Arc::new(SignerMiddleware::new(provider, wallet));
        Ok(Self {
            grn: Erc20Token::new(env.grn_token, client.clone()),
            rwd: Erc20Token::new(env.rwd_token, client.clone()),
            exchange: GreenLoop::new(env.exchange, client.clone()),
            client,
        })
    }

    async fn send<D: Detokenize>(&self, call: ContractCall<Client, D>) -> GatewayResult<H256> {
        let pending = call.send().await.map_err(submission_error)?;
        let receipt = pending.await.map_err(|e| SwapClientError::Submission {
            code: FailureCode::Other,
            message: e.to_string(),
        })?;
        match receipt {
            Some(r) if r.status == Some(U64::from(1)) => {
                debug!("transaction {:#x} confirmed in block {:?}", r.transaction_hash, r.block_number);
                Ok(r.transaction_hash)
            }
            Some(r) => Err(SwapClientError::Submission {
                code: FailureCode::ExecutionReverted,
                message: format!("transaction {:#x} reverted on-chain", r.transaction_hash),
            }),
            None => Err(SwapClientError::Submission {
                code: FailureCode::Other,
                message: "transaction was dropped before inclusion".to_string(),
            }),
        }
    }
}

fn query_error(err: ContractError<Client>) -> SwapClientError {
    SwapClientError::Query(err.to_string())
}

fn submission_error(err: ContractError<Client>) -> SwapClientError {
    let message = revert_reason(&err);
    SwapClientError::Submission {
        code: classify_failure(&message),
        message,
    }
}

#[async_trait]
impl SwapGateway for EthersGateway {
    fn grn_address(&self) -> Address {
        self.grn.address()
    }

    fn rwd_address(&self) -> Address {
        self.rwd.address()
    }

    fn exchange_address(&self) -> Address {
        self.exchange.address()
    }

    async fn authorized_accounts(&self) -> GatewayResult<Vec<Address>> {
        // A local key is authorized by construction.
        Ok(vec![self.client.signer().address()])
    }

    async fn request_accounts(&self) -> GatewayResult<Vec<Address>> {
        // No prompt to raise for a local key; same answer as the silent query.
        Ok(vec![self.client.signer().address()])
    }

    async fn grn_balance(&self, owner: Address) -> GatewayResult<U256> {
        self.grn.balance_of(owner).call().await.map_err(query_error)
    }

    async fn rwd_balance(&self, owner: Address) -> GatewayResult<U256> {
        self.rwd.balance_of(owner).call().await.map_err(query_error)
    }

    async fn allowance(&self, owner: Address) -> GatewayResult<U256> {
        self.grn
            .allowance(owner, self.exchange_address())
            .call()
            .await
            .map_err(query_error)
    }

    async fn swap_rate(&self) -> GatewayResult<U256> {
        self.exchange.swap_rate().call().await.map_err(query_error)
    }

    async fn exchange_owner(&self) -> GatewayResult<Address> {
        self.exchange.owner().call().await.map_err(query_error)
    }

    async fn swap_history(&self, account: Address) -> GatewayResult<Vec<SwapRecord>> {
        let entries = self
            .exchange
            .get_swap_history(account)
            .call()
            .await
            .map_err(query_error)?;
        Ok(entries
            .into_iter()
            .map(|e| SwapRecord {
                amount_in: e.0,
                amount_out: e.1,
                timestamp: e.2.low_u64(),
            })
            .collect())
    }

    async fn token_decimals(&self) -> GatewayResult<(u8, u8)> {
        let grn = self.grn.decimals().call().await.map_err(query_error)?;
        let rwd = self.rwd.decimals().call().await.map_err(query_error)?;
        Ok((grn, rwd))
    }

    async fn simulate(&self, mutation: Mutation) -> GatewayResult<()> {
        let result = match mutation {
            Mutation::Transfer { to, amount } => {
                self.grn.transfer(to, amount).call().await.map(|_| ())
            }
            Mutation::Approve { amount } => self
                .grn
                .approve(self.exchange_address(), amount)
                .call()
                .await
                .map(|_| ()),
            Mutation::Swap { amount } => self.exchange.swap(amount).call().await.map(|_| ()),
            Mutation::SetRate { rate } => {
                self.exchange.set_swap_rate(rate).call().await.map(|_| ())
            }
            Mutation::Withdraw => self.exchange.withdraw_tokens().call().await.map(|_| ()),
            Mutation::RewardTransfer { amount } => self
                .rwd
                .transfer(self.exchange_address(), amount)
                .call()
                .await
                .map(|_| ()),
        };
        result.map_err(|e| SwapClientError::Simulation(revert_reason(&e)))
    }

    async fn submit(&self, mutation: Mutation) -> GatewayResult<H256> {
        match mutation {
            Mutation::Transfer { to, amount } => self.send(self.grn.transfer(to, amount)).await,
            Mutation::Approve { amount } => {
                self.send(self.grn.approve(self.exchange_address(), amount)).await
            }
            Mutation::Swap { amount } => self.send(self.exchange.swap(amount)).await,
            Mutation::SetRate { rate } => self.send(self.exchange.set_swap_rate(rate)).await,
            Mutation::Withdraw => self.send(self.exchange.withdraw_tokens()).await,
            Mutation::RewardTransfer { amount } => {
                self.send(self.rwd.transfer(self.exchange_address(), amount)).await
            }
        }
    }
}
