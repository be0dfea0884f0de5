#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ethers::types::{Address, H256, U256};
use mockall::mock;
use tokio::sync::Notify;

use green_loop::gateway::{GatewayResult, Mutation, SwapGateway, SwapRecord};
use green_loop::notice::{NoticeLevel, NoticeSink};

pub fn addr(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

pub fn wad() -> U256 {
    U256::exp10(18)
}

pub fn addr_str(a: Address) -> String {
    format!("{:?}", a)
}

pub const GRN: u64 = 0x11;
pub const RWD: u64 = 0x22;
pub const EXCHANGE: u64 = 0x33;

mock! {
    pub Gateway {}

    #[async_trait]
    impl SwapGateway for Gateway {
        fn grn_address(&self) -> Address;
        fn rwd_address(&self) -> Address;
        fn exchange_address(&self) -> Address;
        async fn authorized_accounts(&self) -> GatewayResult<Vec<Address>>;
        async fn request_accounts(&self) -> GatewayResult<Vec<Address>>;
        async fn grn_balance(&self, owner: Address) -> GatewayResult<U256>;
        async fn rwd_balance(&self, owner: Address) -> GatewayResult<U256>;
        async fn allowance(&self, owner: Address) -> GatewayResult<U256>;
        async fn swap_rate(&self) -> GatewayResult<U256>;
        async fn exchange_owner(&self) -> GatewayResult<Address>;
        async fn swap_history(&self, account: Address) -> GatewayResult<Vec<SwapRecord>>;
        async fn token_decimals(&self) -> GatewayResult<(u8, u8)>;
        async fn simulate(&self, mutation: Mutation) -> GatewayResult<()>;
        async fn submit(&self, mutation: Mutation) -> GatewayResult<H256>;
    }
}

/// Wires up the contract address getters every refresh checks.
pub fn expect_addresses(mock: &mut MockGateway) {
    mock.expect_grn_address().return_const(addr(GRN));
    mock.expect_rwd_address().return_const(addr(RWD));
    mock.expect_exchange_address().return_const(addr(EXCHANGE));
}

/// Expectations for the full refresh that follows session adoption. Values
/// are benign defaults; override by adding narrower expectations first.
pub fn expect_full_refresh(mock: &mut MockGateway, account: Address, owner: Address) {
    mock.expect_grn_balance()
        .returning(|_| Ok(U256::zero()));
    mock.expect_rwd_balance()
        .returning(|_| Ok(U256::zero()));
    mock.expect_exchange_owner()
        .returning(move || Ok(owner));
    mock.expect_swap_history().returning(|_| Ok(vec![]));
    mock.expect_allowance().returning(|_| Ok(U256::zero()));
    mock.expect_swap_rate().returning(|| Ok(U256::zero()));
    mock.expect_token_decimals().returning(|| Ok((18, 18)));
    mock.expect_authorized_accounts()
        .returning(move || Ok(vec![account]));
}

/// Notice sink that records everything for assertions.
#[derive(Default, Clone)]
pub struct RecordingNotices {
    entries: Arc<Mutex<Vec<(NoticeLevel, String)>>>,
}

impl RecordingNotices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .any(|(_, m)| m.contains(needle))
    }

    pub fn errors(&self) -> usize {
        self.count_level(NoticeLevel::Error)
    }

    pub fn infos(&self) -> usize {
        self.count_level(NoticeLevel::Info)
    }

    fn count_level(&self, wanted: NoticeLevel) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(level, _)| *level == wanted)
            .count()
    }
}

impl NoticeSink for RecordingNotices {
    fn notify(&self, level: NoticeLevel, message: &str) {
        self.entries.lock().unwrap().push((level, message.to_string()));
    }
}

/// Hand-rolled gateway for interleaving tests, where a mock cannot park a
/// call mid-flight. Optional gates block the second-and-later history queries
/// and every simulation until notified.
pub struct StubGateway {
    pub accounts: Vec<Address>,
    pub grn_balance: U256,
    pub rwd_balance: U256,
    pub allowance: U256,
    pub rate: U256,
    pub owner: Address,
    pub history: Vec<SwapRecord>,
    pub history_gate: Option<Arc<Notify>>,
    pub simulate_gate: Option<Arc<Notify>>,
    pub history_calls: AtomicUsize,
}

impl Default for StubGateway {
    fn default() -> Self {
        Self {
            accounts: vec![],
            grn_balance: U256::zero(),
            rwd_balance: U256::zero(),
            allowance: U256::zero(),
            rate: U256::zero(),
            owner: Address::zero(),
            history: vec![],
            history_gate: None,
            simulate_gate: None,
            history_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SwapGateway for StubGateway {
    fn grn_address(&self) -> Address {
        addr(GRN)
    }
    fn rwd_address(&self) -> Address {
        addr(RWD)
    }
    fn exchange_address(&self) -> Address {
        addr(EXCHANGE)
    }
    async fn authorized_accounts(&self) -> GatewayResult<Vec<Address>> {
        Ok(self.accounts.clone())
    }
    async fn request_accounts(&self) -> GatewayResult<Vec<Address>> {
        Ok(self.accounts.clone())
    }
    async fn grn_balance(&self, _owner: Address) -> GatewayResult<U256> {
        Ok(self.grn_balance)
    }
    async fn rwd_balance(&self, _owner: Address) -> GatewayResult<U256> {
        Ok(self.rwd_balance)
    }
    async fn allowance(&self, _owner: Address) -> GatewayResult<U256> {
        Ok(self.allowance)
    }
    async fn swap_rate(&self) -> GatewayResult<U256> {
        Ok(self.rate)
    }
    async fn exchange_owner(&self) -> GatewayResult<Address> {
        Ok(self.owner)
    }
    async fn swap_history(&self, _account: Address) -> GatewayResult<Vec<SwapRecord>> {
        let call = self.history_calls.fetch_add(1, Ordering::SeqCst);
        if call > 0 {
            if let Some(gate) = &self.history_gate {
                gate.notified().await;
            }
        }
        Ok(self.history.clone())
    }
    async fn token_decimals(&self) -> GatewayResult<(u8, u8)> {
        Ok((18, 18))
    }
    async fn simulate(&self, _mutation: Mutation) -> GatewayResult<()> {
        if let Some(gate) = &self.simulate_gate {
            gate.notified().await;
        }
        Ok(())
    }
    async fn submit(&self, _mutation: Mutation) -> GatewayResult<H256> {
        Ok(H256::from_low_u64_be(0xfeed))
    }
}
