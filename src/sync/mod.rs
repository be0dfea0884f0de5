use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use ethers::types::{Address, H256, U256};
use log::{debug, error, info, warn};
use tokio::sync::{Mutex, RwLock};

use crate::error::{FailureCode, SwapClientError};
use crate::gateway::{Mutation, SwapGateway, SwapRecord};
use crate::notice::{NoticeLevel, NoticeSink};
use crate::units;

/// Balances looked up for an address other than the session account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueriedBalances {
    pub address: Address,
    pub grn: U256,
    pub rwd: U256,
}

/// Local mirror of the on-chain facts relevant to the current session. The
/// epoch counts session generations; refresh results tagged with an older
/// epoch are discarded instead of overwriting a newer session's snapshot.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub account: Option<Address>,
    pub is_owner: bool,
    pub grn_balance: U256,
    pub rwd_balance: U256,
    pub queried: Option<QueriedBalances>,
    pub allowance: U256,
    pub swap_rate: U256,
    pub history: Vec<SwapRecord>,
    pub epoch: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Transfer,
    Approve,
    Swap,
    SetRate,
    Withdraw,
    RewardTransfer,
}

impl OpKind {
    fn label(&self) -> &'static str {
        match self {
            OpKind::Transfer => "GRN transfer",
            OpKind::Approve => "Approval",
            OpKind::Swap => "Swap",
            OpKind::SetRate => "Swap rate update",
            OpKind::Withdraw => "Withdrawal",
            OpKind::RewardTransfer => "RWD transfer",
        }
    }
}

/// Lifecycle of one mutating operation. Terminal phases return to Idle when
/// the in-flight slot is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxPhase {
    Idle,
    Validating,
    Simulating,
    Submitted,
    Confirmed,
    Failed,
}

/// How a mutating operation ended, from the caller's point of view. Failures
/// are reported through the notice sink, never raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOutcome {
    Confirmed(H256),
    Rejected,
}

pub fn parse_address(input: &str) -> Option<Address> {
    let parsed = Address::from_str(input.trim()).ok()?;
    (!parsed.is_zero()).then_some(parsed)
}

/// Keeps the view state consistent with on-chain truth. Reads degrade to
/// zeroed snapshots on failure; every mutation runs the fixed
/// validate, simulate, submit, confirm, refresh protocol.
pub struct Synchronizer {
    gateway: Arc<dyn SwapGateway>,
    notices: Arc<dyn NoticeSink>,
    state: RwLock<ViewState>,
    inflight: Mutex<HashMap<OpKind, TxPhase>>,
}

impl Synchronizer {
    pub fn new(gateway: Arc<dyn SwapGateway>, notices: Arc<dyn NoticeSink>) -> Self {
        Self {
            gateway,
            notices,
            state: RwLock::new(ViewState::default()),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub async fn snapshot(&self) -> ViewState {
        self.state.read().await.clone()
    }

    pub async fn phase(&self, op: OpKind) -> TxPhase {
        self.inflight
            .lock()
            .await
            .get(&op)
            .copied()
            .unwrap_or(TxPhase::Idle)
    }

    // ---- session lifecycle ----

    /// Adopts an already-authorized account if one exists, without prompting.
    /// Errors are logged and treated as "no session".
    pub async fn establish_session(&self) {
        match self.gateway.authorized_accounts().await {
            Ok(accounts) => match accounts.first() {
                Some(account) => {
                    info!("restoring session for {:?}", account);
                    self.adopt_account(*account).await;
                }
                None => {
                    debug!("no pre-authorized account");
                    self.clear_session().await;
                }
            },
            Err(e) => {
                warn!("wallet query failed, treating as no session: {}", e);
                self.clear_session().await;
            }
        }
    }

    /// Explicitly asks the wallet for authorization.
    pub async fn request_session(&self) {
        match self.gateway.request_accounts().await {
            Ok(accounts) => match accounts.first() {
                Some(account) => {
                    self.adopt_account(*account).await;
                    self.notices.notify(NoticeLevel::Success, "Wallet connected");
                }
                None => self
                    .notices
                    .notify(NoticeLevel::Error, "No account was authorized"),
            },
            Err(e) => self.notices.notify(
                NoticeLevel::Error,
                &format!("Wallet connection failed: {}", e),
            ),
        }
    }

    /// Handler for external account-change notifications. The only path that
    /// can silently switch the active identity.
    pub async fn on_account_changed(&self, accounts: Vec<Address>) {
        match accounts.first() {
            Some(account) => {
                info!("active account switched to {:?}", account);
                self.adopt_account(*account).await;
            }
            None => {
                info!("wallet disconnected, clearing session");
                self.clear_session().await;
            }
        }
    }

    async fn adopt_account(&self, account: Address) {
        {
            let mut state = self.state.write().await;
            let epoch = state.epoch + 1;
            *state = ViewState {
                account: Some(account),
                epoch,
                ..ViewState::default()
            };
        }
        self.full_refresh(account).await;
    }

    async fn clear_session(&self) {
        let mut state = self.state.write().await;
        let epoch = state.epoch + 1;
        *state = ViewState {
            epoch,
            ..ViewState::default()
        };
    }

    async fn full_refresh(&self, account: Address) {
        self.refresh_session_balances().await;
        self.refresh_ownership().await;
        self.refresh_history().await;
        self.refresh_allowance().await;
        self.refresh_swap_rate().await;
        self.verify_decimals(account).await;
    }

    async fn verify_decimals(&self, account: Address) {
        match self.gateway.token_decimals().await {
            Ok((units::DECIMALS, units::DECIMALS)) => {}
            Ok((grn, rwd)) => warn!(
                "token decimals differ from the assumed {} (GRN={}, RWD={}); amounts shown to {:?} may be misscaled",
                units::DECIMALS, grn, rwd, account
            ),
            Err(e) => debug!("decimals check skipped: {}", e),
        }
    }

    // ---- read path ----

    async fn session_view(&self) -> (Option<Address>, u64) {
        let state = self.state.read().await;
        (state.account, state.epoch)
    }

    /// Applies a snapshot update only if the session epoch has not moved since
    /// the refresh was triggered.
    async fn commit<F>(&self, epoch: u64, apply: F) -> bool
    where
        F: FnOnce(&mut ViewState),
    {
        let mut state = self.state.write().await;
        if state.epoch != epoch {
            debug!("discarding stale refresh (epoch {} superseded by {})", epoch, state.epoch);
            return false;
        }
        apply(&mut state);
        true
    }

    fn token_addresses_valid(&self) -> bool {
        !self.gateway.grn_address().is_zero() && !self.gateway.rwd_address().is_zero()
    }

    /// Balances for an arbitrary address. When it is the session account the
    /// main snapshot is updated, otherwise the queried view. Fails closed on
    /// malformed input: zeroes without a network call.
    pub async fn refresh_balances(&self, address: &str) {
        let (account, epoch) = self.session_view().await;
        let target = match parse_address(address) {
            Some(target) if self.token_addresses_valid() => target,
            _ => {
                self.commit(epoch, |s| {
                    s.grn_balance = U256::zero();
                    s.rwd_balance = U256::zero();
                    s.queried = None;
                })
                .await;
                return;
            }
        };
        self.refresh_balances_for(target, account, epoch).await;
    }

    async fn refresh_session_balances(&self) {
        let (account, epoch) = self.session_view().await;
        let Some(account) = account else {
            self.commit(epoch, |s| {
                s.grn_balance = U256::zero();
                s.rwd_balance = U256::zero();
            })
            .await;
            return;
        };
        if !self.token_addresses_valid() {
            self.commit(epoch, |s| {
                s.grn_balance = U256::zero();
                s.rwd_balance = U256::zero();
            })
            .await;
            return;
        }
        self.refresh_balances_for(account, Some(account), epoch).await;
    }

    async fn refresh_balances_for(&self, target: Address, account: Option<Address>, epoch: u64) {
        let balances = match (
            self.gateway.grn_balance(target).await,
            self.gateway.rwd_balance(target).await,
        ) {
            (Ok(grn), Ok(rwd)) => Some((grn, rwd)),
            (grn, rwd) => {
                if let Err(e) = grn {
                    error!("GRN balance query failed for {:?}: {}", target, e);
                }
                if let Err(e) = rwd {
                    error!("RWD balance query failed for {:?}: {}", target, e);
                }
                None
            }
        };
        let (grn, rwd) = balances.unwrap_or_default();
        self.commit(epoch, |s| {
            if Some(target) == account {
                s.grn_balance = grn;
                s.rwd_balance = rwd;
            } else {
                s.queried = Some(QueriedBalances {
                    address: target,
                    grn,
                    rwd,
                });
            }
        })
        .await;
    }

    pub async fn refresh_allowance(&self) {
        let (account, epoch) = self.session_view().await;
        let valid = !self.gateway.grn_address().is_zero()
            && !self.gateway.exchange_address().is_zero();
        let Some(account) = account.filter(|_| valid) else {
            self.commit(epoch, |s| s.allowance = U256::zero()).await;
            return;
        };
        match self.gateway.allowance(account).await {
            Ok(allowance) => {
                self.commit(epoch, |s| s.allowance = allowance).await;
            }
            Err(e) => {
                error!("allowance refresh failed: {}", e);
                self.commit(epoch, |s| s.allowance = U256::zero()).await;
            }
        }
    }

    pub async fn refresh_swap_rate(&self) {
        let (_, epoch) = self.session_view().await;
        if self.gateway.exchange_address().is_zero() {
            self.commit(epoch, |s| s.swap_rate = U256::zero()).await;
            return;
        }
        match self.gateway.swap_rate().await {
            Ok(rate) => {
                self.commit(epoch, |s| s.swap_rate = rate).await;
            }
            Err(e) => {
                error!("swap rate refresh failed: {}", e);
                self.commit(epoch, |s| s.swap_rate = U256::zero()).await;
            }
        }
    }

    pub async fn refresh_ownership(&self) {
        let (account, epoch) = self.session_view().await;
        let valid = !self.gateway.exchange_address().is_zero();
        let Some(account) = account.filter(|_| valid) else {
            self.commit(epoch, |s| s.is_owner = false).await;
            return;
        };
        match self.gateway.exchange_owner().await {
            Ok(owner) => {
                self.commit(epoch, |s| s.is_owner = owner == account).await;
            }
            Err(e) => {
                error!("ownership check failed: {}", e);
                self.commit(epoch, |s| s.is_owner = false).await;
            }
        }
    }

    /// Full replace of the stored history, newest first. No delta fetching.
    pub async fn refresh_history(&self) {
        let (account, epoch) = self.session_view().await;
        let valid = !self.gateway.exchange_address().is_zero();
        let Some(account) = account.filter(|_| valid) else {
            self.commit(epoch, |s| s.history.clear()).await;
            return;
        };
        match self.gateway.swap_history(account).await {
            Ok(mut records) => {
                records.reverse();
                self.commit(epoch, |s| s.history = records).await;
            }
            Err(e) => {
                error!("swap history refresh failed: {}", e);
                self.commit(epoch, |s| s.history.clear()).await;
            }
        }
    }

    /// Expected RWD for a candidate GRN input at the last-known rate. Purely
    /// local; malformed or non-positive input yields zero.
    pub async fn estimate_reward(&self, amount: &str) -> U256 {
        let Some(amount) = units::parse_amount(amount) else {
            return U256::zero();
        };
        let rate = self.state.read().await.swap_rate;
        units::expected_output(amount, rate).unwrap_or_default()
    }

    // ---- mutation protocol ----

    pub async fn submit_transfer(&self, to: &str, amount: &str) -> TxOutcome {
        if !self.begin(OpKind::Transfer).await {
            return TxOutcome::Rejected;
        }
        let result: Result<H256, SwapClientError> = async {
            self.require_session().await?;
            let to = parse_address(to)
                .ok_or_else(|| SwapClientError::Validation("recipient address is not valid".into()))?;
            let amount = require_amount(amount, "transfer")?;
            self.run_mutation(OpKind::Transfer, Mutation::Transfer { to, amount })
                .await
        }
        .await;
        self.conclude(OpKind::Transfer, result).await
    }

    pub async fn submit_approve(&self, amount: &str) -> TxOutcome {
        if !self.begin(OpKind::Approve).await {
            return TxOutcome::Rejected;
        }
        let result: Result<H256, SwapClientError> = async {
            self.require_session().await?;
            self.require_exchange()?;
            let amount = require_amount(amount, "approval")?;
            self.run_mutation(OpKind::Approve, Mutation::Approve { amount })
                .await
        }
        .await;
        self.conclude(OpKind::Approve, result).await
    }

    pub async fn submit_swap(&self, amount: &str) -> TxOutcome {
        if !self.begin(OpKind::Swap).await {
            return TxOutcome::Rejected;
        }
        let result: Result<H256, SwapClientError> = async {
            self.require_session().await?;
            self.require_exchange()?;
            let amount = require_amount(amount, "swap")?;
            self.run_mutation(OpKind::Swap, Mutation::Swap { amount }).await
        }
        .await;
        self.conclude(OpKind::Swap, result).await
    }

    pub async fn submit_set_rate(&self, rate: &str) -> TxOutcome {
        if !self.begin(OpKind::SetRate).await {
            return TxOutcome::Rejected;
        }
        let result: Result<H256, SwapClientError> = async {
            self.require_owner().await?;
            self.require_exchange()?;
            let rate = units::parse_amount(rate)
                .ok_or_else(|| SwapClientError::Validation("swap rate must be positive".into()))?;
            self.run_mutation(OpKind::SetRate, Mutation::SetRate { rate })
                .await
        }
        .await;
        self.conclude(OpKind::SetRate, result).await
    }

    pub async fn submit_withdraw(&self) -> TxOutcome {
        if !self.begin(OpKind::Withdraw).await {
            return TxOutcome::Rejected;
        }
        let result: Result<H256, SwapClientError> = async {
            self.require_owner().await?;
            self.require_exchange()?;
            self.run_mutation(OpKind::Withdraw, Mutation::Withdraw).await
        }
        .await;
        self.conclude(OpKind::Withdraw, result).await
    }

    pub async fn submit_rwd_transfer(&self, amount: &str) -> TxOutcome {
        if !self.begin(OpKind::RewardTransfer).await {
            return TxOutcome::Rejected;
        }
        let result: Result<H256, SwapClientError> = async {
            self.require_owner().await?;
            self.require_exchange()?;
            let amount = require_amount(amount, "transfer")?;
            self.run_mutation(OpKind::RewardTransfer, Mutation::RewardTransfer { amount })
                .await
        }
        .await;
        self.conclude(OpKind::RewardTransfer, result).await
    }

    /// The shared tail of every mutating operation: optional extended
    /// pre-flight, dry run, submission, then the operation's refresh set.
    async fn run_mutation(&self, op: OpKind, mutation: Mutation) -> Result<H256, SwapClientError> {
        if let Mutation::Swap { amount } = &mutation {
            self.preflight_swap(*amount).await?;
        }
        self.set_phase(op, TxPhase::Simulating).await;
        self.gateway.simulate(mutation.clone()).await?;
        self.set_phase(op, TxPhase::Submitted).await;
        let hash = self.gateway.submit(mutation).await?;
        self.apply_refresh_set(op).await;
        Ok(hash)
    }

    /// Extended swap pre-flight. Re-fetches everything the check depends on;
    /// stale snapshots are never trusted here.
    async fn preflight_swap(&self, amount: U256) -> Result<(), SwapClientError> {
        let account = self
            .state
            .read()
            .await
            .account
            .ok_or_else(|| SwapClientError::Validation("connect a wallet first".into()))?;

        let balance = self.gateway.grn_balance(account).await?;
        if balance < amount {
            return Err(SwapClientError::Validation("insufficient GRN balance".into()));
        }

        let allowance = self.gateway.allowance(account).await?;
        if allowance < amount {
            return Err(SwapClientError::Validation(
                "insufficient allowance; approve the exchange first".into(),
            ));
        }

        let liquidity = self
            .gateway
            .rwd_balance(self.gateway.exchange_address())
            .await?;
        let rate = self.gateway.swap_rate().await?;
        let expected = units::expected_output(amount, rate)
            .ok_or_else(|| SwapClientError::Validation("swap amount too large".into()))?;
        if liquidity < expected {
            return Err(SwapClientError::Validation(
                "exchange lacks RWD liquidity for this swap".into(),
            ));
        }

        Ok(())
    }

    /// Targeted refreshes after a confirmed mutation. Failures here degrade
    /// snapshots but never fail the already-confirmed operation.
    async fn apply_refresh_set(&self, op: OpKind) {
        match op {
            OpKind::Swap => {
                self.refresh_session_balances().await;
                self.refresh_history().await;
                self.refresh_allowance().await;
            }
            OpKind::Approve => self.refresh_allowance().await,
            OpKind::SetRate => self.refresh_swap_rate().await,
            OpKind::Transfer | OpKind::Withdraw => self.refresh_session_balances().await,
            OpKind::RewardTransfer => {
                self.refresh_session_balances().await;
                // The exchange now holds the transferred RWD; reflect it in
                // the queried view.
                let (account, epoch) = self.session_view().await;
                self.refresh_balances_for(self.gateway.exchange_address(), account, epoch)
                    .await;
            }
        }
    }

    // ---- mutation plumbing ----

    async fn begin(&self, op: OpKind) -> bool {
        let mut inflight = self.inflight.lock().await;
        if inflight.contains_key(&op) {
            // A duplicate trigger is not a failure, just a bounce.
            self.notices.notify(
                NoticeLevel::Info,
                &format!("{} already in progress", op.label()),
            );
            return false;
        }
        inflight.insert(op, TxPhase::Validating);
        true
    }

    async fn set_phase(&self, op: OpKind, phase: TxPhase) {
        if let Some(current) = self.inflight.lock().await.get_mut(&op) {
            *current = phase;
        }
    }

    async fn conclude(&self, op: OpKind, result: Result<H256, SwapClientError>) -> TxOutcome {
        let outcome = match &result {
            Ok(hash) => {
                self.set_phase(op, TxPhase::Confirmed).await;
                self.notices.notify(
                    NoticeLevel::Success,
                    &format!("{} confirmed ({:#x})", op.label(), hash),
                );
                TxOutcome::Confirmed(*hash)
            }
            Err(e) => {
                self.set_phase(op, TxPhase::Failed).await;
                self.notices
                    .notify(NoticeLevel::Error, &failure_message(op.label(), e));
                TxOutcome::Rejected
            }
        };
        self.inflight.lock().await.remove(&op);
        outcome
    }

    async fn require_session(&self) -> Result<Address, SwapClientError> {
        self.state
            .read()
            .await
            .account
            .ok_or_else(|| SwapClientError::Validation("connect a wallet first".into()))
    }

    async fn require_owner(&self) -> Result<Address, SwapClientError> {
        let state = self.state.read().await;
        match state.account {
            Some(account) if state.is_owner => Ok(account),
            Some(_) => Err(SwapClientError::Validation(
                "only the contract owner can do this".into(),
            )),
            None => Err(SwapClientError::Validation("connect a wallet first".into())),
        }
    }

    fn require_exchange(&self) -> Result<(), SwapClientError> {
        if self.gateway.exchange_address().is_zero() {
            return Err(SwapClientError::Validation(
                "exchange contract address is not configured".into(),
            ));
        }
        Ok(())
    }
}

fn require_amount(input: &str, what: &str) -> Result<U256, SwapClientError> {
    units::parse_amount(input)
        .ok_or_else(|| SwapClientError::Validation(format!("{} amount must be positive", what)))
}

fn failure_message(label: &str, err: &SwapClientError) -> String {
    match err {
        SwapClientError::Validation(msg) => format!("{} rejected: {}", label, msg),
        SwapClientError::Query(msg) => {
            format!("{} aborted, a pre-flight read failed: {}", label, msg)
        }
        SwapClientError::Simulation(msg) => format!("{} cannot succeed: {}", label, msg),
        SwapClientError::Submission {
            code: FailureCode::InsufficientGasFunds,
            ..
        } => format!("{} failed: the account cannot cover gas fees", label),
        SwapClientError::Submission {
            code: FailureCode::ExecutionReverted,
            ..
        } => format!(
            "{} failed on-chain; re-check balances and allowance",
            label
        ),
        SwapClientError::Submission { message, .. } => format!("{} failed: {}", label, message),
        SwapClientError::Unknown(msg) => format!("{} failed: {}", label, msg),
    }
}
