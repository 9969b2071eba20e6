//! Staking session orchestration.
//!
//! [`StakingService`] owns one wallet session and the contract bindings built
//! for it. Reads may run concurrently. Writes are serialised: while one
//! stake/withdraw/registration is in flight every other write fails with
//! [`StakingError::WriteInProgress`].

use futures::future::try_join;
use std::{
    cmp::Ordering,
    future::Future,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering},
        Arc,
    },
};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use nolan_common::{
    ClientConfig, FunctionCall, TransactionOutcome, TransactionStatus, ViewClient, WalletSession,
};

use crate::{
    amount::FixedPointAmount,
    contracts::{StakingContract, StorageBalance, TokenContract},
    snapshot::StakingSnapshot,
    Result, StakingError,
};

/// Observable state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Connecting,
    Ready,
    /// Ready, with at least one read in flight
    Reading,
    /// Ready, with a write in flight
    Writing,
    Disconnected,
}

/// Snapshot and reward rate fetched together.
#[derive(Debug, Clone, PartialEq)]
pub struct Overview {
    pub snapshot: StakingSnapshot,
    pub reward_per_hour: f64,
}

#[derive(Clone)]
struct Session {
    account_id: String,
    staking: StakingContract,
    token: TokenContract,
    staking_scale: u32,
    token_scale: u32,
}

/// Last snapshot fetched for the session's own account.
///
/// `generation` advances whenever a write settles. A read only caches its
/// result if the generation is unchanged since the read was issued.
#[derive(Default)]
struct SnapshotCache {
    generation: u64,
    snapshot: Option<StakingSnapshot>,
}

impl SnapshotCache {
    fn invalidate(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.snapshot = None;
    }
}

enum Phase {
    Uninitialized,
    Connecting,
    Ready(Session),
    Disconnected,
}

pub struct StakingService {
    config: ClientConfig,
    view: Arc<dyn ViewClient>,
    wallet: Arc<dyn WalletSession>,
    phase: RwLock<Phase>,
    snapshot_cache: RwLock<SnapshotCache>,
    reads_in_flight: AtomicUsize,
    write_in_flight: AtomicBool,
}

struct ReadGuard<'a>(&'a AtomicUsize);

impl<'a> ReadGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, AtomicOrdering::AcqRel);
        Self(counter)
    }
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, AtomicOrdering::AcqRel);
    }
}

struct WriteGuard<'a>(&'a AtomicBool);

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, AtomicOrdering::Release);
    }
}

impl StakingService {
    pub fn new(
        config: ClientConfig,
        view: Arc<dyn ViewClient>,
        wallet: Arc<dyn WalletSession>,
    ) -> Self {
        Self {
            config,
            view,
            wallet,
            phase: RwLock::new(Phase::Uninitialized),
            snapshot_cache: RwLock::new(SnapshotCache::default()),
            reads_in_flight: AtomicUsize::new(0),
            write_in_flight: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn state(&self) -> SessionState {
        match &*self.phase.read().await {
            Phase::Uninitialized => SessionState::Uninitialized,
            Phase::Connecting => SessionState::Connecting,
            Phase::Disconnected => SessionState::Disconnected,
            Phase::Ready(_) => {
                if self.write_in_flight.load(AtomicOrdering::Acquire) {
                    SessionState::Writing
                } else if self.reads_in_flight.load(AtomicOrdering::Acquire) > 0 {
                    SessionState::Reading
                } else {
                    SessionState::Ready
                }
            }
        }
    }

    /// Account of the ready session.
    pub async fn account_id(&self) -> Option<String> {
        match &*self.phase.read().await {
            Phase::Ready(session) => Some(session.account_id.clone()),
            _ => None,
        }
    }

    /// Scales learned at connect time as `(staking, token)`.
    pub async fn scales(&self) -> Option<(u32, u32)> {
        match &*self.phase.read().await {
            Phase::Ready(session) => Some((session.staking_scale, session.token_scale)),
            _ => None,
        }
    }

    /// Starts the wallet's sign-in flow. Call `connect` once it completes.
    pub fn request_sign_in(&self) {
        info!("Requesting wallet sign-in");
        self.wallet.request_sign_in();
    }

    /// Builds the contract bindings for the signed-in account and learns both
    /// contracts' decimal scales.
    pub async fn connect(&self) -> Result<()> {
        let account_id = self
            .wallet
            .account_id()
            .ok_or_else(|| StakingError::NotReady("wallet has no signed-in account".into()))?;

        {
            let mut phase = self.phase.write().await;
            match &*phase {
                Phase::Uninitialized => *phase = Phase::Connecting,
                Phase::Ready(session) if session.account_id == account_id => return Ok(()),
                Phase::Ready(_) => *phase = Phase::Connecting,
                Phase::Connecting => {
                    return Err(StakingError::NotReady("connection already in progress".into()))
                }
                Phase::Disconnected => {
                    return Err(StakingError::NotReady("session has been disconnected".into()))
                }
            }
        }
        self.snapshot_cache.write().await.invalidate();

        info!("Connecting staking session for {}", account_id);

        let result = self.build_session(account_id).await;
        let mut phase = self.phase.write().await;
        if matches!(*phase, Phase::Disconnected) {
            return Err(StakingError::NotReady("session disconnected while connecting".into()));
        }

        match result {
            Ok(session) => {
                info!(
                    "Staking session ready for {} (staking scale {}, token scale {})",
                    session.account_id, session.staking_scale, session.token_scale
                );
                *phase = Phase::Ready(session);
                Ok(())
            }
            Err(e) => {
                error!("Failed to connect staking session: {}", e);
                *phase = Phase::Uninitialized;
                Err(e)
            }
        }
    }

    /// Ends the session. The service cannot be reconnected afterwards.
    pub async fn disconnect(&self) {
        *self.phase.write().await = Phase::Disconnected;
        self.snapshot_cache.write().await.invalidate();
        info!("Staking session disconnected");
    }

    pub async fn fetch_snapshot(&self, account_id: &str) -> Result<StakingSnapshot> {
        let session = self.session().await?;
        let generation = self.snapshot_cache.read().await.generation;
        let raw = self
            .read("has_stake", session.staking.has_stake(account_id))
            .await?;

        let snapshot = StakingSnapshot::parse_with_unit(
            &raw,
            session.staking_scale,
            self.config.contracts.timestamp_unit,
        )
        .map_err(|e| {
            warn!("Discarding has_stake response for {}: {}", account_id, e);
            e
        })?;

        if account_id == session.account_id {
            let mut cache = self.snapshot_cache.write().await;
            if cache.generation == generation {
                cache.snapshot = Some(snapshot.clone());
            } else {
                debug!("Not caching snapshot for {}: a write settled during the read", account_id);
            }
        }

        debug!("Fetched {} stakes for {}", snapshot.len(), account_id);
        Ok(snapshot)
    }

    pub async fn fetch_reward_per_hour(&self) -> Result<f64> {
        let session = self.session().await?;
        self.read("reward_per_hour", session.staking.reward_per_hour())
            .await
    }

    /// Fetches the snapshot and the reward rate concurrently.
    pub async fn fetch_overview(&self, account_id: &str) -> Result<Overview> {
        let (snapshot, reward_per_hour) =
            try_join(self.fetch_snapshot(account_id), self.fetch_reward_per_hour()).await?;
        Ok(Overview {
            snapshot,
            reward_per_hour,
        })
    }

    pub async fn fetch_storage_balance(&self, account_id: &str) -> Result<Option<StorageBalance>> {
        let session = self.session().await?;
        self.read(
            "storage_balance_of",
            session.token.storage_balance_of(account_id),
        )
        .await
    }

    pub async fn is_storage_registered(&self) -> Result<bool> {
        let session = self.session().await?;
        let balance = self.fetch_storage_balance(&session.account_id).await?;
        Ok(balance.map_or(false, |b| b.is_registered()))
    }

    pub async fn fetch_token_balance(&self, account_id: &str) -> Result<FixedPointAmount> {
        let session = self.session().await?;
        self.read(
            "ft_balance_of",
            session.token.ft_balance_of(account_id, session.token_scale),
        )
        .await
    }

    /// Validates a stake of `display_amount` tokens and returns the transfer
    /// call without submitting it.
    pub async fn plan_stake(&self, display_amount: &str) -> Result<FunctionCall> {
        let session = self.session().await?;
        self.stake_call(&session, display_amount).await
    }

    /// Validates a withdrawal from stake `index` and returns the call without
    /// submitting it.
    pub async fn plan_withdraw(&self, display_amount: &str, index: usize) -> Result<FunctionCall> {
        let session = self.session().await?;
        self.withdraw_call(&session, display_amount, index).await
    }

    pub async fn plan_register_storage(&self) -> Result<FunctionCall> {
        let session = self.session().await?;
        Ok(self.register_storage_call(&session))
    }

    /// Stakes `display_amount` tokens by transferring them to the staking
    /// contract with the configured message tag.
    pub async fn stake(&self, display_amount: &str) -> Result<TransactionOutcome> {
        let session = self.session().await?;
        let _write = self.begin_write()?;
        let call = self.stake_call(&session, display_amount).await?;
        self.submit(call).await
    }

    /// Withdraws `display_amount` from stake `index` of the last fetched snapshot.
    pub async fn withdraw_stake(&self, display_amount: &str, index: usize) -> Result<TransactionOutcome> {
        let session = self.session().await?;
        let call = self.withdraw_call(&session, display_amount, index).await?;
        let _write = self.begin_write()?;
        self.submit(call).await
    }

    /// Registers storage for the session account on the token contract.
    pub async fn register_storage(&self) -> Result<TransactionOutcome> {
        let session = self.session().await?;
        let _write = self.begin_write()?;
        let call = self.register_storage_call(&session);
        self.submit(call).await
    }

    async fn build_session(&self, account_id: String) -> Result<Session> {
        let contracts = &self.config.contracts;
        let staking = StakingContract::new(self.view.clone(), contracts.staking_contract.clone());
        let token = TokenContract::new(self.view.clone(), contracts.token_contract.clone());

        let staking_scale = async {
            match contracts.staking_decimals {
                Some(decimals) => Ok(decimals),
                None => self.read("decimals", staking.decimals()).await,
            }
        };
        let token_scale = async {
            match contracts.token_decimals {
                Some(decimals) => Ok(decimals),
                None => self
                    .read("ft_metadata", token.ft_metadata())
                    .await
                    .map(|metadata| u32::from(metadata.decimals)),
            }
        };
        let (staking_scale, token_scale) = try_join(staking_scale, token_scale).await?;

        Ok(Session {
            account_id,
            staking,
            token,
            staking_scale,
            token_scale,
        })
    }

    async fn session(&self) -> Result<Session> {
        let session = match &*self.phase.read().await {
            Phase::Ready(session) => session.clone(),
            Phase::Uninitialized => {
                return Err(StakingError::NotReady("session not connected".into()))
            }
            Phase::Connecting => {
                return Err(StakingError::NotReady("session is still connecting".into()))
            }
            Phase::Disconnected => {
                return Err(StakingError::NotReady("session has been disconnected".into()))
            }
        };

        if self.wallet.account_id().as_deref() != Some(session.account_id.as_str()) {
            warn!("Wallet session for {} ended", session.account_id);
            self.disconnect().await;
            return Err(StakingError::NotReady("wallet session ended".into()));
        }

        Ok(session)
    }

    async fn read<T, F>(&self, what: &str, request: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let _read = ReadGuard::new(&self.reads_in_flight);
        let timeout = self.config.session.read_timeout();

        match tokio::time::timeout(timeout, request).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!("{} failed: {}", what, e);
                Err(e)
            }
            Err(_) => {
                warn!("{} timed out after {:?}", what, timeout);
                Err(StakingError::UpstreamError(format!(
                    "{} timed out after {:?}",
                    what, timeout
                )))
            }
        }
    }

    fn begin_write(&self) -> Result<WriteGuard<'_>> {
        self.write_in_flight
            .compare_exchange(false, true, AtomicOrdering::AcqRel, AtomicOrdering::Acquire)
            .map_err(|_| StakingError::WriteInProgress)?;
        Ok(WriteGuard(&self.write_in_flight))
    }

    async fn stake_call(&self, session: &Session, display_amount: &str) -> Result<FunctionCall> {
        let amount = positive_amount(display_amount, session.token_scale)?;

        let storage = self
            .read(
                "storage_balance_of",
                session.token.storage_balance_of(&session.account_id),
            )
            .await?;
        if !storage.map_or(false, |balance| balance.is_registered()) {
            return Err(StakingError::StorageNotRegistered(session.account_id.clone()));
        }

        let session_config = &self.config.session;
        Ok(session.token.ft_transfer_call(
            session.staking.contract_id(),
            &amount,
            &self.config.contracts.stake_message,
            session_config.transfer_gas,
            session_config.transfer_deposit,
        ))
    }

    async fn withdraw_call(
        &self,
        session: &Session,
        display_amount: &str,
        index: usize,
    ) -> Result<FunctionCall> {
        let cache = self.snapshot_cache.read().await;
        let record = match cache.snapshot.as_ref() {
            Some(snapshot) => snapshot.stake(index)?,
            None => return Err(StakingError::InvalidIndex { index, len: 0 }),
        };

        let amount = positive_amount(display_amount, session.staking_scale)?;
        if record.claimable().cmp_display(display_amount)? == Ordering::Less {
            return Err(StakingError::AmountExceedsClaimable {
                requested: display_amount.trim().to_string(),
                claimable: record.claimable().to_string(),
            });
        }

        Ok(session
            .staking
            .withdraw_stake(&amount, index, self.config.session.withdraw_gas))
    }

    fn register_storage_call(&self, session: &Session) -> FunctionCall {
        session.token.storage_deposit(
            &session.account_id,
            self.config.session.storage_gas,
            self.config.session.storage_deposit,
        )
    }

    /// Hands `call` to the wallet. Never retried: a resubmitted transfer or
    /// withdrawal could be applied twice.
    async fn submit(&self, call: FunctionCall) -> Result<TransactionOutcome> {
        let timeout = self.config.session.write_timeout();
        let label = format!("{}.{}", call.receiver_id, call.method_name);
        info!("Submitting {} with args {}", label, call.args);

        let result = tokio::time::timeout(timeout, self.wallet.sign_and_submit(call)).await;

        // Whatever happened, the cached snapshot may no longer match the chain
        self.snapshot_cache.write().await.invalidate();

        let outcome = match result {
            Err(_) | Ok(Err(nolan_common::Error::Timeout(_))) => {
                warn!("{} not confirmed within {:?}", label, timeout);
                return Err(StakingError::Indeterminate(format!(
                    "{} not confirmed within {:?}; it may still land",
                    label, timeout
                )));
            }
            Ok(Err(e)) => {
                error!("{} was rejected: {}", label, e);
                return Err(StakingError::UpstreamError(e.to_string()));
            }
            Ok(Ok(outcome)) => outcome,
        };

        match &outcome.status {
            TransactionStatus::Succeeded => {
                info!("{} succeeded in {}", label, outcome.transaction_hash);
                Ok(outcome)
            }
            TransactionStatus::Failed(reason) => {
                error!("{} failed in {}: {}", label, outcome.transaction_hash, reason);
                Err(StakingError::UpstreamError(format!(
                    "transaction {} failed: {}",
                    outcome.transaction_hash, reason
                )))
            }
        }
    }
}

fn positive_amount(display_amount: &str, scale: u32) -> Result<FixedPointAmount> {
    let amount = FixedPointAmount::from_display(display_amount, scale)?;
    if amount.is_zero() {
        return Err(StakingError::InvalidAmount(format!(
            "{:?} must be greater than zero",
            display_amount
        )));
    }
    Ok(amount)
}
