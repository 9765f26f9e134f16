//! Async facade over a shared ledger
//!
//! Wraps the ledger in a `tokio` read-write lock and exposes the request
//! surface callers use. Mining is split into three phases so the nonce
//! search never holds the lock: prepare under the write lock, search on
//! a blocking thread, commit under the write lock again with a tip
//! check. One mining attempt runs at a time; a chain replacement fires
//! the attempt's cancel token so the search stops instead of producing
//! an orphan.

use crate::block::Block;
use crate::config::LedgerConfig;
use crate::contract::{ContractAction, ContractId, ContractTerms};
use crate::crypto::{Address, PublicKeyBytes};
use crate::error::LedgerError;
use crate::ledger::{Ledger, LedgerStats, MiningJob, MiningOutcome, SyncOutcome};
use crate::miner::{self, CancelToken};
use crate::transaction::{Amount, Transaction};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

#[derive(Clone)]
pub struct LedgerNode {
    pub ledger: Arc<RwLock<Ledger>>,
    is_mining: Arc<AtomicBool>,
    mining_cancel: Arc<RwLock<Option<CancelToken>>>,
}

impl LedgerNode {
    pub fn new(config: &LedgerConfig) -> Self {
        Self::with_ledger(Ledger::new(config))
    }

    /// Wrap an already-built ledger, for callers that picked their own
    /// policies.
    pub fn with_ledger(ledger: Ledger) -> Self {
        LedgerNode {
            ledger: Arc::new(RwLock::new(ledger)),
            is_mining: Arc::new(AtomicBool::new(false)),
            mining_cancel: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn submit_transaction(&self, tx: Transaction) -> Result<(), LedgerError> {
        self.ledger.write().await.admit_transaction(tx)
    }

    /// Mine the pending pool into a block, off the request path.
    ///
    /// Only one attempt may be in flight; a second caller gets
    /// [`LedgerError::MiningInProgress`] instead of queueing.
    pub async fn request_mining(
        &self,
        reward_address: Address,
    ) -> Result<MiningOutcome, LedgerError> {
        if self
            .is_mining
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(LedgerError::MiningInProgress);
        }

        let outcome = self.run_mining(reward_address).await;

        self.mining_cancel.write().await.take();
        self.is_mining.store(false, Ordering::SeqCst);
        outcome
    }

    async fn run_mining(&self, reward_address: Address) -> Result<MiningOutcome, LedgerError> {
        let job = self.ledger.write().await.prepare_block();
        let MiningJob { block, difficulty } = match job {
            Some(job) => job,
            None => return Ok(MiningOutcome::EmptyPool),
        };

        let cancel = CancelToken::new();
        *self.mining_cancel.write().await = Some(cancel.clone());

        let mined =
            tokio::task::spawn_blocking(move || miner::mine_block(block, difficulty, &cancel))
                .await
                .map_err(|e| {
                    warn!("mining task failed to join: {}", e);
                    LedgerError::MiningAborted
                })??;

        let block = self
            .ledger
            .write()
            .await
            .commit_block(mined, difficulty, reward_address)?;
        Ok(MiningOutcome::Mined(block))
    }

    pub async fn query_balance(&self, address: &Address) -> Amount {
        self.ledger.read().await.balance_of(address)
    }

    /// Read-only snapshot of the chain.
    pub async fn query_chain(&self) -> Vec<Block> {
        self.ledger.read().await.chain.clone()
    }

    /// Offer an external chain. Adopting it cancels any in-flight mining
    /// attempt, whose block would no longer extend the tip.
    pub async fn submit_external_chain(&self, chain: Vec<Block>) -> SyncOutcome {
        let outcome = self.ledger.write().await.resolve_chain(chain);
        if outcome == SyncOutcome::Replaced {
            if let Some(cancel) = self.mining_cancel.read().await.as_ref() {
                cancel.cancel();
            }
        }
        outcome
    }

    pub async fn register_key(
        &self,
        address: Address,
        public_key: PublicKeyBytes,
    ) -> Result<(), LedgerError> {
        self.ledger.write().await.register_key(address, public_key)
    }

    pub async fn grant(&self, recipient: Address, amount: Amount) -> Result<(), LedgerError> {
        self.ledger.write().await.grant(recipient, amount)
    }

    pub async fn deploy_contract(
        &self,
        terms: ContractTerms,
        actions: Vec<ContractAction>,
    ) -> Result<ContractId, LedgerError> {
        self.ledger.write().await.deploy_contract(terms, actions)
    }

    pub async fn evaluate_contracts(&self) -> Vec<ContractId> {
        self.ledger.write().await.evaluate_contracts()
    }

    pub async fn stats(&self) -> LedgerStats {
        self.ledger.read().await.stats()
    }
}
