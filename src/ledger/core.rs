use crate::block::{Block, BlockHash, GENESIS_PREVIOUS_HASH};
use crate::config::LedgerConfig;
use crate::contract::{Contract, ContractAction, ContractId, ContractStatus, ContractTerms};
use crate::crypto::{self, Address, PublicKeyBytes, UNSET_ADDRESS};
use crate::error::LedgerError;
use crate::ledger::state::BalanceSheet;
use crate::ledger::validation::is_valid_chain;
use crate::miner::{self, CancelToken};
use crate::policy::{DifficultyPolicy, FraudPolicy, ReactiveDifficulty, ThresholdFraudScreen};
use crate::transaction::{Amount, Transaction, TxId, TAX_POOL_ADDRESS};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// A screened candidate block plus the difficulty chosen for it.
///
/// Produced under the write lock by [`Ledger::prepare_block`]; the nonce
/// search then runs lock-free and [`Ledger::commit_block`] re-takes the
/// lock to append.
#[derive(Debug, Clone)]
pub struct MiningJob {
    pub block: Block,
    pub difficulty: u32,
}

/// Result of a mining request.
#[derive(Debug, Clone)]
pub enum MiningOutcome {
    Mined(Block),
    /// Nothing survived screening; no block was produced.
    EmptyPool,
}

/// Result of offering an external chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Candidate was valid and strictly longer; local chain replaced.
    Replaced,
    /// Local chain retained.
    Kept,
}

/// Read-only counters for logging and status reporting.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LedgerStats {
    pub chain_length: usize,
    pub difficulty: u32,
    pub pending_count: usize,
    pub blacklist_size: usize,
    pub energy_spent: u64,
    pub contracts_pending: usize,
    pub contracts_fulfilled: usize,
    pub contracts_expired: usize,
}

/// The ledger: chain, pending pool, balances, key registry, blacklist
/// and contracts, owned as one unit.
///
/// All mutating operations go through `&mut self`, so a single lock (or
/// single owner) around the ledger gives the whole-state mutual
/// exclusion the mining and sync paths rely on.
pub struct Ledger {
    pub chain: Vec<Block>,
    /// Admission-ordered transactions awaiting a block.
    pub pending: Vec<Transaction>,
    /// Difficulty the next block will be mined at.
    pub difficulty: u32,
    pub fee_rate: Amount,
    pub balances: BalanceSheet,
    pub blacklist: HashSet<Address>,
    pub keys: HashMap<Address, PublicKeyBytes>,
    pub contracts: Vec<Contract>,
    /// Cumulative mining effort, ten units per nonce tried.
    pub energy_spent: u64,
    next_contract_id: u64,
    base_reward: Amount,
    bonus_amount: Amount,
    bonus_period: u64,
    max_transaction_bytes: usize,
    difficulty_policy: Box<dyn DifficultyPolicy>,
    fraud_policy: Box<dyn FraudPolicy>,
}

impl Ledger {
    /// Ledger with the production policies: reactive difficulty and the
    /// amount-ceiling fraud screen.
    pub fn new(config: &LedgerConfig) -> Self {
        Self::with_policies(
            config,
            Box::new(ReactiveDifficulty),
            Box::new(ThresholdFraudScreen::new(Amount::from_num(
                config.suspicious_ceiling,
            ))),
        )
    }

    pub fn with_policies(
        config: &LedgerConfig,
        difficulty_policy: Box<dyn DifficultyPolicy>,
        fraud_policy: Box<dyn FraudPolicy>,
    ) -> Self {
        Ledger {
            chain: vec![Block::genesis()],
            pending: Vec::new(),
            difficulty: config.initial_difficulty,
            fee_rate: Amount::from_num(config.fee_rate),
            balances: BalanceSheet::new(),
            blacklist: HashSet::new(),
            keys: HashMap::new(),
            contracts: Vec::new(),
            energy_spent: 0,
            next_contract_id: 0,
            base_reward: Amount::from_num(config.base_reward),
            bonus_amount: Amount::from_num(config.bonus_amount),
            bonus_period: config.bonus_period,
            max_transaction_bytes: config.max_transaction_bytes,
            difficulty_policy,
            fraud_policy,
        }
    }

    /// Hash of the chain tip.
    pub fn latest_hash(&self) -> BlockHash {
        self.chain
            .last()
            .map(|block| block.hash)
            .unwrap_or(GENESIS_PREVIOUS_HASH)
    }

    // ------------------------------------------------------------------
    // Key registry
    // ------------------------------------------------------------------

    /// Associate a public key with its address. Reserved addresses have
    /// no key pair and cannot be claimed.
    pub fn register_key(
        &mut self,
        address: Address,
        public_key: PublicKeyBytes,
    ) -> Result<(), LedgerError> {
        if address == *TAX_POOL_ADDRESS || address == UNSET_ADDRESS {
            return Err(LedgerError::MalformedTransaction(
                "cannot register a key for a reserved address".to_string(),
            ));
        }
        self.keys.insert(address, public_key);
        Ok(())
    }

    pub fn lookup_key(&self, address: &Address) -> Option<&PublicKeyBytes> {
        self.keys.get(address)
    }

    // ------------------------------------------------------------------
    // Admission
    // ------------------------------------------------------------------

    /// Faucet mint: queue an unsigned reward crediting `recipient`. It
    /// settles like any other pending transaction at the next block.
    pub fn grant(&mut self, recipient: Address, amount: Amount) -> Result<(), LedgerError> {
        if amount <= Amount::ZERO {
            return Err(LedgerError::MalformedTransaction(format!(
                "grant amount must be positive, got {}",
                amount
            )));
        }
        self.pending.push(Transaction::reward(recipient, amount));
        Ok(())
    }

    /// Gate a caller-submitted transfer into the pending pool.
    ///
    /// Rejections leave the ledger untouched. On success the admission
    /// fee is fixed into the transaction and the pool grows by one.
    pub fn admit_transaction(&mut self, mut tx: Transaction) -> Result<(), LedgerError> {
        let sender = tx.sender.ok_or(LedgerError::MissingSender)?;

        if sender == *TAX_POOL_ADDRESS {
            return Err(LedgerError::MalformedTransaction(
                "the tax pool cannot be a caller-supplied sender".to_string(),
            ));
        }
        if sender == UNSET_ADDRESS || tx.recipient == UNSET_ADDRESS {
            return Err(LedgerError::MalformedTransaction(
                "sender and recipient must be set".to_string(),
            ));
        }
        if self.blacklist.contains(&sender) {
            return Err(LedgerError::BlacklistedParticipant(crypto::address_to_hex(
                &sender,
            )));
        }
        if self.blacklist.contains(&tx.recipient) {
            return Err(LedgerError::BlacklistedParticipant(crypto::address_to_hex(
                &tx.recipient,
            )));
        }

        tx.validate_size_within(self.max_transaction_bytes)?;
        tx.check(self)?;

        tx.fee = tx.amount * self.fee_rate;
        debug!(id = %tx.id_hex(), fee = %tx.fee, "transaction admitted");
        self.pending.push(tx);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Mining
    // ------------------------------------------------------------------

    /// Phase one of mining: screen the pool and assemble a candidate
    /// block at the difficulty chosen for it. Returns `None` when
    /// nothing survives screening.
    pub fn prepare_block(&mut self) -> Option<MiningJob> {
        if self.pending.is_empty() {
            return None;
        }

        self.screen_pending();
        if self.pending.is_empty() {
            return None;
        }

        let difficulty = self.difficulty_policy.suggest(&self.chain, self.difficulty);
        let block = Block::new(
            self.chain.len() as u64,
            self.pending.clone(),
            self.latest_hash(),
        );
        Some(MiningJob { block, difficulty })
    }

    /// Run the fraud policy over the pool: drop outright fraud, then
    /// drop and blacklist suspicious entries. The whole batch is judged
    /// against the blacklist as it stood before the batch.
    fn screen_pending(&mut self) {
        let fraud_policy = &self.fraud_policy;
        let before = self.pending.len();
        self.pending.retain(|tx| !fraud_policy.is_fraudulent(tx));
        let dropped_fraudulent = before - self.pending.len();

        let (suspicious, clean): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|tx| fraud_policy.is_suspicious(tx, &self.blacklist));
        self.pending = clean;

        for tx in &suspicious {
            if let Some(sender) = tx.sender {
                if sender != *TAX_POOL_ADDRESS && self.blacklist.insert(sender) {
                    warn!(
                        sender = %crypto::address_to_hex(&sender),
                        "sender blacklisted by fraud screen"
                    );
                }
            }
        }

        if dropped_fraudulent > 0 || !suspicious.is_empty() {
            info!(
                fraudulent = dropped_fraudulent,
                suspicious = suspicious.len(),
                "pending pool screened"
            );
        }
    }

    /// Phase three of mining: verify the mined block still extends the
    /// tip, then append it, post balances, and seed the next block's
    /// reward into the pool.
    ///
    /// A tip mismatch means the chain moved while the nonce search ran
    /// (a longer external chain arrived); the block is discarded with
    /// [`LedgerError::MiningAborted`] and no state changes.
    pub fn commit_block(
        &mut self,
        block: Block,
        difficulty: u32,
        reward_address: Address,
    ) -> Result<Block, LedgerError> {
        if block.previous_hash != self.latest_hash() {
            return Err(LedgerError::MiningAborted);
        }

        if block.index != self.chain.len() as u64 {
            return Err(LedgerError::InvalidChain(format!(
                "block index mismatch: expected {}, but got {}",
                self.chain.len(),
                block.index
            )));
        }

        if block.hash != block.compute_hash() {
            return Err(LedgerError::InvalidChain(
                "stored hash does not match block contents".to_string(),
            ));
        }

        if !block.meets_difficulty(difficulty) {
            return Err(LedgerError::InvalidChain(format!(
                "proof-of-work does not clear difficulty {}",
                difficulty
            )));
        }

        // The difficulty chosen at prepare time becomes current only once
        // a block actually lands at it.
        self.difficulty = difficulty;

        for tx in &block.transactions {
            self.balances.apply_transaction(tx);
        }
        self.energy_spent = self
            .energy_spent
            .saturating_add(block.nonce.saturating_mul(10));

        let mined_ids: HashSet<TxId> = block.transactions.iter().map(|tx| tx.id).collect();
        self.pending.retain(|tx| !mined_ids.contains(&tx.id));

        info!(
            index = block.index,
            difficulty,
            transactions = block.transactions.len(),
            hash = %block.hash_hex(),
            "block appended"
        );
        self.chain.push(block.clone());

        let reward = self.next_reward();
        self.pending
            .insert(0, Transaction::reward(reward_address, reward));

        debug_assert!(self
            .balances
            .agrees_with(&BalanceSheet::rebuild_from_chain(&self.chain)));

        Ok(block)
    }

    /// Base reward, plus the bonus when the new chain length lands on a
    /// bonus boundary.
    fn next_reward(&self) -> Amount {
        if self.chain.len() as u64 % self.bonus_period == 0 {
            self.base_reward + self.bonus_amount
        } else {
            self.base_reward
        }
    }

    /// Screen, mine and commit in one synchronous call.
    ///
    /// The async node facade splits the phases so the nonce search runs
    /// off-lock; tests and the demo binary use this directly.
    pub fn mine_block(&mut self, reward_address: Address) -> Result<MiningOutcome, LedgerError> {
        let job = match self.prepare_block() {
            Some(job) => job,
            None => return Ok(MiningOutcome::EmptyPool),
        };
        let mined = miner::mine_block(job.block, job.difficulty, &CancelToken::new())?;
        let block = self.commit_block(mined, job.difficulty, reward_address)?;
        Ok(MiningOutcome::Mined(block))
    }

    // ------------------------------------------------------------------
    // Balances
    // ------------------------------------------------------------------

    /// Settled balance from the cached sheet. Pending pool entries are
    /// not reflected until mined.
    pub fn balance_of(&self, address: &Address) -> Amount {
        self.balances.get_balance(address)
    }

    /// Authoritative balance by full-chain replay. The cached sheet must
    /// always agree with this.
    pub fn replay_balance(&self, address: &Address) -> Amount {
        BalanceSheet::rebuild_from_chain(&self.chain).get_balance(address)
    }

    // ------------------------------------------------------------------
    // Chain sync
    // ------------------------------------------------------------------

    /// Longest-valid-chain rule. A structurally valid candidate strictly
    /// longer than the local chain replaces it wholesale, with balances
    /// rebuilt by replay; anything else leaves local state untouched.
    pub fn resolve_chain(&mut self, candidate: Vec<Block>) -> SyncOutcome {
        if let Err(reason) = is_valid_chain(&candidate) {
            warn!(%reason, "rejected external chain");
            return SyncOutcome::Kept;
        }

        if candidate.len() <= self.chain.len() {
            debug!(
                local = self.chain.len(),
                candidate = candidate.len(),
                "external chain not longer, keeping local"
            );
            return SyncOutcome::Kept;
        }

        info!(
            from = self.chain.len(),
            to = candidate.len(),
            "adopting longer external chain"
        );
        self.chain = candidate;
        self.balances = BalanceSheet::rebuild_from_chain(&self.chain);
        SyncOutcome::Replaced
    }

    // ------------------------------------------------------------------
    // Contracts
    // ------------------------------------------------------------------

    /// Register a contract after vetting its actions against the allowed
    /// vocabulary. Returns the handle used to track fulfillment.
    pub fn deploy_contract(
        &mut self,
        terms: ContractTerms,
        actions: Vec<ContractAction>,
    ) -> Result<ContractId, LedgerError> {
        for action in &actions {
            match action {
                ContractAction::PayoutFromTaxPool { recipient, amount } => {
                    if *amount <= Amount::ZERO {
                        return Err(LedgerError::InvalidContract(format!(
                            "payout amount must be positive, got {}",
                            amount
                        )));
                    }
                    if *recipient == UNSET_ADDRESS {
                        return Err(LedgerError::InvalidContract(
                            "payout recipient must be set".to_string(),
                        ));
                    }
                }
                ContractAction::Blacklist { address } => {
                    if *address == *TAX_POOL_ADDRESS {
                        return Err(LedgerError::InvalidContract(
                            "the tax pool cannot be blacklisted".to_string(),
                        ));
                    }
                }
            }
        }

        let id = ContractId(self.next_contract_id);
        self.next_contract_id += 1;
        self.contracts.push(Contract::new(id, terms, actions));
        info!(handle = %id, "contract deployed");
        Ok(id)
    }

    /// Evaluate every pending contract against current balances and the
    /// clock. A fulfilled contract applies its actions exactly once; an
    /// expired one transitions to its terminal state. Returns the
    /// handles fulfilled in this pass.
    pub fn evaluate_contracts(&mut self) -> Vec<ContractId> {
        let now = chrono::Utc::now().timestamp_millis();
        let mut fulfilled = Vec::new();

        let mut contracts = std::mem::take(&mut self.contracts);
        for contract in &mut contracts {
            if contract.status != ContractStatus::Pending {
                continue;
            }

            if contract.is_expired(now) {
                info!(handle = %contract.id, "contract expired unfulfilled");
                contract.status = ContractStatus::Expired;
                continue;
            }

            if self.balance_of(&contract.terms.target) < contract.terms.minimum_balance {
                continue;
            }

            if !self.can_apply_actions(&contract.actions) {
                debug!(
                    handle = %contract.id,
                    "condition met but actions cannot settle, staying pending"
                );
                continue;
            }

            for action in &contract.actions {
                self.apply_action(action);
            }
            info!(handle = %contract.id, "contract fulfilled");
            contract.status = ContractStatus::Fulfilled;
            fulfilled.push(contract.id);
        }
        self.contracts = contracts;

        fulfilled
    }

    /// All-or-nothing pre-flight: every payout in the list must be
    /// covered by tax funds not already promised to queued payouts.
    fn can_apply_actions(&self, actions: &[ContractAction]) -> bool {
        let mut available = self.balance_of(&TAX_POOL_ADDRESS);
        for tx in &self.pending {
            if tx.sender == Some(*TAX_POOL_ADDRESS) {
                available -= tx.amount;
            }
        }
        for action in actions {
            if let ContractAction::PayoutFromTaxPool { amount, .. } = action {
                available -= *amount;
            }
        }
        available >= Amount::ZERO
    }

    fn apply_action(&mut self, action: &ContractAction) {
        match action {
            ContractAction::PayoutFromTaxPool { recipient, amount } => {
                self.pending.push(Transaction::payout(*recipient, *amount));
            }
            ContractAction::Blacklist { address } => {
                if self.blacklist.insert(*address) {
                    warn!(
                        address = %crypto::address_to_hex(address),
                        "address blacklisted by contract"
                    );
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------

    pub fn stats(&self) -> LedgerStats {
        let mut contracts_pending = 0;
        let mut contracts_fulfilled = 0;
        let mut contracts_expired = 0;
        for contract in &self.contracts {
            match contract.status {
                ContractStatus::Pending => contracts_pending += 1,
                ContractStatus::Fulfilled => contracts_fulfilled += 1,
                ContractStatus::Expired => contracts_expired += 1,
            }
        }

        LedgerStats {
            chain_length: self.chain.len(),
            difficulty: self.difficulty,
            pending_count: self.pending.len(),
            blacklist_size: self.blacklist.len(),
            energy_spent: self.energy_spent,
            contracts_pending,
            contracts_fulfilled,
            contracts_expired,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::address_from_label;

    fn test_config() -> LedgerConfig {
        LedgerConfig {
            initial_difficulty: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_new_ledger_starts_at_genesis() {
        let ledger = Ledger::new(&test_config());
        assert_eq!(ledger.chain.len(), 1);
        assert!(ledger.chain[0].is_genesis());
        assert!(ledger.pending.is_empty());
        assert_eq!(
            ledger.balance_of(&address_from_label("anyone")),
            Amount::ZERO
        );
    }

    #[test]
    fn test_empty_pool_mining_is_a_noop() {
        let mut ledger = Ledger::new(&test_config());
        let outcome = ledger.mine_block(address_from_label("miner")).unwrap();
        assert!(matches!(outcome, MiningOutcome::EmptyPool));
        assert_eq!(ledger.chain.len(), 1);
    }

    #[test]
    fn test_grant_then_mine_settles_balance() {
        let alice = address_from_label("alice");
        let miner = address_from_label("miner");
        let mut ledger = Ledger::new(&test_config());

        ledger.grant(alice, Amount::from_num(200)).unwrap();
        assert_eq!(ledger.balance_of(&alice), Amount::ZERO);

        let outcome = ledger.mine_block(miner).unwrap();
        assert!(matches!(outcome, MiningOutcome::Mined(_)));
        assert_eq!(ledger.balance_of(&alice), Amount::from_num(200));
        assert_eq!(ledger.chain.len(), 2);
    }

    #[test]
    fn test_grant_rejects_non_positive_amounts() {
        let mut ledger = Ledger::new(&test_config());
        assert!(ledger
            .grant(address_from_label("alice"), Amount::ZERO)
            .is_err());
        assert!(ledger
            .grant(address_from_label("alice"), Amount::from_num(-3))
            .is_err());
    }

    #[test]
    fn test_mining_reseeds_pool_with_reward() {
        let miner = address_from_label("miner");
        let mut ledger = Ledger::new(&test_config());
        ledger
            .grant(address_from_label("alice"), Amount::from_num(10))
            .unwrap();
        ledger.mine_block(miner).unwrap();

        assert_eq!(ledger.pending.len(), 1);
        let reward = &ledger.pending[0];
        assert!(reward.is_reward());
        assert_eq!(reward.recipient, miner);
        assert_eq!(reward.amount, Amount::from_num(50));
    }

    #[test]
    fn test_bonus_reward_on_period_boundary() {
        let miner = address_from_label("miner");
        let config = LedgerConfig {
            initial_difficulty: 1,
            bonus_period: 2,
            ..Default::default()
        };
        let mut ledger = Ledger::new(&config);
        ledger
            .grant(address_from_label("alice"), Amount::from_num(10))
            .unwrap();
        // New chain length 2 lands on the period boundary.
        ledger.mine_block(miner).unwrap();
        assert_eq!(ledger.pending[0].amount, Amount::from_num(75));
    }

    #[test]
    fn test_difficulty_committed_with_block() {
        let mut ledger = Ledger::new(&test_config());
        ledger
            .grant(address_from_label("alice"), Amount::from_num(10))
            .unwrap();
        // One block on the chain reads as a fast block, so the first
        // mine raises difficulty by one.
        ledger.mine_block(address_from_label("miner")).unwrap();
        assert_eq!(ledger.difficulty, 2);
    }

    #[test]
    fn test_stale_tip_commit_is_aborted() {
        let miner = address_from_label("miner");
        let mut ledger = Ledger::new(&test_config());
        ledger
            .grant(address_from_label("alice"), Amount::from_num(10))
            .unwrap();

        let job = ledger.prepare_block().unwrap();
        let stale = miner::mine_block(job.block, job.difficulty, &CancelToken::new()).unwrap();

        // The chain advances while the first search is in flight.
        ledger.mine_block(miner).unwrap();
        let chain_before = ledger.chain.len();

        assert!(matches!(
            ledger.commit_block(stale, job.difficulty, miner),
            Err(LedgerError::MiningAborted)
        ));
        assert_eq!(ledger.chain.len(), chain_before);
    }

    #[test]
    fn test_register_key_rejects_reserved_addresses() {
        let keypair = crate::crypto::KeyPair::generate().unwrap();
        let mut ledger = Ledger::new(&test_config());
        assert!(ledger
            .register_key(*TAX_POOL_ADDRESS, keypair.public_key_bytes())
            .is_err());
        assert!(ledger
            .register_key(UNSET_ADDRESS, keypair.public_key_bytes())
            .is_err());
        assert!(ledger
            .register_key(keypair.address(), keypair.public_key_bytes())
            .is_ok());
    }

    #[test]
    fn test_admission_rejects_blacklisted_sender() {
        let keypair = crate::crypto::KeyPair::generate().unwrap();
        let mut ledger = Ledger::new(&test_config());
        ledger
            .register_key(keypair.address(), keypair.public_key_bytes())
            .unwrap();
        ledger.grant(keypair.address(), Amount::from_num(100)).unwrap();
        ledger.mine_block(address_from_label("miner")).unwrap();

        ledger.blacklist.insert(keypair.address());

        let mut tx = Transaction::new(
            keypair.address(),
            address_from_label("payee"),
            Amount::from_num(10),
        );
        tx.sign(&keypair).unwrap();
        assert!(matches!(
            ledger.admit_transaction(tx),
            Err(LedgerError::BlacklistedParticipant(_))
        ));
        assert_eq!(ledger.pending.len(), 1);
    }

    #[test]
    fn test_admission_fixes_fee_from_rate() {
        let keypair = crate::crypto::KeyPair::generate().unwrap();
        let mut ledger = Ledger::new(&test_config());
        ledger
            .register_key(keypair.address(), keypair.public_key_bytes())
            .unwrap();
        ledger
            .grant(keypair.address(), Amount::from_num(1_000))
            .unwrap();
        ledger.mine_block(address_from_label("miner")).unwrap();

        let mut tx = Transaction::new(
            keypair.address(),
            address_from_label("payee"),
            Amount::from_num(100),
        );
        tx.sign(&keypair).unwrap();
        ledger.admit_transaction(tx).unwrap();

        let admitted = ledger.pending.last().unwrap();
        assert_eq!(admitted.fee, Amount::from_num(100) * ledger.fee_rate);
        assert!(admitted.fee > Amount::from_num(1));
        assert!(admitted.fee < Amount::from_num(3));
    }

    #[test]
    fn test_admission_rejects_tax_pool_sender() {
        let mut ledger = Ledger::new(&test_config());
        let tx = Transaction::payout(address_from_label("payee"), Amount::from_num(10));
        assert!(matches!(
            ledger.admit_transaction(tx),
            Err(LedgerError::MalformedTransaction(_))
        ));
    }

    #[test]
    fn test_resolve_chain_keeps_local_on_equal_length() {
        let mut a = Ledger::new(&test_config());
        let b = Ledger::new(&test_config());
        assert_eq!(a.resolve_chain(b.chain.clone()), SyncOutcome::Kept);
    }

    #[test]
    fn test_resolve_chain_adopts_longer_chain_and_rebuilds_balances() {
        let alice = address_from_label("alice");
        let mut local = Ledger::new(&test_config());
        let mut remote = Ledger::new(&test_config());

        remote.grant(alice, Amount::from_num(300)).unwrap();
        remote.mine_block(address_from_label("remote-miner")).unwrap();

        assert_eq!(local.resolve_chain(remote.chain.clone()), SyncOutcome::Replaced);
        assert_eq!(local.chain.len(), 2);
        assert_eq!(local.balance_of(&alice), Amount::from_num(300));
        assert_eq!(local.replay_balance(&alice), Amount::from_num(300));
    }

    #[test]
    fn test_deploy_contract_vets_actions() {
        let mut ledger = Ledger::new(&test_config());
        let terms = ContractTerms {
            target: address_from_label("target"),
            minimum_balance: Amount::from_num(10),
            deadline: None,
        };

        let bad_amount = vec![ContractAction::PayoutFromTaxPool {
            recipient: address_from_label("winner"),
            amount: Amount::ZERO,
        }];
        assert!(matches!(
            ledger.deploy_contract(terms.clone(), bad_amount),
            Err(LedgerError::InvalidContract(_))
        ));

        let bad_ban = vec![ContractAction::Blacklist {
            address: *TAX_POOL_ADDRESS,
        }];
        assert!(matches!(
            ledger.deploy_contract(terms.clone(), bad_ban),
            Err(LedgerError::InvalidContract(_))
        ));

        let id = ledger.deploy_contract(terms, Vec::new()).unwrap();
        assert_eq!(id, ContractId(0));
        assert_eq!(id.to_string(), "contract-0");
    }

    #[test]
    fn test_contract_blacklist_action_applies_on_fulfillment() {
        let target = address_from_label("target");
        let banned = address_from_label("banned");
        let mut ledger = Ledger::new(&test_config());

        ledger
            .deploy_contract(
                ContractTerms {
                    target,
                    minimum_balance: Amount::from_num(100),
                    deadline: None,
                },
                vec![ContractAction::Blacklist { address: banned }],
            )
            .unwrap();

        assert!(ledger.evaluate_contracts().is_empty());
        assert!(!ledger.blacklist.contains(&banned));

        ledger.grant(target, Amount::from_num(100)).unwrap();
        ledger.mine_block(address_from_label("miner")).unwrap();

        let fulfilled = ledger.evaluate_contracts();
        assert_eq!(fulfilled, vec![ContractId(0)]);
        assert!(ledger.blacklist.contains(&banned));

        // Terminal: a second pass does not re-apply.
        assert!(ledger.evaluate_contracts().is_empty());
    }

    #[test]
    fn test_stats_reflect_ledger_state() {
        let mut ledger = Ledger::new(&test_config());
        ledger
            .grant(address_from_label("alice"), Amount::from_num(10))
            .unwrap();
        ledger.mine_block(address_from_label("miner")).unwrap();

        let stats = ledger.stats();
        assert_eq!(stats.chain_length, 2);
        assert_eq!(stats.pending_count, 1);
        assert_eq!(stats.difficulty, ledger.difficulty);
        assert_eq!(stats.blacklist_size, 0);
    }
}
