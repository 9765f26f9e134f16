/// Transaction types for Emberchain
use crate::crypto::{self, Address, KeyPair};
use crate::error::LedgerError;
use fixed::types::I64F64;
use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};

/// Fixed-point ledger amount. Binary fixed-point keeps hashing bit-exact
/// and balance replay free of float drift.
pub type Amount = I64F64;

/// Content hash identifying a transaction.
pub type TxId = [u8; 32];

/// Maximum serialized transaction size in bytes (100KB) to prevent DoS
pub const MAX_TRANSACTION_SIZE: usize = 100_000;

/// Reserved address that accumulates admission fees and funds contract
/// payouts. It has no key pair, cannot be registered, and is barred from
/// appearing as a caller-supplied sender.
pub static TAX_POOL_ADDRESS: Lazy<Address> =
    Lazy::new(|| crypto::address_from_label("emberchain:tax-pool"));

/// A value transfer awaiting or embedded in a block.
///
/// `id` is the content hash over (kind, sender, recipient, amount,
/// timestamp), computed once at construction. The fee is set by the ledger
/// at admission and deliberately excluded from the preimage, so admission
/// never desynchronizes the id from the signed content.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Transaction {
    /// `None` marks a protocol reward mint; rewards are never signed.
    pub sender: Option<Address>,
    pub recipient: Address,
    pub amount: Amount,
    /// Fee retained by the tax pool, set once at admission. Zero for
    /// protocol transactions.
    pub fee: Amount,
    /// Unix milliseconds at creation.
    pub timestamp: i64,
    pub id: TxId,
    /// Compact ECDSA signature over `id`.
    pub signature: Option<Vec<u8>>,
}

impl Transaction {
    /// A caller-submitted transfer. The id is final from this point on;
    /// sign it with [`Transaction::sign`] before submitting.
    pub fn new(sender: Address, recipient: Address, amount: Amount) -> Self {
        Self::build(Some(sender), recipient, amount)
    }

    /// Protocol mint crediting a miner or faucet grant. Unsigned by design.
    pub fn reward(recipient: Address, amount: Amount) -> Self {
        Self::build(None, recipient, amount)
    }

    /// Contract payout drawn from the tax pool. Unsigned protocol
    /// transaction; the contract engine pre-flights the pool balance.
    pub fn payout(recipient: Address, amount: Amount) -> Self {
        Self::build(Some(*TAX_POOL_ADDRESS), recipient, amount)
    }

    fn build(sender: Option<Address>, recipient: Address, amount: Amount) -> Self {
        let mut tx = Transaction {
            sender,
            recipient,
            amount,
            fee: Amount::ZERO,
            timestamp: chrono::Utc::now().timestamp_millis(),
            id: [0u8; 32],
            signature: None,
        };
        tx.id = tx.compute_id();
        tx
    }

    /// Deterministic content hash over (kind, sender, recipient, amount,
    /// timestamp). Reward mints are domain-separated from transfers.
    pub fn compute_id(&self) -> TxId {
        let mut hasher = Sha256::new();
        match &self.sender {
            Some(sender) => {
                hasher.update("transfer".as_bytes());
                hasher.update(sender);
            }
            None => hasher.update("reward".as_bytes()),
        }
        hasher.update(self.recipient);
        hasher.update(self.amount.to_le_bytes());
        hasher.update(self.timestamp.to_le_bytes());
        hasher.finalize().into()
    }

    pub fn id_hex(&self) -> String {
        hex::encode(self.id)
    }

    /// Signs the transaction id. Reward mints have no sender and cannot be
    /// signed.
    pub fn sign(&mut self, keypair: &KeyPair) -> Result<(), LedgerError> {
        if self.sender.is_none() {
            return Err(LedgerError::MissingSender);
        }
        let signature = keypair.sign(&self.id)?;
        self.signature = Some(signature.to_vec());
        Ok(())
    }

    /// `true` for protocol reward mints (no sender).
    pub fn is_reward(&self) -> bool {
        self.sender.is_none()
    }

    /// `true` for ledger-minted transactions: reward mints and tax-pool
    /// payouts. These carry protocol-computed values and no signature.
    pub fn is_protocol(&self) -> bool {
        match &self.sender {
            None => true,
            Some(sender) => sender == &*TAX_POOL_ADDRESS,
        }
    }

    /// Validate transaction size to prevent DoS attacks
    pub fn validate_size(&self) -> Result<(), LedgerError> {
        self.validate_size_within(MAX_TRANSACTION_SIZE)
    }

    /// Size check against a caller-supplied cap; the ledger passes its
    /// configured limit here.
    pub fn validate_size_within(&self, limit: usize) -> Result<(), LedgerError> {
        let serialized = bincode::serialize(self)?;
        if serialized.len() > limit {
            return Err(LedgerError::MalformedTransaction(format!(
                "transaction too large: {} bytes (max: {})",
                serialized.len(),
                limit
            )));
        }
        Ok(())
    }
}
