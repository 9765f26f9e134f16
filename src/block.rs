//! Block structure and proof-of-work hashing

use crate::transaction::Transaction;
use sha2::{Digest, Sha256};

pub type BlockHash = [u8; 32];

/// Sentinel previous-hash carried by the genesis block.
pub const GENESIS_PREVIOUS_HASH: BlockHash = [0u8; 32];

/// Fixed genesis timestamp (2023-01-01T00:00:00Z in Unix milliseconds) so
/// every ledger starts from an identical block.
pub const GENESIS_TIMESTAMP: i64 = 1_672_531_200_000;

/// A batch of transactions chained to its predecessor by hash.
///
/// The stored `hash` covers index, timestamp, transaction ids with their
/// admitted fees, the previous hash, and the nonce. Mining mutates only
/// the nonce; everything else is fixed once the block is assembled.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Block {
    pub index: u64,
    /// Unix milliseconds at assembly.
    pub timestamp: i64,
    pub transactions: Vec<Transaction>,
    pub previous_hash: BlockHash,
    pub nonce: u64,
    pub hash: BlockHash,
}

impl Block {
    /// Assemble an unmined block on top of `previous_hash`. The stored
    /// hash is current for nonce 0 and is re-derived as mining advances.
    pub fn new(index: u64, transactions: Vec<Transaction>, previous_hash: BlockHash) -> Self {
        let timestamp = chrono::Utc::now().timestamp_millis();
        let mut block = Block {
            index,
            timestamp,
            transactions,
            previous_hash,
            nonce: 0,
            hash: [0u8; 32],
        };
        block.hash = block.compute_hash();
        block
    }

    /// The deterministic first block. Carries no transactions and is
    /// never mined; validation special-cases it by its sentinel fields.
    pub fn genesis() -> Self {
        let mut block = Block {
            index: 0,
            timestamp: GENESIS_TIMESTAMP,
            transactions: Vec::new(),
            previous_hash: GENESIS_PREVIOUS_HASH,
            nonce: 0,
            hash: [0u8; 32],
        };
        block.hash = block.compute_hash();
        block
    }

    /// Hash over the block contents. Transactions contribute their id and
    /// admitted fee, so fee tampering after admission breaks the block
    /// hash even though fees sit outside the transaction id.
    pub fn compute_hash(&self) -> BlockHash {
        let mut hasher = Sha256::new();
        hasher.update(self.index.to_le_bytes());
        hasher.update(self.timestamp.to_le_bytes());
        for tx in &self.transactions {
            hasher.update(tx.id);
            hasher.update(tx.fee.to_le_bytes());
        }
        hasher.update(self.previous_hash);
        hasher.update(self.nonce.to_le_bytes());
        hasher.finalize().into()
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// Whether the stored hash clears `difficulty` leading zero hex
    /// nibbles.
    pub fn meets_difficulty(&self, difficulty: u32) -> bool {
        leading_zero_nibbles(&self.hash) >= difficulty
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0 && self.previous_hash == GENESIS_PREVIOUS_HASH
    }
}

/// Count leading zero hex nibbles of a hash, high nibble first.
pub fn leading_zero_nibbles(hash: &BlockHash) -> u32 {
    let mut count = 0;
    for byte in hash {
        if byte >> 4 == 0 {
            count += 1;
        } else {
            break;
        }
        if byte & 0x0F == 0 {
            count += 1;
        } else {
            break;
        }
    }
    count
}
