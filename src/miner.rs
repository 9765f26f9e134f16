//! Proof-of-work nonce search with cooperative cancellation

use crate::block::Block;
use crate::error::LedgerError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Shared flag that aborts an in-flight nonce search. Cloned into the
/// mining task; any holder may fire it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Search for a nonce whose block hash clears `difficulty` leading zero
/// nibbles. Returns the mined block, or [`LedgerError::MiningAborted`]
/// when the token fires first.
///
/// Pure CPU loop with no locks; callers run it on a blocking thread and
/// hold no ledger state across it.
pub fn mine_block(
    mut block: Block,
    difficulty: u32,
    cancel: &CancelToken,
) -> Result<Block, LedgerError> {
    debug!(
        index = block.index,
        difficulty, "starting proof-of-work search"
    );

    loop {
        if cancel.is_cancelled() {
            debug!(index = block.index, nonce = block.nonce, "mining cancelled");
            return Err(LedgerError::MiningAborted);
        }

        block.hash = block.compute_hash();
        if block.meets_difficulty(difficulty) {
            info!(
                index = block.index,
                nonce = block.nonce,
                hash = %block.hash_hex(),
                "proof-of-work found"
            );
            return Ok(block);
        }

        block.nonce = block.nonce.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mined_block_clears_difficulty() {
        let block = Block::new(1, Vec::new(), Block::genesis().hash);
        let mined = mine_block(block, 2, &CancelToken::new()).unwrap();
        assert!(mined.meets_difficulty(2));
        assert_eq!(mined.hash, mined.compute_hash());
    }

    #[test]
    fn test_pre_fired_token_aborts_immediately() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let block = Block::new(1, Vec::new(), Block::genesis().hash);
        assert!(matches!(
            mine_block(block, 1, &cancel),
            Err(LedgerError::MiningAborted)
        ));
    }

    #[test]
    fn test_token_clones_share_state() {
        let cancel = CancelToken::new();
        let clone = cancel.clone();
        clone.cancel();
        assert!(cancel.is_cancelled());
    }
}
