//! Pluggable difficulty and fraud policies
//!
//! The ledger composes these behind trait objects so tests can pin
//! difficulty or disable screening without touching ledger code.

use crate::block::Block;
use crate::crypto::{Address, UNSET_ADDRESS};
use crate::transaction::{Amount, Transaction};
use std::collections::HashSet;

/// Chooses the proof-of-work difficulty for the next block from chain
/// history.
pub trait DifficultyPolicy: Send + Sync {
    fn suggest(&self, chain: &[Block], current: u32) -> u32;
}

/// Screens the pending pool before block construction.
pub trait FraudPolicy: Send + Sync {
    /// Outright invalid; dropped silently with no further consequence.
    fn is_fraudulent(&self, tx: &Transaction) -> bool;

    /// Worth dropping and punishing. The ledger blacklists the senders of
    /// every transaction flagged here.
    fn is_suspicious(&self, tx: &Transaction, blacklist: &HashSet<Address>) -> bool;
}

/// Single-sample reactive difficulty controller.
///
/// Looks only at the delay between the last two blocks: slow blocks ease
/// difficulty, fast blocks raise it, and anything in between leaves it
/// alone. With fewer than two blocks the delay reads as zero, which
/// counts as fast. Oscillates under noisy timing; accepted for now.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReactiveDifficulty;

impl ReactiveDifficulty {
    /// Blocks slower than this (milliseconds) ease difficulty.
    pub const SLOW_BLOCK_MS: i64 = 2000;
    /// Blocks faster than this (milliseconds) raise difficulty.
    pub const FAST_BLOCK_MS: i64 = 1000;
    /// Difficulty never drops below one nibble of work.
    pub const MIN_DIFFICULTY: u32 = 1;
}

impl DifficultyPolicy for ReactiveDifficulty {
    fn suggest(&self, chain: &[Block], current: u32) -> u32 {
        let delay = match chain {
            [.., prev, last] => last.timestamp - prev.timestamp,
            _ => 0,
        };

        let suggested = if delay > Self::SLOW_BLOCK_MS {
            current.saturating_sub(1)
        } else if delay < Self::FAST_BLOCK_MS {
            current + 1
        } else {
            current
        };

        suggested.max(Self::MIN_DIFFICULTY)
    }
}

/// Amount-ceiling fraud screen.
///
/// Transfers above the ceiling, or carrying an unset address, are flagged
/// as suspicious. Anything touching a blacklisted address is flagged no
/// matter what, protocol mints included. Ledger-minted transactions are
/// otherwise exempt: their amounts are protocol-computed.
#[derive(Debug, Clone)]
pub struct ThresholdFraudScreen {
    pub ceiling: Amount,
}

impl ThresholdFraudScreen {
    pub fn new(ceiling: Amount) -> Self {
        Self { ceiling }
    }
}

impl FraudPolicy for ThresholdFraudScreen {
    fn is_fraudulent(&self, tx: &Transaction) -> bool {
        tx.amount <= Amount::ZERO
    }

    fn is_suspicious(&self, tx: &Transaction, blacklist: &HashSet<Address>) -> bool {
        if blacklist.contains(&tx.recipient) {
            return true;
        }
        if let Some(sender) = &tx.sender {
            if blacklist.contains(sender) {
                return true;
            }
        }

        if tx.is_protocol() {
            return false;
        }

        if tx.recipient == UNSET_ADDRESS || tx.sender == Some(UNSET_ADDRESS) {
            return true;
        }

        tx.amount > self.ceiling
    }
}
