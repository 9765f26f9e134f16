use crate::block::Block;
use crate::crypto::Address;
use crate::transaction::{Amount, Transaction, TAX_POOL_ADDRESS};
use std::collections::{HashMap, HashSet};

/// Cached account balances, a memoization of full-chain replay.
///
/// The ledger posts every settled transaction here as blocks are
/// appended; [`BalanceSheet::rebuild_from_chain`] is the authoritative
/// definition the cache must always agree with.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct BalanceSheet {
    pub accounts: HashMap<Address, Amount>,
}

impl BalanceSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_balance(&self, address: &Address) -> Amount {
        *self.accounts.get(address).unwrap_or(&Amount::ZERO)
    }

    /// Post one settled transaction. A transfer debits the sender the
    /// full amount, credits the recipient the amount net of fee, and
    /// credits the fee to the tax pool. A mint credits the recipient
    /// from nothing.
    pub fn apply_transaction(&mut self, tx: &Transaction) {
        match &tx.sender {
            Some(sender) => {
                *self.accounts.entry(*sender).or_insert(Amount::ZERO) -= tx.amount;
                *self.accounts.entry(tx.recipient).or_insert(Amount::ZERO) +=
                    tx.amount - tx.fee;
                if tx.fee > Amount::ZERO {
                    *self.accounts.entry(*TAX_POOL_ADDRESS).or_insert(Amount::ZERO) += tx.fee;
                }
            }
            None => {
                *self.accounts.entry(tx.recipient).or_insert(Amount::ZERO) += tx.amount;
            }
        }
    }

    /// Replay every block into a fresh sheet.
    pub fn rebuild_from_chain(chain: &[Block]) -> Self {
        let mut sheet = Self::new();
        for block in chain {
            for tx in &block.transactions {
                sheet.apply_transaction(tx);
            }
        }
        sheet
    }

    /// Equality up to zero entries: an address absent from one sheet and
    /// holding zero in the other counts as agreement.
    pub fn agrees_with(&self, other: &BalanceSheet) -> bool {
        let addresses: HashSet<&Address> =
            self.accounts.keys().chain(other.accounts.keys()).collect();
        addresses
            .into_iter()
            .all(|address| self.get_balance(address) == other.get_balance(address))
    }
}
