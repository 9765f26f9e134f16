//! Declarative balance-triggered contracts
//!
//! A contract is data, never code: terms that name a target balance
//! condition, plus an ordered list of actions drawn from a fixed
//! vocabulary. The ledger evaluates contracts on demand and applies the
//! actions of any that fulfilled.

use crate::crypto::Address;
use crate::transaction::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sequential contract handle, rendered as `contract-{n}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractId(pub u64);

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "contract-{}", self.0)
    }
}

/// Fulfillment condition: the target address reaching a minimum balance,
/// optionally before a deadline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractTerms {
    pub target: Address,
    pub minimum_balance: Amount,
    /// Unix milliseconds. `None` means the contract waits forever.
    pub deadline: Option<i64>,
}

/// Allow-listed ledger mutations a fulfilled contract may perform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContractAction {
    /// Credit `recipient` from the accumulated tax pool.
    PayoutFromTaxPool { recipient: Address, amount: Amount },
    /// Permanently bar an address from the ledger.
    Blacklist { address: Address },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractStatus {
    Pending,
    /// Condition met, actions applied. Terminal.
    Fulfilled,
    /// Deadline passed unfulfilled. Terminal, never retried.
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub terms: ContractTerms,
    pub actions: Vec<ContractAction>,
    pub status: ContractStatus,
}

impl Contract {
    pub fn new(id: ContractId, terms: ContractTerms, actions: Vec<ContractAction>) -> Self {
        Contract {
            id,
            terms,
            actions,
            status: ContractStatus::Pending,
        }
    }

    /// Whether the deadline, if any, has passed as of `now`.
    pub fn is_expired(&self, now: i64) -> bool {
        match self.terms.deadline {
            Some(deadline) => now > deadline,
            None => false,
        }
    }
}
