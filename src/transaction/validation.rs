/// Admission rules for transactions, checked against live ledger state
use crate::crypto;
use crate::error::LedgerError;
use crate::ledger::Ledger;
use crate::transaction::types::{Amount, Transaction};

impl Transaction {
    /// Full admission check with a typed rejection reason.
    ///
    /// Stateful checks (registered key, settled balance) read the ledger.
    /// The blacklist is the admission gate's concern, not this one: a
    /// blacklisted sender with a perfectly valid transaction still passes
    /// here and is turned away at the door.
    pub fn check(&self, ledger: &Ledger) -> Result<(), LedgerError> {
        if self.amount <= Amount::ZERO {
            return Err(LedgerError::MalformedTransaction(format!(
                "amount must be positive, got {}",
                self.amount
            )));
        }

        // Protocol mints carry ledger-computed values and no signature.
        if self.is_protocol() {
            return Ok(());
        }

        let sender = self.sender.ok_or(LedgerError::MissingSender)?;

        let public_key = ledger.lookup_key(&sender).ok_or_else(|| {
            LedgerError::AuthenticationFailed(format!(
                "no registered key for sender {}",
                crypto::address_to_hex(&sender)
            ))
        })?;

        let signature = self.signature.as_ref().ok_or_else(|| {
            LedgerError::AuthenticationFailed("transaction is not signed".to_string())
        })?;

        crypto::verify_signature(public_key, &self.id, signature).map_err(|_| {
            LedgerError::AuthenticationFailed(
                "signature does not match transaction id".to_string(),
            )
        })?;

        let have = ledger.balance_of(&sender);
        if have < self.amount {
            return Err(LedgerError::InsufficientFunds {
                have,
                need: self.amount,
            });
        }

        Ok(())
    }

    /// Boolean admission test: false on any rejection, never panics.
    pub fn validate(&self, ledger: &Ledger) -> bool {
        self.check(ledger).is_ok()
    }
}
