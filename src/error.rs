//! Error types for Emberchain

use thiserror::Error;

use crate::transaction::Amount;

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("transaction has no sender")]
    MissingSender,
    #[error("malformed transaction: {0}")]
    MalformedTransaction(String),
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("insufficient funds: have {have}, need {need}")]
    InsufficientFunds { have: Amount, need: Amount },
    #[error("blacklisted participant: {0}")]
    BlacklistedParticipant(String),
    #[error("invalid chain: {0}")]
    InvalidChain(String),
    #[error("invalid contract: {0}")]
    InvalidContract(String),
    #[error("cryptographic error: {0}")]
    CryptoError(String),
    #[error("a mining attempt is already in progress")]
    MiningInProgress,
    #[error("mining attempt aborted")]
    MiningAborted,
}

impl From<secp256k1::Error> for LedgerError {
    fn from(err: secp256k1::Error) -> Self {
        LedgerError::CryptoError(err.to_string())
    }
}

impl From<Box<bincode::ErrorKind>> for LedgerError {
    fn from(err: Box<bincode::ErrorKind>) -> Self {
        LedgerError::MalformedTransaction(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, LedgerError>;
