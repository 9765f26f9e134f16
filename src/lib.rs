//! Emberchain - a single-process proof-of-work ledger engine
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Ledger Core
//! - [`ledger`] - Chain, pending pool, balances, blacklist and contracts
//! - [`transaction`] - Transaction types and admission rules
//! - [`block`] - Block structure and proof-of-work hashing
//!
//! ## Consensus
//! - [`miner`] - Proof-of-work nonce search with cancellation
//! - [`policy`] - Difficulty retargeting and fraud screening
//!
//! ## Contracts
//! - [`contract`] - Declarative balance-triggered contracts
//!
//! ## Cryptography
//! - [`crypto`] - Signatures and verification (secp256k1)
//!
//! ## Integration
//! - [`node`] - Async request facade over a shared ledger
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Ledger Core
// ============================================================================
pub mod block;
pub mod ledger;
pub mod transaction;

// ============================================================================
// Consensus & Mining
// ============================================================================
pub mod miner;
pub mod policy;

// ============================================================================
// Contracts
// ============================================================================
pub mod contract;

// ============================================================================
// Cryptography
// ============================================================================
pub mod crypto;

// ============================================================================
// Integration
// ============================================================================
pub mod node;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
