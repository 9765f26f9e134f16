// Thin re-export module: implementation is in `ledger/core.rs` with
// balance bookkeeping and chain validation split into their own
// submodules.

pub mod core;
pub mod state;
pub mod validation;

pub use self::core::*;
pub use state::*;
pub use validation::*;
