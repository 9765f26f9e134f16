use crate::block::{Block, GENESIS_PREVIOUS_HASH};
use crate::error::LedgerError;

/// Structural validation of a candidate chain.
///
/// Checks the genesis sentinel, positional indices, stored-versus-
/// recomputed block hashes, previous-hash linkage, and that every
/// transaction id still matches its content. Proof-of-work depth is not
/// re-judged here; difficulty is a property of the mining moment, not of
/// the stored chain.
pub fn is_valid_chain(chain: &[Block]) -> Result<(), LedgerError> {
    let genesis = chain
        .first()
        .ok_or_else(|| LedgerError::InvalidChain("chain is empty".to_string()))?;
    if genesis.index != 0 || genesis.previous_hash != GENESIS_PREVIOUS_HASH {
        return Err(LedgerError::InvalidChain(
            "first block is not a genesis block".to_string(),
        ));
    }

    for (position, block) in chain.iter().enumerate() {
        if block.index != position as u64 {
            return Err(LedgerError::InvalidChain(format!(
                "block index mismatch at position {}: expected {}, but got {}",
                position, position, block.index
            )));
        }

        if block.hash != block.compute_hash() {
            return Err(LedgerError::InvalidChain(format!(
                "stored hash does not match contents at index {}",
                block.index
            )));
        }

        if position > 0 {
            let previous = &chain[position - 1];
            if block.previous_hash != previous.hash {
                return Err(LedgerError::InvalidChain(format!(
                    "broken linkage at index {}: expected previous hash {}, but got {}",
                    block.index,
                    hex::encode(previous.hash),
                    hex::encode(block.previous_hash)
                )));
            }
        }

        for tx in &block.transactions {
            if tx.id != tx.compute_id() {
                return Err(LedgerError::InvalidChain(format!(
                    "transaction id does not match contents in block {}",
                    block.index
                )));
            }
        }
    }

    Ok(())
}
