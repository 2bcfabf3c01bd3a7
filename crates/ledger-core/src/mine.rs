use crate::{
    constants::{MINING_REWARD, MINING_SENDER},
    error::LedgerError,
    Block, Ledger, PreviousHash,
};
use tracing::{debug, info};

/// The head a proof search starts from.
///
/// Taking a target, searching, and sealing are separate steps so a caller
/// sharing the ledger behind a lock only needs it at the two ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiningTarget {
    pub last_proof: u64,
    pub last_hash: String,
}

impl MiningTarget {
    pub fn of(ledger: &Ledger) -> Result<Self, LedgerError> {
        let head = ledger.last_block()?;
        Ok(Self {
            last_proof: head.proof,
            last_hash: head.hash(),
        })
    }
}

/// Append the block for `proof` if the head is still the one `target` was
/// taken from. Returns `None` when the head has moved since.
pub fn seal_block(
    ledger: &mut Ledger,
    target: &MiningTarget,
    proof: u64,
    miner: &str,
) -> Result<Option<Block>, LedgerError> {
    if ledger.last_block()?.hash() != target.last_hash {
        debug!("head moved while searching for proof of {}", target.last_proof);
        return Ok(None);
    }
    append_mined(ledger, target, proof, miner).map(Some)
}

/// Mines the next block: solves the puzzle against the head's proof, credits
/// the reward to `miner` and appends a block linked to the head's hash.
/// Returns the appended block.
pub fn mine_block(ledger: &mut Ledger, miner: &str) -> Result<Block, LedgerError> {
    let target = MiningTarget::of(ledger)?;
    let proof = ledger.proof_of_work().find_proof(target.last_proof)?;
    append_mined(ledger, &target, proof, miner)
}

fn append_mined(
    ledger: &mut Ledger,
    target: &MiningTarget,
    proof: u64,
    miner: &str,
) -> Result<Block, LedgerError> {
    // Reward goes in with whatever is already pending.
    ledger.new_transaction(MINING_SENDER, miner, MINING_REWARD);
    let block = ledger
        .new_block(proof, Some(PreviousHash::Digest(target.last_hash.clone())))?
        .clone();

    info!(
        "Mined block {} with proof {} ({} transactions)",
        block.index,
        proof,
        block.transactions.len()
    );
    Ok(block)
}
