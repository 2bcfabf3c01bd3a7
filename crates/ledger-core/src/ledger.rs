use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Number;

use crate::{
    constants::GENESIS_PROOF, error::LedgerError, pow::ProofOfWork, Block, ChainReport,
    PreviousHash, Transaction,
};

/// A node's chain plus the transactions waiting for the next block.
///
/// Invariants maintained by this type:
/// - Always contains at least the genesis block.
/// - Blocks are never modified once appended; the chain only grows or is
///   replaced as a whole by consensus.
/// - Pending transactions are cleared exactly when a block is appended.
#[derive(Debug, Clone)]
pub struct Ledger {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
    pow: ProofOfWork,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(ProofOfWork::default())
    }
}

impl Ledger {
    /// Create a ledger holding only the genesis block.
    pub fn new(pow: ProofOfWork) -> Self {
        let mut ledger = Self {
            chain: Vec::new(),
            pending: Vec::new(),
            pow,
        };
        ledger.append(GENESIS_PROOF, PreviousHash::Genesis);
        ledger
    }

    /// Seal the pending transactions into a new block and append it.
    ///
    /// Without an explicit `previous_hash` the block links to the hash of the
    /// current head.
    pub fn new_block(
        &mut self,
        proof: u64,
        previous_hash: Option<PreviousHash>,
    ) -> Result<&Block, LedgerError> {
        let previous_hash = match previous_hash {
            Some(link) => link,
            None => PreviousHash::Digest(self.last_block()?.hash()),
        };
        Ok(self.append(proof, previous_hash))
    }

    /// Queue a transaction. Returns the index of the block it will land in.
    pub fn new_transaction(
        &mut self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: impl Into<Number>,
    ) -> u64 {
        self.pending.push(Transaction::new(sender, recipient, amount));
        self.next_index()
    }

    pub fn last_block(&self) -> Result<&Block, LedgerError> {
        self.chain.last().ok_or(LedgerError::EmptyChain)
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn proof_of_work(&self) -> ProofOfWork {
        self.pow
    }

    pub fn report(&self) -> ChainReport {
        ChainReport {
            chain: self.chain.clone(),
            length: self.chain.len(),
        }
    }

    /// Swap in a validated chain. Pending transactions are kept.
    pub(crate) fn replace_chain(&mut self, chain: Vec<Block>) -> Result<(), LedgerError> {
        if chain.is_empty() {
            return Err(LedgerError::EmptyChain);
        }
        self.chain = chain;
        Ok(())
    }

    // Indices run 1..=len, so the head's index + 1 is len + 1.
    fn next_index(&self) -> u64 {
        self.chain.len() as u64 + 1
    }

    fn append(&mut self, proof: u64, previous_hash: PreviousHash) -> &Block {
        let block = Block {
            index: self.next_index(),
            timestamp: unix_timestamp(),
            transactions: std::mem::take(&mut self.pending),
            proof,
            previous_hash,
        };
        self.chain.push(block);
        &self.chain[self.chain.len() - 1]
    }
}

fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::GENESIS_PREVIOUS_HASH;

    #[test]
    fn genesis_block_example() {
        let ledger = Ledger::default();
        assert_eq!(ledger.len(), 1);
        let genesis = ledger.last_block().unwrap();
        assert_eq!(genesis.index, 1);
        assert_eq!(genesis.proof, GENESIS_PROOF);
        assert_eq!(genesis.previous_hash, PreviousHash::Genesis);
        assert_eq!(
            serde_json::to_value(&genesis.previous_hash).unwrap(),
            serde_json::json!(GENESIS_PREVIOUS_HASH)
        );
        assert!(genesis.transactions.is_empty());
        assert!(genesis.timestamp > 0.0);
        assert!(ledger.pending().is_empty());
    }

    #[test]
    fn new_transaction_targets_next_block() {
        let mut ledger = Ledger::default();
        assert_eq!(ledger.new_transaction("Alice", "Bob", 10u64), 2);
        assert_eq!(ledger.new_transaction("Bob", "Carol", -3i64), 2);
        assert_eq!(ledger.pending().len(), 2);
        assert_eq!(ledger.pending()[1], Transaction::new("Bob", "Carol", -3i64));
        ledger.new_block(1, None).unwrap();
        assert_eq!(ledger.new_transaction("Carol", "Dave", 1u64), 3);
    }

    #[test]
    fn new_block_links_to_head_and_drains_pending() {
        let mut ledger = Ledger::default();
        ledger.new_transaction("Alice", "Bob", 10u64);
        ledger.new_transaction("Bob", "Carol", 4u64);
        let head_hash = ledger.last_block().unwrap().hash();

        let block = ledger.new_block(77, None).unwrap().clone();
        assert_eq!(block.index, 2);
        assert_eq!(block.proof, 77);
        assert!(block.previous_hash.matches(&head_hash));
        assert_eq!(block.transactions.len(), 2);
        assert_eq!(block.transactions[0].sender, "Alice");
        assert!(ledger.pending().is_empty());
        assert_eq!(ledger.last_block().unwrap(), &block);
    }

    #[test]
    fn explicit_previous_hash_is_used_verbatim() {
        let mut ledger = Ledger::default();
        let link = PreviousHash::Digest("ff".repeat(32));
        let block = ledger.new_block(5, Some(link.clone())).unwrap();
        assert_eq!(block.previous_hash, link);
    }

    #[test]
    fn indices_are_contiguous() {
        let mut ledger = Ledger::default();
        for proof in 0..5 {
            ledger.new_block(proof, None).unwrap();
        }
        let indices: Vec<u64> = ledger.chain().iter().map(|b| b.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn report_mirrors_chain() {
        let mut ledger = Ledger::default();
        ledger.new_block(1, None).unwrap();
        let report = ledger.report();
        assert_eq!(report.length, 2);
        assert_eq!(report.chain, ledger.chain());
    }

    #[test]
    fn replacement_keeps_pending_transactions() {
        let mut ledger = Ledger::default();
        let mut other = Ledger::default();
        other.new_block(1, None).unwrap();
        ledger.new_transaction("Alice", "Bob", 1u64);
        ledger.replace_chain(other.chain().to_vec()).unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.pending().len(), 1);
        assert_eq!(ledger.new_transaction("Bob", "Carol", 1u64), 3);
    }

    #[test]
    fn empty_replacement_is_rejected() {
        let mut ledger = Ledger::default();
        ledger.new_block(1, None).unwrap();
        assert!(matches!(
            ledger.replace_chain(Vec::new()),
            Err(LedgerError::EmptyChain)
        ));
        assert_eq!(ledger.len(), 2);
    }
}
