use crate::{error::ChainError, pow::ProofOfWork, Block};

/// Walk every adjacent pair and report the first broken hash link or
/// unsolved proof. Chains of zero or one block pass trivially.
pub fn validate_chain(chain: &[Block], pow: &ProofOfWork) -> Result<(), ChainError> {
    for pair in chain.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);
        if !cur.previous_hash.matches(&prev.hash()) {
            return Err(ChainError::BrokenLink { index: cur.index });
        }
        if !pow.validate(prev.proof, cur.proof) {
            return Err(ChainError::InvalidProof {
                index: cur.index,
                last_proof: prev.proof,
                proof: cur.proof,
            });
        }
    }
    Ok(())
}

pub fn is_valid(chain: &[Block], pow: &ProofOfWork) -> bool {
    validate_chain(chain, pow).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mine::mine_block, Ledger, PreviousHash};

    fn mined_chain(blocks: usize) -> (Vec<Block>, ProofOfWork) {
        let pow = ProofOfWork::new(1).unwrap();
        let mut ledger = Ledger::new(pow);
        for i in 0..blocks.saturating_sub(1) {
            ledger.new_transaction("Alice", "Bob", i as u64 + 1);
            mine_block(&mut ledger, "miner").unwrap();
        }
        (ledger.chain().to_vec(), pow)
    }

    #[test]
    fn trivial_chains_are_valid() {
        let pow = ProofOfWork::default();
        assert!(is_valid(&[], &pow));
        assert!(is_valid(Ledger::default().chain(), &pow));
    }

    #[test]
    fn mined_chain_is_valid() {
        let (chain, pow) = mined_chain(6);
        assert_eq!(validate_chain(&chain, &pow), Ok(()));
    }

    #[test]
    fn tampered_interior_amount_is_rejected() {
        let (mut chain, pow) = mined_chain(5);
        chain[2].transactions[0].amount = 1_000_000u64.into();
        assert_eq!(
            validate_chain(&chain, &pow),
            Err(ChainError::BrokenLink { index: 4 })
        );
    }

    #[test]
    fn tampered_head_goes_unnoticed_by_linkage() {
        // Nothing links to the head, so only its own link and proof are checked.
        let (mut chain, pow) = mined_chain(3);
        let last = chain.len() - 1;
        chain[last].transactions[0].amount = 42u64.into();
        assert!(is_valid(&chain, &pow));
    }

    #[test]
    fn broken_link_is_rejected() {
        let (mut chain, pow) = mined_chain(4);
        chain[1].previous_hash = PreviousHash::Digest("00".repeat(32));
        assert_eq!(
            validate_chain(&chain, &pow),
            Err(ChainError::BrokenLink { index: 2 })
        );
    }

    #[test]
    fn unsolved_proof_is_rejected() {
        let pow = ProofOfWork::new(1).unwrap();
        let mut ledger = Ledger::new(pow);
        let bad = (0..).find(|p| !pow.validate(100, *p)).unwrap();
        ledger.new_block(bad, None).unwrap();
        assert_eq!(
            validate_chain(ledger.chain(), &pow),
            Err(ChainError::InvalidProof {
                index: 2,
                last_proof: 100,
                proof: bad,
            })
        );
    }

    #[test]
    fn validation_uses_given_difficulty() {
        let (chain, _) = mined_chain(8);
        let strict = ProofOfWork::new(6).unwrap();
        assert!(!is_valid(&chain, &strict));
    }
}
