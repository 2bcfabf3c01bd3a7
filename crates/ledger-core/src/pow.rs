use rayon::prelude::*;

use crate::{
    constants::{HASH_HEX_SIZE, POW_DIFFICULTY, POW_PARALLEL_BATCH},
    error::PowError,
    hasher::digest_hex,
};

/// The work puzzle: find `proof` such that `sha256("{last_proof}{proof}")`
/// starts with `difficulty` hex zeros.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProofOfWork {
    difficulty: usize,
    parallel: bool,
}

impl Default for ProofOfWork {
    fn default() -> Self {
        Self {
            difficulty: POW_DIFFICULTY,
            parallel: false,
        }
    }
}

impl ProofOfWork {
    pub fn new(difficulty: usize) -> Result<Self, PowError> {
        if !(1..=HASH_HEX_SIZE).contains(&difficulty) {
            return Err(PowError::DifficultyOutOfRange(difficulty));
        }
        Ok(Self {
            difficulty,
            parallel: false,
        })
    }

    /// Spread the search over the rayon pool. The result is identical to the
    /// linear scan.
    pub fn with_parallel_search(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    pub fn validate(&self, last_proof: u64, proof: u64) -> bool {
        let guess = format!("{last_proof}{proof}");
        count_leading_zero_hex(&digest_hex(guess.as_bytes())) >= self.difficulty
    }

    /// Smallest non-negative `proof` accepted by [`ProofOfWork::validate`].
    /// Unbounded; there is no cancellation.
    pub fn find_proof(&self, last_proof: u64) -> Result<u64, PowError> {
        if self.parallel {
            self.search_parallel(last_proof)
        } else {
            self.search_linear(last_proof)
        }
    }

    fn search_linear(&self, last_proof: u64) -> Result<u64, PowError> {
        (0..=u64::MAX)
            .find(|proof| self.validate(last_proof, *proof))
            .ok_or(PowError::Exhausted { last_proof })
    }

    // Batches are scanned in order and `find_first` keeps the leftmost hit,
    // so the answer is still the smallest proof.
    fn search_parallel(&self, last_proof: u64) -> Result<u64, PowError> {
        let mut start = 0u64;
        loop {
            let end = start.saturating_add(POW_PARALLEL_BATCH);
            let hit = (start..end)
                .into_par_iter()
                .find_first(|proof| self.validate(last_proof, *proof));
            if let Some(proof) = hit {
                return Ok(proof);
            }
            if end == u64::MAX {
                return if self.validate(last_proof, u64::MAX) {
                    Ok(u64::MAX)
                } else {
                    Err(PowError::Exhausted { last_proof })
                };
            }
            start = end;
        }
    }
}

pub fn count_leading_zero_hex(digest: &str) -> usize {
    digest.bytes().take_while(|b| *b == b'0').count()
}
