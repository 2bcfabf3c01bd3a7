use thiserror::Error;

use crate::constants::HASH_HEX_SIZE;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PowError {
    #[error("difficulty {0} is outside 1..={HASH_HEX_SIZE}")]
    DifficultyOutOfRange(usize),

    #[error("no proof found for last proof {last_proof}")]
    Exhausted { last_proof: u64 },
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("chain is empty")]
    EmptyChain,

    #[error(transparent)]
    Pow(#[from] PowError),
}

/// Why a candidate chain was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("block {index} does not link to the hash of its predecessor")]
    BrokenLink { index: u64 },

    #[error("block {index} carries proof {proof} which does not solve last proof {last_proof}")]
    InvalidProof {
        index: u64,
        last_proof: u64,
        proof: u64,
    },

    #[error("peer reported length {reported} but sent {actual} blocks")]
    LengthMismatch { reported: usize, actual: usize },

    #[error("chain has no blocks")]
    Empty,

    #[error("block at position {position} carries index {index}")]
    OutOfSequence { position: usize, index: u64 },
}

#[derive(Debug, Error)]
pub enum PeerError {
    #[error("peer {peer} unreachable: {reason}")]
    Unreachable { peer: String, reason: String },

    #[error("peer {peer} answered with status {status}")]
    BadStatus { peer: String, status: u16 },

    #[error("peer {peer} sent a malformed chain: {reason}")]
    Malformed { peer: String, reason: String },
}
