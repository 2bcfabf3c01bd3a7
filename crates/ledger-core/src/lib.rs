//! Core state machine of the ledger: blocks, hashing, proof-of-work, chain
//! validation and longest-valid-chain consensus.
//!
//! Nothing in this crate performs network I/O. Peers are reached through the
//! [`consensus::ChainFetcher`] seam, which the node crate implements over HTTP.

pub mod consensus;
pub mod constants;
pub mod error;
pub mod hasher;
pub mod ledger;
pub mod mine;
pub mod pow;
pub mod validation;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Number;

pub use error::{ChainError, LedgerError, PeerError, PowError};
pub use ledger::Ledger;
pub use pow::ProofOfWork;

use crate::constants::GENESIS_PREVIOUS_HASH;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: Number,
}

impl Transaction {
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: impl Into<Number>,
    ) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount: amount.into(),
        }
    }
}

/// Link from a block to its predecessor.
///
/// The genesis block carries the bare integer `1` on the wire instead of a
/// digest; every other block carries the hex digest of the block before it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPreviousHash", into = "RawPreviousHash")]
pub enum PreviousHash {
    Genesis,
    Digest(String),
}

impl PreviousHash {
    /// True when this link is a digest equal to `digest`. The genesis sentinel
    /// never matches.
    pub fn matches(&self, digest: &str) -> bool {
        matches!(self, PreviousHash::Digest(d) if d == digest)
    }
}

impl fmt::Display for PreviousHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreviousHash::Genesis => write!(f, "{GENESIS_PREVIOUS_HASH}"),
            PreviousHash::Digest(d) => f.write_str(d),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawPreviousHash {
    Sentinel(u64),
    Digest(String),
}

impl TryFrom<RawPreviousHash> for PreviousHash {
    type Error = String;

    fn try_from(raw: RawPreviousHash) -> Result<Self, Self::Error> {
        match raw {
            RawPreviousHash::Sentinel(GENESIS_PREVIOUS_HASH) => Ok(PreviousHash::Genesis),
            RawPreviousHash::Sentinel(other) => Err(format!(
                "previous_hash must be a digest string or the genesis sentinel {GENESIS_PREVIOUS_HASH}, got {other}"
            )),
            RawPreviousHash::Digest(d) => Ok(PreviousHash::Digest(d)),
        }
    }
}

impl From<PreviousHash> for RawPreviousHash {
    fn from(link: PreviousHash) -> Self {
        match link {
            PreviousHash::Genesis => RawPreviousHash::Sentinel(GENESIS_PREVIOUS_HASH),
            PreviousHash::Digest(d) => RawPreviousHash::Digest(d),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: PreviousHash,
}

impl Block {
    /// Hex SHA-256 of the block's key-sorted JSON form.
    pub fn hash(&self) -> String {
        hasher::hash_block(self)
    }
}

/// A node's full chain as served over the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainReport {
    pub chain: Vec<Block>,
    pub length: usize,
}
