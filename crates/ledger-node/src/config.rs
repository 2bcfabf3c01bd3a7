use std::{net::SocketAddr, time::Duration};

use clap::Parser;
use ledger_core::{constants::POW_DIFFICULTY, PowError, ProofOfWork};

use crate::constants::{DEFAULT_LISTEN, DEFAULT_PEER_TIMEOUT_MS};

#[derive(Parser, Debug, Clone)]
#[command(name = "ledger-node")]
#[command(about = "Proof-of-work ledger node with longest-chain consensus")]
pub struct Args {
    /// Address to listen on, e.g. 127.0.0.1:5000
    #[arg(long, env = "LEDGER_LISTEN", default_value = DEFAULT_LISTEN)]
    pub listen: SocketAddr,

    /// Leading hex zeros a proof must produce
    #[arg(long, env = "LEDGER_DIFFICULTY", default_value_t = POW_DIFFICULTY)]
    pub difficulty: usize,

    /// Identifier credited with mining rewards (random when omitted)
    #[arg(long, env = "LEDGER_NODE_ID")]
    pub node_id: Option<String>,

    /// Peer to register at startup; repeat or comma-separate for several
    #[arg(long = "peer", env = "LEDGER_PEERS", value_delimiter = ',')]
    pub peers: Vec<String>,

    /// Per-peer timeout when fetching chains during consensus
    #[arg(long, env = "LEDGER_PEER_TIMEOUT_MS", default_value_t = DEFAULT_PEER_TIMEOUT_MS)]
    pub peer_timeout_ms: u64,

    /// Search proofs on all cores
    #[arg(long, env = "LEDGER_PARALLEL_POW")]
    pub parallel_pow: bool,
}

/// Full configuration for a [`crate::NodeState`].
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub listen: SocketAddr,
    pub difficulty: usize,
    pub node_id: String,
    pub peers: Vec<String>,
    pub peer_timeout: Duration,
    pub parallel_pow: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 5000)),
            difficulty: POW_DIFFICULTY,
            node_id: random_node_id(),
            peers: Vec::new(),
            peer_timeout: Duration::from_millis(DEFAULT_PEER_TIMEOUT_MS),
            parallel_pow: false,
        }
    }
}

impl From<Args> for NodeConfig {
    fn from(args: Args) -> Self {
        Self {
            listen: args.listen,
            difficulty: args.difficulty,
            node_id: args.node_id.unwrap_or_else(random_node_id),
            peers: args.peers,
            peer_timeout: Duration::from_millis(args.peer_timeout_ms),
            parallel_pow: args.parallel_pow,
        }
    }
}

impl NodeConfig {
    /// Config with a low difficulty, for tests and local demos.
    pub fn with_difficulty(difficulty: usize) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }

    pub fn proof_of_work(&self) -> Result<ProofOfWork, PowError> {
        Ok(ProofOfWork::new(self.difficulty)?.with_parallel_search(self.parallel_pow))
    }
}

/// Dash-less UUIDv4.
pub fn random_node_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
