use ledger_core::{
    mine::{seal_block, MiningTarget},
    Block, Ledger, LedgerError,
};
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::{
    config::NodeConfig,
    error::NodeError,
    peers::{PeerClient, PeerSet},
};

/// Everything a running node owns. One lock guards the ledger so the chain
/// and its pending transactions always change together.
#[derive(Debug)]
pub struct NodeState {
    node_id: String,
    ledger: Mutex<Ledger>,
    peers: Mutex<PeerSet>,
    client: PeerClient,
}

impl NodeState {
    pub fn new(config: &NodeConfig) -> Result<Self, NodeError> {
        let ledger = Ledger::new(config.proof_of_work()?);
        let mut peers = PeerSet::default();
        peers.register_all(&config.peers)?;
        if !peers.is_empty() {
            info!("seeded {} peers from configuration", peers.len());
        }
        Ok(Self {
            node_id: config.node_id.clone(),
            ledger: Mutex::new(ledger),
            peers: Mutex::new(peers),
            client: PeerClient::new(config.peer_timeout)?,
        })
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock()
    }

    pub fn peers(&self) -> MutexGuard<'_, PeerSet> {
        self.peers.lock()
    }

    pub fn client(&self) -> &PeerClient {
        &self.client
    }

    /// Mine the next block without holding the ledger lock during the proof
    /// search. If another block lands first the search restarts on the new
    /// head. Blocks the calling thread.
    pub fn mine(&self) -> Result<Block, LedgerError> {
        loop {
            let (target, pow) = {
                let ledger = self.ledger();
                (MiningTarget::of(&ledger)?, ledger.proof_of_work())
            };
            let proof = pow.find_proof(target.last_proof)?;

            let sealed = seal_block(&mut self.ledger(), &target, proof, &self.node_id)?;
            if let Some(block) = sealed {
                return Ok(block);
            }
            debug!("restarting proof search on the new head");
        }
    }
}
