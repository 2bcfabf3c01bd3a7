use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use ledger_core::{consensus, Block, ChainReport, PeerError, PreviousHash, Transaction};
use serde::{Deserialize, Serialize};
use serde_json::Number;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    error::{ApiError, ValidationError},
    state::NodeState,
};

pub type SharedState = Arc<NodeState>;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/mine", get(mine))
        .route("/transactions/new", post(new_transaction))
        .route("/chain", get(full_chain))
        .route("/nodes", get(list_nodes))
        .route("/nodes/register", post(register_nodes))
        .route("/nodes/resolve", get(resolve))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MineResponse {
    pub message: String,
    pub index: u64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: PreviousHash,
}

impl From<Block> for MineResponse {
    fn from(block: Block) -> Self {
        Self {
            message: "New block forged".into(),
            index: block.index,
            transactions: block.transactions,
            proof: block.proof,
            previous_hash: block.previous_hash,
        }
    }
}

/// Body of `POST /transactions/new`. Every field is required; they are
/// optional here so a missing one becomes a 400 naming it.
#[derive(Debug, Default, Deserialize)]
pub struct NewTransaction {
    pub sender: Option<String>,
    pub recipient: Option<String>,
    pub amount: Option<Number>,
}

impl NewTransaction {
    pub fn into_transaction(self) -> Result<Transaction, ValidationError> {
        match (self.sender, self.recipient, self.amount) {
            (Some(sender), Some(recipient), Some(amount)) => {
                Ok(Transaction::new(sender, recipient, amount))
            }
            (sender, recipient, amount) => {
                let missing = [
                    ("sender", sender.is_none()),
                    ("recipient", recipient.is_none()),
                    ("amount", amount.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, absent)| absent.then_some(name))
                .collect();
                Err(ValidationError::MissingFields(missing))
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionAccepted {
    pub message: String,
    pub index: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct RegisterNodes {
    pub nodes: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NodesRegistered {
    pub message: String,
    pub total_nodes: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NodeList {
    pub nodes: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub message: String,
    pub replaced: bool,
    #[serde(flatten)]
    pub report: ChainReport,
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

// The proof search can run for a long time, so it leaves the async workers.
async fn mine(State(state): State<SharedState>) -> Result<Json<MineResponse>, ApiError> {
    let worker = Arc::clone(&state);
    let block = tokio::task::spawn_blocking(move || worker.mine()).await??;
    Ok(Json(block.into()))
}

async fn new_transaction(
    State(state): State<SharedState>,
    payload: Result<Json<NewTransaction>, JsonRejection>,
) -> Result<(StatusCode, Json<TransactionAccepted>), ApiError> {
    let Json(payload) = payload?;
    let tx = payload.into_transaction()?;
    let index = state
        .ledger()
        .new_transaction(tx.sender, tx.recipient, tx.amount);
    Ok((
        StatusCode::CREATED,
        Json(TransactionAccepted {
            message: format!("Transaction will be added to Block {index}"),
            index,
        }),
    ))
}

async fn full_chain(State(state): State<SharedState>) -> Json<ChainReport> {
    Json(state.ledger().report())
}

async fn list_nodes(State(state): State<SharedState>) -> Json<NodeList> {
    Json(NodeList {
        nodes: state.peers().sorted(),
    })
}

async fn register_nodes(
    State(state): State<SharedState>,
    payload: Result<Json<RegisterNodes>, JsonRejection>,
) -> Result<(StatusCode, Json<NodesRegistered>), ApiError> {
    let Json(payload) = payload?;
    let nodes = payload
        .nodes
        .filter(|nodes| !nodes.is_empty())
        .ok_or(ValidationError::MissingNodes)?;

    let total_nodes = {
        let mut peers = state.peers();
        let added = peers.register_all(&nodes)?;
        info!("registered {added} new peers ({} known)", peers.len());
        peers.sorted()
    };
    Ok((
        StatusCode::CREATED,
        Json(NodesRegistered {
            message: "New nodes have been added".into(),
            total_nodes,
        }),
    ))
}

// Peers are read concurrently without the lock; validation and the swap then
// happen under it in one step.
async fn resolve(State(state): State<SharedState>) -> Json<ResolveResponse> {
    let peers = state.peers().sorted();
    let fetched = state.client().fetch_all(peers).await;
    let order: Vec<String> = fetched.iter().map(|(peer, _)| peer.clone()).collect();
    let mut reports: HashMap<String, Result<ChainReport, PeerError>> =
        fetched.into_iter().collect();

    let mut ledger = state.ledger();
    let replaced = consensus::resolve(&mut ledger, &order, |peer: &str| {
        reports.remove(peer).unwrap_or_else(|| {
            Err(PeerError::Unreachable {
                peer: peer.to_string(),
                reason: "no response collected".into(),
            })
        })
    });
    let message = if replaced {
        "Our chain was replaced"
    } else {
        "Our chain is authoritative"
    };
    Json(ResolveResponse {
        message: message.into(),
        replaced,
        report: ledger.report(),
    })
}
