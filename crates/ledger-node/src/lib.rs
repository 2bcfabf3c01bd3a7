//! HTTP node around [`ledger_core`]: mining, transactions, peer registry and
//! consensus over `/chain`.

pub mod api;
pub mod config;
pub mod constants;
pub mod error;
pub mod peers;
pub mod state;

pub use api::router;
pub use config::{Args, NodeConfig};
pub use error::{ApiError, NodeError, ValidationError};
pub use peers::{PeerClient, PeerSet};
pub use state::NodeState;
