use std::{collections::HashSet, time::Duration};

use ledger_core::{ChainReport, PeerError};
use reqwest::{Client, Url};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::error::ValidationError;

/// Reduce a peer address to `host:port`.
///
/// Accepts `http` URLs (`http://10.0.0.5:5000/`) as well as bare `host:port`.
/// A missing port falls back to 80. Peers are always fetched over plain HTTP,
/// so any other scheme is rejected.
pub fn normalize_address(address: &str) -> Result<String, ValidationError> {
    let invalid = |reason: String| ValidationError::InvalidAddress {
        address: address.to_string(),
        reason,
    };

    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(invalid("empty address".into()));
    }
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };
    let url = Url::parse(&with_scheme).map_err(|e| invalid(e.to_string()))?;
    if url.scheme() != "http" {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }
    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| invalid("missing host".into()))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| invalid("missing port".into()))?;
    Ok(format!("{host}:{port}"))
}

/// Known peers, deduplicated by normalized address. Unordered.
#[derive(Debug, Default, Clone)]
pub struct PeerSet {
    peers: HashSet<String>,
}

impl PeerSet {
    /// Add one peer. Returns `false` if it was already known.
    pub fn register(&mut self, address: &str) -> Result<bool, ValidationError> {
        let normalized = normalize_address(address)?;
        Ok(self.peers.insert(normalized))
    }

    /// Add several peers, all or nothing: one invalid address rejects the lot.
    /// Returns how many were new.
    pub fn register_all<I, S>(&mut self, addresses: I) -> Result<usize, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let normalized = addresses
            .into_iter()
            .map(|a| normalize_address(a.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        let mut added = 0;
        for peer in normalized {
            if self.peers.insert(peer) {
                added += 1;
            }
        }
        Ok(added)
    }

    pub fn contains(&self, address: &str) -> bool {
        self.peers.contains(address)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.peers.iter().map(String::as_str)
    }

    /// Snapshot in lexical order, for stable output.
    pub fn sorted(&self) -> Vec<String> {
        let mut peers: Vec<String> = self.peers.iter().cloned().collect();
        peers.sort();
        peers
    }
}

/// HTTP client for reading peers' `/chain`.
#[derive(Debug, Clone)]
pub struct PeerClient {
    http: Client,
}

impl PeerClient {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    pub async fn fetch_chain(&self, peer: &str) -> Result<ChainReport, PeerError> {
        let res = self
            .http
            .get(format!("http://{peer}/chain"))
            .send()
            .await
            .map_err(|e| PeerError::Unreachable {
                peer: peer.to_string(),
                reason: e.to_string(),
            })?;
        let status = res.status();
        if !status.is_success() {
            return Err(PeerError::BadStatus {
                peer: peer.to_string(),
                status: status.as_u16(),
            });
        }
        let report = res
            .json::<ChainReport>()
            .await
            .map_err(|e| PeerError::Malformed {
                peer: peer.to_string(),
                reason: e.to_string(),
            })?;
        debug!("fetched {} blocks from {peer}", report.chain.len());
        Ok(report)
    }

    /// Fetch every peer concurrently. Results come back in completion order.
    pub async fn fetch_all(
        &self,
        peers: Vec<String>,
    ) -> Vec<(String, Result<ChainReport, PeerError>)> {
        let mut tasks = JoinSet::new();
        for peer in peers {
            let client = self.clone();
            tasks.spawn(async move {
                let result = client.fetch_chain(&peer).await;
                (peer, result)
            });
        }

        let mut results = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(pair) => results.push(pair),
                Err(err) => warn!("peer fetch task failed: {err}"),
            }
        }
        results
    }
}
