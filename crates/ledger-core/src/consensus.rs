//! Longest-valid-chain conflict resolution.
//!
//! A candidate only wins on length; there is no accumulated-work metric, so a
//! peer that forks from genesis with different transactions is adopted as
//! long as its chain is longer and internally consistent.

use tracing::{debug, info, warn};

use crate::{
    error::{ChainError, PeerError},
    pow::ProofOfWork,
    validation::validate_chain,
    ChainReport, Ledger,
};

/// Source of peers' chains.
pub trait ChainFetcher {
    fn fetch(&mut self, peer: &str) -> Result<ChainReport, PeerError>;
}

impl<F> ChainFetcher for F
where
    F: FnMut(&str) -> Result<ChainReport, PeerError>,
{
    fn fetch(&mut self, peer: &str) -> Result<ChainReport, PeerError> {
        self(peer)
    }
}

/// Check a fetched report before it may replace the local chain: the
/// reported length must match, indices must run 1..=N, and every link and
/// proof must hold.
pub fn check_candidate(report: &ChainReport, pow: &ProofOfWork) -> Result<(), ChainError> {
    if report.length != report.chain.len() {
        return Err(ChainError::LengthMismatch {
            reported: report.length,
            actual: report.chain.len(),
        });
    }
    if report.chain.is_empty() {
        return Err(ChainError::Empty);
    }
    for (position, block) in (1u64..).zip(&report.chain) {
        if block.index != position {
            return Err(ChainError::OutOfSequence {
                position: position as usize,
                index: block.index,
            });
        }
    }
    validate_chain(&report.chain, pow)
}

/// Query every peer and adopt the longest valid chain strictly longer than the
/// local one. Returns `true` if the local chain was replaced.
///
/// Unreachable peers and invalid candidates are skipped. On equal lengths the
/// first peer in iteration order wins.
pub fn resolve<I, S, F>(ledger: &mut Ledger, peers: I, mut fetcher: F) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    F: ChainFetcher,
{
    let pow = ledger.proof_of_work();
    let mut best_len = ledger.len();
    let mut best = None;

    for peer in peers {
        let peer = peer.as_ref();
        let report = match fetcher.fetch(peer) {
            Ok(report) => report,
            Err(err) => {
                warn!("skipping peer: {err}");
                continue;
            }
        };
        if report.length <= best_len {
            debug!(
                "peer {peer} reports length {}, not longer than {best_len}",
                report.length
            );
            continue;
        }
        if let Err(err) = check_candidate(&report, &pow) {
            debug!("discarding chain from {peer}: {err}");
            continue;
        }
        best_len = report.length;
        best = Some((peer.to_string(), report.chain));
    }

    match best {
        Some((peer, chain)) => {
            let (ours, theirs) = (ledger.len(), chain.len());
            match ledger.replace_chain(chain) {
                Ok(()) => {
                    info!("replaced local chain of {ours} blocks with {theirs} blocks from {peer}");
                    true
                }
                Err(err) => {
                    warn!("could not adopt chain from {peer}: {err}");
                    false
                }
            }
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mine::mine_block, Block, PreviousHash};
    use std::collections::HashMap;

    fn pow() -> ProofOfWork {
        ProofOfWork::new(1).unwrap()
    }

    fn ledger_with(blocks: usize, miner: &str) -> Ledger {
        let mut ledger = Ledger::new(pow());
        while ledger.len() < blocks {
            mine_block(&mut ledger, miner).unwrap();
        }
        ledger
    }

    fn report(chain: Vec<Block>) -> ChainReport {
        ChainReport {
            length: chain.len(),
            chain,
        }
    }

    fn fetcher(
        mut peers: HashMap<&'static str, ChainReport>,
    ) -> impl FnMut(&str) -> Result<ChainReport, PeerError> {
        move |peer: &str| {
            peers.remove(peer).ok_or_else(|| PeerError::Unreachable {
                peer: peer.to_string(),
                reason: "connection refused".into(),
            })
        }
    }

    #[test]
    fn adopts_longest_valid_and_rejects_broken() {
        let mut local = ledger_with(3, "local");

        let mut broken = ledger_with(5, "peer-a").chain().to_vec();
        broken[3].previous_hash = PreviousHash::Digest("ab".repeat(32));
        let valid = ledger_with(4, "peer-b").chain().to_vec();

        let peers = HashMap::from([
            ("peer-a:5000", report(broken)),
            ("peer-b:5000", report(valid.clone())),
        ]);
        let replaced = resolve(&mut local, ["peer-a:5000", "peer-b:5000"], fetcher(peers));

        assert!(replaced);
        assert_eq!(local.chain(), valid.as_slice());
    }

    #[test]
    fn keeps_local_when_nothing_longer() {
        let mut local = ledger_with(3, "local");
        let before = local.chain().to_vec();
        let peers = HashMap::from([
            ("a:1", report(ledger_with(3, "a").chain().to_vec())),
            ("b:1", report(ledger_with(2, "b").chain().to_vec())),
        ]);
        assert!(!resolve(&mut local, ["a:1", "b:1"], fetcher(peers)));
        assert_eq!(local.chain(), before.as_slice());
    }

    #[test]
    fn unreachable_peers_are_skipped() {
        let mut local = ledger_with(2, "local");
        let longer = ledger_with(4, "b").chain().to_vec();
        let peers = HashMap::from([("b:1", report(longer.clone()))]);
        let replaced = resolve(&mut local, ["down:1", "b:1", "gone:1"], fetcher(peers));
        assert!(replaced);
        assert_eq!(local.len(), 4);
    }

    #[test]
    fn all_peers_unreachable_is_not_an_error() {
        let mut local = ledger_with(2, "local");
        assert!(!resolve(&mut local, ["x:1", "y:1"], fetcher(HashMap::new())));
        assert_eq!(local.len(), 2);
    }

    #[test]
    fn no_peers_means_no_replacement() {
        let mut local = Ledger::new(pow());
        assert!(!resolve(&mut local, Vec::<String>::new(), fetcher(HashMap::new())));
    }

    #[test]
    fn longest_of_several_valid_candidates_wins() {
        let mut local = ledger_with(2, "local");
        let four = ledger_with(4, "four").chain().to_vec();
        let six = ledger_with(6, "six").chain().to_vec();
        let peers = HashMap::from([("four:1", report(four)), ("six:1", report(six.clone()))]);
        assert!(resolve(&mut local, ["six:1", "four:1"], fetcher(peers)));
        assert_eq!(local.chain(), six.as_slice());
    }

    #[test]
    fn inflated_length_is_rejected() {
        let mut local = ledger_with(2, "local");
        let mut lying = report(ledger_with(3, "liar").chain().to_vec());
        lying.length = 10;
        assert_eq!(
            check_candidate(&lying, &pow()),
            Err(ChainError::LengthMismatch {
                reported: 10,
                actual: 3
            })
        );
        let peers = HashMap::from([("liar:1", lying)]);
        assert!(!resolve(&mut local, ["liar:1"], fetcher(peers)));
    }

    #[test]
    fn pending_transactions_survive_replacement() {
        let mut local = ledger_with(2, "local");
        local.new_transaction("Alice", "Bob", 5u64);
        let peers = HashMap::from([("b:1", report(ledger_with(3, "b").chain().to_vec()))]);
        assert!(resolve(&mut local, ["b:1"], fetcher(peers)));
        assert_eq!(local.pending().len(), 1);
        assert_eq!(local.new_transaction("Carol", "Dave", 1u64), 4);
    }

    #[test]
    fn out_of_sequence_index_is_rejected() {
        let mut local = ledger_with(2, "local");
        let mut forged = ledger_with(3, "forger").chain().to_vec();
        // Nothing links to the head, so its index can change without
        // breaking a hash link or a proof.
        forged[2].index = u64::MAX;
        let forged = report(forged);
        assert_eq!(
            check_candidate(&forged, &pow()),
            Err(ChainError::OutOfSequence {
                position: 3,
                index: u64::MAX
            })
        );

        let peers = HashMap::from([("forger:1", forged)]);
        assert!(!resolve(&mut local, ["forger:1"], fetcher(peers)));
        assert_eq!(local.new_transaction("a", "b", 1u64), 3);
    }

    #[test]
    fn gaps_and_empty_candidates_are_rejected() {
        let mut gapped = ledger_with(3, "gap").chain().to_vec();
        gapped[2].index = 4;
        assert_eq!(
            check_candidate(&report(gapped), &pow()),
            Err(ChainError::OutOfSequence {
                position: 3,
                index: 4
            })
        );
        assert_eq!(
            check_candidate(&report(Vec::new()), &pow()),
            Err(ChainError::Empty)
        );
    }
}
