pub const DEFAULT_LISTEN: &str = "127.0.0.1:5000";
pub const DEFAULT_PEER_TIMEOUT_MS: u64 = 5_000;
