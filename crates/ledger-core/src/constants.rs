pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
pub const POW_DIFFICULTY: usize = 4;
pub const POW_PARALLEL_BATCH: u64 = 1 << 14;
pub const GENESIS_PROOF: u64 = 100;
pub const GENESIS_PREVIOUS_HASH: u64 = 1;
pub const MINING_SENDER: &str = "0";
pub const MINING_REWARD: u64 = 1;
