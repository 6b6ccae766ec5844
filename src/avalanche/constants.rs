// Safety parameters

/// Fraction of a sample that must vote in favour for a query to succeed
pub const ALPHA: f64 = 0.8;
/// Confidence needed to accept a transaction without known conflicts
pub const BETA1: u32 = 5;
/// Consecutive re-confirmations needed to accept a contested transaction
pub const BETA2: u32 = 5;

// Sampling

/// Minimal number of peers sampled per query
pub const K_BASE: usize = 5;
/// One extra peer is sampled per `K_NETWORK_DIVISOR` nodes in the network
pub const K_NETWORK_DIVISOR: usize = 100;

// Parent selection

/// Number of most recently received transactions the fallback picks from
pub const FALLBACK_POOL: usize = 5;
/// Number of parents the fallback picks
pub const FALLBACK_PICKS: usize = 2;

// Network

/// Conflict key reserved for the genesis transaction
pub const GENESIS_DATA: i64 = -1;
/// Number of nodes running a voting round per network round
pub const ACTIVE_NODES_PER_ROUND: usize = 20;
/// Timeout for answering a `QueryTx` message
pub const QUERY_RESPONSE_TIMEOUT_MS: u64 = 5000;
