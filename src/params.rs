use config::{Config, ConfigError, File};
use serde::Deserialize;

use std::time::Duration;

use crate::avalanche::constants::*;
use crate::avalanche::quorum;
use crate::avalanche::ConflictKey;

// For explanation, see issue: https://github.com/serde-rs/serde/issues/368
fn default_alpha() -> f64 {
    ALPHA
}
fn default_k_base() -> usize {
    K_BASE
}
fn default_k_network_divisor() -> usize {
    K_NETWORK_DIVISOR
}
fn default_beta1() -> u32 {
    BETA1
}
fn default_beta2() -> u32 {
    BETA2
}
fn default_fallback_pool() -> usize {
    FALLBACK_POOL
}
fn default_fallback_picks() -> usize {
    FALLBACK_PICKS
}
fn default_genesis_data() -> ConflictKey {
    GENESIS_DATA
}
fn default_active_nodes_per_round() -> usize {
    ACTIVE_NODES_PER_ROUND
}
fn default_query_timeout_ms() -> u64 {
    QUERY_RESPONSE_TIMEOUT_MS
}

/// Tunable protocol and simulation parameters.
///
/// Every field is optional in a parameter file, missing ones take the values from
/// [constants][crate::avalanche::constants].
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Parameters {
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(default = "default_k_base")]
    pub k_base: usize,
    #[serde(default = "default_k_network_divisor")]
    pub k_network_divisor: usize,
    #[serde(default = "default_beta1")]
    pub beta1: u32,
    #[serde(default = "default_beta2")]
    pub beta2: u32,
    #[serde(default = "default_fallback_pool")]
    pub fallback_pool: usize,
    #[serde(default = "default_fallback_picks")]
    pub fallback_picks: usize,
    #[serde(default = "default_genesis_data")]
    pub genesis_data: ConflictKey,
    #[serde(default = "default_active_nodes_per_round")]
    pub active_nodes_per_round: usize,
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            alpha: ALPHA,
            k_base: K_BASE,
            k_network_divisor: K_NETWORK_DIVISOR,
            beta1: BETA1,
            beta2: BETA2,
            fallback_pool: FALLBACK_POOL,
            fallback_picks: FALLBACK_PICKS,
            genesis_data: GENESIS_DATA,
            active_nodes_per_round: ACTIVE_NODES_PER_ROUND,
            query_timeout_ms: QUERY_RESPONSE_TIMEOUT_MS,
        }
    }
}

impl Parameters {
    /// Loads parameters from a file (toml, json, yaml ... picked by extension).
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Config::builder().add_source(File::with_name(path)).build()?.try_deserialize()
    }

    /// Number of peers sampled per query in a network of `network_size` nodes.
    pub fn sample_size(&self, network_size: usize) -> usize {
        self.k_base + network_size / self.k_network_divisor.max(1)
    }

    /// Votes in favour needed out of a sample of `k`.
    pub fn quorum_threshold(&self, k: usize) -> usize {
        quorum::threshold(self.alpha, k)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}
