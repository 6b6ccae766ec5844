use crate::id::NodeId;

use std::collections::HashSet;

// A quorum collects the votes of one k-sample, at most one per peer.

#[derive(Debug, Clone)]
pub struct Quorum {
    pub ids: HashSet<NodeId>,
    pub votes: Vec<bool>,
}

impl std::fmt::Display for Quorum {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(fmt, "Q {}/{}", self.positive(), self.votes.len())
    }
}

impl Quorum {
    pub fn new() -> Quorum {
        Quorum { ids: HashSet::new(), votes: vec![] }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn insert(&mut self, observer_id: NodeId, vote: bool) {
        if self.ids.insert(observer_id) {
            self.votes.push(vote);
        }
    }

    /// Number of votes in favour
    pub fn positive(&self) -> usize {
        self.votes.iter().filter(|v| **v).count()
    }

    /// Whether the votes in favour reach `alpha * k` (compared as real numbers).
    pub fn decide(&self, alpha: f64, k: usize) -> bool {
        self.positive() >= threshold(alpha, k)
    }
}

/// Smallest vote count which is not below `alpha * k`.
///
/// A small epsilon absorbs the representation error of `alpha`, e.g. `0.8 * 10` must
/// require 8 votes and not 9.
pub fn threshold(alpha: f64, k: usize) -> usize {
    (alpha * k as f64 - 1e-9).ceil().max(0.0) as usize
}
