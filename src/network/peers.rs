use crate::id::NodeId;

use rand::seq::SliceRandom;
use rand::Rng;

use std::collections::HashMap;

/// The peers a node samples its queries from.
///
/// The owning node is never a member, inserting it is refused, so a node cannot end up
/// voting on its own transactions.
#[derive(Clone)]
pub struct PeerSet<P: Clone> {
    self_id: NodeId,
    peers: HashMap<NodeId, P>,
    /// Member ids in ascending order, sampling walks this to stay reproducible
    ids: Vec<NodeId>,
}

impl<P: Clone> std::ops::Deref for PeerSet<P> {
    type Target = HashMap<NodeId, P>;

    fn deref(&self) -> &'_ Self::Target {
        &self.peers
    }
}

impl<P: Clone> PeerSet<P> {
    pub fn new(self_id: NodeId) -> Self {
        PeerSet { self_id, peers: HashMap::default(), ids: vec![] }
    }

    /// Adds a peer. Returns `false` for the owner itself or an id already present.
    pub fn insert(&mut self, id: NodeId, peer: P) -> bool {
        if id == self.self_id || self.peers.contains_key(&id) {
            return false;
        }
        let _ = self.peers.insert(id, peer);
        let pos = self.ids.binary_search(&id).unwrap_or_else(|e| e);
        self.ids.insert(pos, id);
        true
    }

    /// Returns `k` distinct peers picked uniformly at random, or all of them if there are
    /// fewer than `k`.
    pub fn sample<R: Rng + ?Sized>(&self, k: usize, rng: &mut R) -> Vec<(NodeId, P)> {
        self.ids
            .choose_multiple(rng, k)
            .filter_map(|id| self.peers.get(id).map(|p| (*id, p.clone())))
            .collect()
    }
}
