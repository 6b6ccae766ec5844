use super::tx::ConflictKey;

use crate::id::{NodeId, TxId};

/// The consensus state of one transaction as observed by one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxSummary {
    pub id: TxId,
    pub data: ConflictKey,
    pub parents: Vec<TxId>,
    /// `None` until the node queried the transaction
    pub chit: Option<u8>,
    pub confidence: u32,
    pub preferred: bool,
    pub conflict_set_size: usize,
    pub accepted: bool,
}

/// A read-only copy of a node's view, in the order the node stored the transactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub node_id: NodeId,
    pub txs: Vec<TxSummary>,
}

impl NodeSnapshot {
    pub fn get(&self, id: &TxId) -> Option<&TxSummary> {
        self.txs.iter().find(|tx| tx.id == *id)
    }

    pub fn accepted_count(&self) -> usize {
        self.txs.iter().filter(|tx| tx.accepted).count()
    }

    /// Fraction of the known transactions which are accepted.
    pub fn fraction_accepted(&self) -> f64 {
        if self.txs.is_empty() {
            return 0.0;
        }
        self.accepted_count() as f64 / self.txs.len() as f64
    }
}
