use crate::id::{NodeId, TxId};

/// Transactions with equal conflict keys spend the same thing and conflict.
pub type ConflictKey = i64;

/// A vertex of the transaction DAG.
///
/// The identity, conflict key and parents never change once created. Chits and
/// confidences are observations of a particular node and are kept in its
/// [DAG][crate::graph::DAG].
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TxId,
    pub data: ConflictKey,
    pub parents: Vec<TxId>,
}

impl Transaction {
    /// Creates a transaction authored by `author`. The `nonce` must be unique per author.
    pub fn new(author: NodeId, nonce: u64, data: ConflictKey, parents: Vec<TxId>) -> Self {
        let mut hasher = blake3::Hasher::new();
        let _ = hasher.update(&author.0.to_be_bytes());
        let _ = hasher.update(&nonce.to_be_bytes());
        let _ = hasher.update(&data.to_be_bytes());
        for parent in parents.iter() {
            let _ = hasher.update(parent.as_bytes());
        }
        let id = TxId::from_hash(*hasher.finalize().as_bytes());
        Transaction { id, data, parents }
    }

    /// The parentless root every node is seeded with.
    pub fn genesis(data: ConflictKey) -> Self {
        let mut bytes = b"snowdag/genesis".to_vec();
        bytes.extend_from_slice(&data.to_be_bytes());
        Transaction { id: TxId::new(&bytes), data, parents: vec![] }
    }

    pub fn is_genesis(&self) -> bool {
        self.parents.is_empty()
    }
}

impl std::fmt::Display for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "T(id={:?}, data={}, parents={:?})", self.id, self.data, self.parents)
    }
}
