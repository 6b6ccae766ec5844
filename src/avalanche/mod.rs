//! The per-node Avalanche state machine.
//!
//! [Consensus] holds one node's view of the transaction DAG together with its conflict
//! sets, chits and confidences. It is purely synchronous, the actor wrapping it lives in
//! [network][crate::network].
mod consensus;
mod parent_selection;

pub mod conflict_map;
pub mod conflict_set;
pub mod constants;
pub mod quorum;
pub mod snapshot;
pub mod source;
pub mod tx;

pub use consensus::*;
pub use constants::*;
pub use quorum::Quorum;
pub use snapshot::{NodeSnapshot, TxSummary};
pub use source::TxSource;
pub use tx::{ConflictKey, Transaction};

use crate::graph;
use crate::id::TxId;

#[derive(Debug)]
pub enum Error {
    Graph(graph::Error),
    /// The origin of a transaction does not know one of its ancestors
    ParentNotFound(TxId),
    /// No conflict set exists for this key
    UnknownConflictKey(ConflictKey),
    UnknownTx(TxId),
}

impl std::error::Error for Error {}

impl std::convert::From<graph::Error> for Error {
    fn from(error: graph::Error) -> Self {
        Error::Graph(error)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
