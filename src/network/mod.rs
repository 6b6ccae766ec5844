//! The actor layer: every simulated node runs as an actix actor wrapping a
//! [Consensus][crate::avalanche::Consensus], the [Network] drives their voting rounds.
mod network;
mod node;
mod peers;

pub use network::*;
pub use node::*;
pub use peers::PeerSet;
