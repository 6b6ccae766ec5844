use crate::colored::Colorize;

use crate::avalanche::{ConflictKey, NodeSnapshot, Transaction};
use crate::id::{NodeId, TxId};
use crate::params::Parameters;
use crate::{Error, Result};

use super::node::*;
use super::peers::PeerSet;

use tracing::{debug, info};

use actix::{Addr, AsyncContext, Context};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};


/// A fixed set of nodes which all know each other.
pub struct Network {
    params: Parameters,
    genesis: Transaction,
    nodes: Vec<Addr<Node>>,
    /// Picks the active nodes of each round and seeds the nodes.
    rng: StdRng,
}

impl Network {
    /// Starts `node_count` nodes, each seeded with its own copy of `genesis`.
    ///
    /// Has to be called from within a running actix system.
    pub fn create(
        node_count: usize,
        genesis: Transaction,
        params: Parameters,
        seed: u64,
    ) -> Result<Network> {
        let mut rng = StdRng::seed_from_u64(seed);

        // The contexts exist before the actors so that every node knows its peers upfront
        let contexts: Vec<Context<Node>> = (0..node_count).map(|_| Context::new()).collect();
        let addrs: Vec<Addr<Node>> = contexts.iter().map(|ctx| ctx.address()).collect();

        let mut nodes = vec![];
        for (i, ctx) in contexts.into_iter().enumerate() {
            let node_id = NodeId(i as u32);
            let mut peers = PeerSet::new(node_id);
            for (j, addr) in addrs.iter().enumerate() {
                let _ = peers.insert(NodeId(j as u32), Peer::new(addr.clone()));
            }
            let node =
                Node::new(node_id, genesis.clone(), params.clone(), peers, node_count, rng.gen())?;
            nodes.push(ctx.run(node));
        }
        info!("[{}] started {} nodes, genesis = {:?}", "network".cyan(), node_count, genesis.id);
        Ok(Network { params, genesis, nodes, rng })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    pub fn genesis(&self) -> &Transaction {
        &self.genesis
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        (0..self.nodes.len()).map(|i| NodeId(i as u32)).collect()
    }

    pub fn node(&self, node_id: NodeId) -> Result<&Addr<Node>> {
        self.nodes.get(node_id.as_usize()).ok_or(Error::UnknownNode(node_id))
    }

    /// Activates `active_nodes_per_round` distinct random nodes (or all of them in a
    /// smaller network) and awaits their voting rounds, which run concurrently.
    pub async fn run_round(&mut self) -> Result<Vec<RoundSummary>> {
        let count = self.params.active_nodes_per_round.min(self.nodes.len());
        let active = rand::seq::index::sample(&mut self.rng, self.nodes.len(), count).into_vec();
        debug!("[{}] activating {:?}", "network".cyan(), active);

        let rounds = active.iter().map(|i| self.nodes[*i].send(RunVotingRound));
        let mut summaries = vec![];
        for result in futures::future::join_all(rounds).await {
            summaries.push(result??);
        }
        Ok(summaries)
    }

    /// Lets `node_id` author a transaction with the given conflict key.
    pub async fn generate_transaction(
        &self,
        node_id: NodeId,
        data: ConflictKey,
    ) -> Result<Transaction> {
        self.node(node_id)?.send(GenerateTx { data }).await?
    }

    pub async fn is_accepted(&self, node_id: NodeId, tx_id: TxId) -> Result<bool> {
        self.node(node_id)?.send(IsAccepted { tx_id }).await?
    }

    pub async fn snapshot(&self, node_id: NodeId) -> Result<NodeSnapshot> {
        self.node(node_id)?.send(GetSnapshot).await?
    }

    /// Snapshots of every node, ordered by node id.
    pub async fn snapshots(&self) -> Result<Vec<NodeSnapshot>> {
        let requests = self.nodes.iter().map(|addr| addr.send(GetSnapshot));
        let mut snapshots = vec![];
        for result in futures::future::join_all(requests).await {
            snapshots.push(result??);
        }
        Ok(snapshots)
    }
}
