use crate::colored::{ColoredString, Colorize};

use crate::avalanche::{Consensus, ConflictKey, NodeSnapshot, Quorum, Transaction, TxSource};
use crate::id::{NodeId, TxId};
use crate::params::Parameters;
use crate::{Error, Result};

use super::peers::PeerSet;

use tracing::{debug, error, info};

use actix::{Actor, Addr, Context, Handler, Recipient};
use actix::{ActorFutureExt, ResponseActFuture};

use rand::rngs::StdRng;
use rand::SeedableRng;

use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// The handles through which a node reaches one of its peers.
#[derive(Clone)]
pub struct Peer {
    pub query: Recipient<QueryTx>,
    pub fetch: Recipient<FetchTxs>,
}

impl Peer {
    pub fn new<A>(addr: Addr<A>) -> Self
    where
        A: Actor<Context = Context<A>> + Handler<QueryTx> + Handler<FetchTxs>,
    {
        Peer { query: addr.clone().recipient(), fetch: addr.recipient() }
    }
}

/// A simulated participant: owns one consensus view and answers its peers' queries.
pub struct Node {
    /// The identity of this node.
    node_id: NodeId,
    /// The local view and its consensus state.
    consensus: Consensus,
    /// Every other node in the network.
    peers: PeerSet<Peer>,
    /// Number of nodes in the network, used to size the query sample.
    network_size: usize,
    /// Transactions whose query was sent but not yet applied.
    in_flight: HashSet<TxId>,
    rng: StdRng,
}

impl Node {
    pub fn new(
        node_id: NodeId,
        genesis: Transaction,
        params: Parameters,
        peers: PeerSet<Peer>,
        network_size: usize,
        seed: u64,
    ) -> Result<Self> {
        Ok(Node {
            node_id,
            consensus: Consensus::new(node_id, genesis, params)?,
            peers,
            network_size,
            in_flight: HashSet::new(),
            rng: StdRng::seed_from_u64(seed),
        })
    }

    fn tag(&self) -> ColoredString {
        self.node_id.to_string().as_str().cyan()
    }
}

impl Actor for Node {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Context<Self>) {
        debug!("[{}] started with {} peers", self.tag(), self.peers.len());
    }
}

/// Pulls every ancestor of a queried transaction which is missing from `known`, frontier
/// by frontier, from the node which sent the query.
async fn fetch_ancestry(
    origin_id: NodeId,
    origin: Option<Recipient<FetchTxs>>,
    parents: Vec<TxId>,
    known: HashSet<TxId>,
    timeout: Duration,
) -> Result<HashMap<TxId, Transaction>> {
    let mut batch: HashMap<TxId, Transaction> = HashMap::new();
    let mut wanted: Vec<TxId> = parents.into_iter().filter(|id| !known.contains(id)).collect();
    while !wanted.is_empty() {
        let origin = origin.as_ref().ok_or(Error::UnknownNode(origin_id))?;
        let reply = tokio::time::timeout(timeout, origin.send(FetchTxs { ids: wanted })).await?;
        let txs = reply??;

        let mut next: Vec<TxId> = txs.iter().flat_map(|tx| tx.parents.iter().cloned()).collect();
        for tx in txs.into_iter() {
            let _ = batch.insert(tx.id, tx);
        }
        next.sort();
        next.dedup();
        wanted = next.into_iter().filter(|id| !known.contains(id) && !batch.contains_key(id)).collect();
    }
    Ok(batch)
}

// Queries. The query carries the id of its sender, a node which knows the whole ancestry
// of the transaction, so the responder can catch up before it votes.

#[derive(Debug, Clone, Serialize, Deserialize, Message)]
#[rtype(result = "QueryTxAck")]
pub struct QueryTx {
    pub tx: Transaction,
    pub origin: NodeId,
}

#[derive(Debug, Clone, Serialize, Deserialize, MessageResponse)]
pub struct QueryTxAck {
    pub id: NodeId,
    pub tx_id: TxId,
    pub outcome: bool,
}

impl Handler<QueryTx> for Node {
    type Result = ResponseActFuture<Self, QueryTxAck>;

    fn handle(&mut self, msg: QueryTx, _ctx: &mut Context<Self>) -> Self::Result {
        debug!("[{}] received query for {:?} from {}", self.tag(), msg.tx.id, msg.origin);

        // The ancestry is gathered asynchronously, in the meantime this node keeps serving
        // its peers. Ingestion and the vote happen in one step afterwards.
        let fetch = fetch_ancestry(
            msg.origin,
            self.peers.get(&msg.origin).map(|peer| peer.fetch.clone()),
            msg.tx.parents.clone(),
            self.consensus.known_ids(),
            self.consensus.params().query_timeout(),
        );
        let fetch = actix::fut::wrap_future::<_, Self>(fetch);

        let vote = fetch.map(move |batch, actor, _ctx| {
            let tx = msg.tx;
            let outcome = batch.and_then(|batch| Ok(actor.consensus.on_query(&tx, &batch)?));
            match outcome {
                Ok(outcome) => QueryTxAck { id: actor.node_id, tx_id: tx.id, outcome },
                Err(e) => {
                    error!("[{}] couldn't ingest queried transaction {}: {}", actor.tag(), tx, e);
                    QueryTxAck { id: actor.node_id, tx_id: tx.id, outcome: false }
                }
            }
        });

        Box::pin(vote)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Message)]
#[rtype(result = "Result<Vec<Transaction>>")]
pub struct FetchTxs {
    pub ids: Vec<TxId>,
}

impl Handler<FetchTxs> for Node {
    type Result = Result<Vec<Transaction>>;

    fn handle(&mut self, msg: FetchTxs, _ctx: &mut Context<Self>) -> Self::Result {
        msg.ids.iter().map(|id| Ok(self.consensus.fetch(id)?)).collect()
    }
}

// Voting rounds

#[derive(Debug, Clone, Serialize, Deserialize, Message)]
#[rtype(result = "Result<RoundSummary>")]
pub struct RunVotingRound;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub node_id: NodeId,
    /// Transactions queried in this round
    pub queried: usize,
    /// Queries which reached the quorum
    pub succeeded: usize,
    /// Transactions which became accepted after the round
    pub accepted: Vec<TxId>,
}

impl Handler<RunVotingRound> for Node {
    type Result = ResponseActFuture<Self, Result<RoundSummary>>;

    fn handle(&mut self, _msg: RunVotingRound, _ctx: &mut Context<Self>) -> Self::Result {
        let k = self.consensus.params().sample_size(self.network_size);
        let timeout = self.consensus.params().query_timeout();
        let pending: Vec<Transaction> = self
            .consensus
            .unqueried()
            .into_iter()
            .filter(|tx| !self.in_flight.contains(&tx.id))
            .collect();

        let mut queries = vec![];
        for tx in pending.iter() {
            let _ = self.in_flight.insert(tx.id);
            for (peer_id, peer) in self.peers.sample(k, &mut self.rng) {
                let tx_id = tx.id;
                let request = peer.query.send(QueryTx { tx: tx.clone(), origin: self.node_id });
                queries.push(async move {
                    // Unanswered queries count as negative votes
                    let outcome = match tokio::time::timeout(timeout, request).await {
                        Ok(Ok(ack)) => ack.outcome,
                        Ok(Err(e)) => {
                            debug!("query for {:?} to {} failed: {:?}", tx_id, peer_id, e);
                            false
                        }
                        Err(_) => {
                            debug!("query for {:?} to {} timed out", tx_id, peer_id);
                            false
                        }
                    };
                    (tx_id, peer_id, outcome)
                });
            }
        }
        let ids: Vec<TxId> = pending.iter().map(|tx| tx.id).collect();

        let votes = actix::fut::wrap_future::<_, Self>(futures::future::join_all(queries));
        let update_self = votes.map(move |votes, actor, _ctx| {
            let mut quorums: HashMap<TxId, Quorum> =
                ids.iter().map(|id| (*id, Quorum::new())).collect();
            for (tx_id, peer_id, outcome) in votes {
                if let Some(quorum) = quorums.get_mut(&tx_id) {
                    quorum.insert(peer_id, outcome);
                }
            }
            for id in ids.iter() {
                let _ = actor.in_flight.remove(id);
            }

            let mut succeeded = 0;
            for id in ids.iter() {
                let quorum = quorums.remove(id).unwrap_or_else(Quorum::new);
                if actor.consensus.record_quorum(id, &quorum, k)? {
                    succeeded += 1;
                }
            }
            let accepted = actor.consensus.compute_accepted()?;
            if !ids.is_empty() {
                info!(
                    "[{}] round: queried {}, succeeded {}, newly accepted {}",
                    actor.tag(),
                    ids.len(),
                    succeeded,
                    accepted.len()
                );
            }
            Ok(RoundSummary { node_id: actor.node_id, queried: ids.len(), succeeded, accepted })
        });

        Box::pin(update_self)
    }
}

// Authoring and introspection

#[derive(Debug, Clone, Serialize, Deserialize, Message)]
#[rtype(result = "Result<Transaction>")]
pub struct GenerateTx {
    pub data: ConflictKey,
}

impl Handler<GenerateTx> for Node {
    type Result = Result<Transaction>;

    fn handle(&mut self, msg: GenerateTx, _ctx: &mut Context<Self>) -> Self::Result {
        Ok(self.consensus.generate_transaction(msg.data, &mut self.rng)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Message)]
#[rtype(result = "Result<bool>")]
pub struct IsAccepted {
    pub tx_id: TxId,
}

impl Handler<IsAccepted> for Node {
    type Result = Result<bool>;

    fn handle(&mut self, msg: IsAccepted, _ctx: &mut Context<Self>) -> Self::Result {
        Ok(self.consensus.is_accepted(&msg.tx_id)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Message)]
#[rtype(result = "Result<NodeSnapshot>")]
pub struct GetSnapshot;

impl Handler<GetSnapshot> for Node {
    type Result = Result<NodeSnapshot>;

    fn handle(&mut self, _msg: GetSnapshot, _ctx: &mut Context<Self>) -> Self::Result {
        let _ = self.consensus.compute_accepted()?;
        Ok(self.consensus.snapshot()?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use actix::ResponseFuture;

    /// A peer which votes with a fixed outcome and serves a fixed set of transactions.
    struct DummyPeer {
        pub id: NodeId,
        pub outcome: bool,
        pub delay: Option<Duration>,
        pub known: HashMap<TxId, Transaction>,
        pub queries: usize,
    }

    impl DummyPeer {
        pub fn new(id: u32, outcome: bool) -> Self {
            Self { id: NodeId(id), outcome, delay: None, known: HashMap::new(), queries: 0 }
        }
    }

    impl Actor for DummyPeer {
        type Context = Context<Self>;

        fn started(&mut self, _ctx: &mut Context<Self>) {}
    }

    impl Handler<QueryTx> for DummyPeer {
        type Result = ResponseFuture<QueryTxAck>;

        fn handle(&mut self, QueryTx { tx, origin: _ }: QueryTx, _ctx: &mut Context<Self>) -> Self::Result {
            self.queries += 1;
            let ack = QueryTxAck { id: self.id, tx_id: tx.id, outcome: self.outcome };
            let delay = self.delay;
            Box::pin(async move {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                ack
            })
        }
    }

    impl Handler<FetchTxs> for DummyPeer {
        type Result = Result<Vec<Transaction>>;

        fn handle(&mut self, msg: FetchTxs, _ctx: &mut Context<Self>) -> Self::Result {
            Ok(msg.ids.iter().map(|id| self.known.fetch(id)).collect::<crate::avalanche::Result<Vec<Transaction>>>()?)
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize, Message)]
    #[rtype(result = "usize")]
    struct GetQueryCount;

    impl Handler<GetQueryCount> for DummyPeer {
        type Result = usize;

        fn handle(&mut self, _msg: GetQueryCount, _ctx: &mut Context<Self>) -> Self::Result {
            self.queries
        }
    }

    fn genesis() -> Transaction {
        Transaction::genesis(-1)
    }

    fn start_node(dummies: Vec<DummyPeer>, params: Parameters) -> (Addr<Node>, Vec<Addr<DummyPeer>>) {
        let mut peers = PeerSet::new(NodeId(0));
        let mut addrs = vec![];
        for dummy in dummies {
            let id = dummy.id;
            let addr = dummy.start();
            let _ = peers.insert(id, Peer::new(addr.clone()));
            addrs.push(addr);
        }
        let n = peers.len() + 1;
        let node = Node::new(NodeId(0), genesis(), params, peers, n, 1).unwrap();
        (node.start(), addrs)
    }

    fn voters(outcomes: &[bool]) -> Vec<DummyPeer> {
        outcomes.iter().enumerate().map(|(i, o)| DummyPeer::new(i as u32 + 1, *o)).collect()
    }

    #[actix_rt::test]
    async fn test_round_with_positive_votes() {
        let (node, peers) = start_node(voters(&[true; 5]), Parameters::default());
        let tx = node.send(GenerateTx { data: 1 }).await.unwrap().unwrap();
        assert_eq!(tx.parents, vec![genesis().id]);

        let summary = node.send(RunVotingRound).await.unwrap().unwrap();
        assert_eq!((summary.queried, summary.succeeded), (1, 1));
        for peer in peers.iter() {
            assert_eq!(peer.send(GetQueryCount).await.unwrap(), 1);
        }

        let snapshot = node.send(GetSnapshot).await.unwrap().unwrap();
        let summary = snapshot.get(&tx.id).unwrap();
        assert_eq!((summary.chit, summary.confidence), (Some(1), 1));

        // Nothing left to query
        let summary = node.send(RunVotingRound).await.unwrap().unwrap();
        assert_eq!((summary.queried, summary.succeeded), (0, 0));
    }

    #[actix_rt::test]
    async fn test_round_below_quorum() {
        let (node, _peers) = start_node(voters(&[true, true, true, false, false]), Parameters::default());
        let tx = node.send(GenerateTx { data: 1 }).await.unwrap().unwrap();

        let summary = node.send(RunVotingRound).await.unwrap().unwrap();
        assert_eq!((summary.queried, summary.succeeded), (1, 0));
        let snapshot = node.send(GetSnapshot).await.unwrap().unwrap();
        assert_eq!(snapshot.get(&tx.id).unwrap().chit, Some(0));
    }

    #[actix_rt::test]
    async fn test_slow_peers_count_as_negative() {
        let mut dummies = voters(&[true; 5]);
        for dummy in dummies.iter_mut().take(2) {
            dummy.delay = Some(Duration::from_millis(500));
        }
        let params = Parameters { query_timeout_ms: 50, ..Parameters::default() };
        let (node, _peers) = start_node(dummies, params);
        let _ = node.send(GenerateTx { data: 1 }).await.unwrap().unwrap();

        let summary = node.send(RunVotingRound).await.unwrap().unwrap();
        assert_eq!((summary.queried, summary.succeeded), (1, 0));
    }

    #[actix_rt::test]
    async fn test_accept_after_rounds() {
        let (node, _peers) = start_node(voters(&[true; 5]), Parameters::default());
        let mut txs = vec![];
        let mut accepted = vec![];
        for i in 0..8 {
            txs.push(node.send(GenerateTx { data: i }).await.unwrap().unwrap());
            let summary = node.send(RunVotingRound).await.unwrap().unwrap();
            accepted.extend(summary.accepted);
        }
        assert!(accepted.contains(&txs[0].id));
        assert!(node.send(IsAccepted { tx_id: txs[0].id }).await.unwrap().unwrap());
        assert!(!node.send(IsAccepted { tx_id: TxId::zero() }).await.unwrap().unwrap());
    }

    #[actix_rt::test]
    async fn test_query_fetches_ancestry_from_origin() {
        let g = genesis();
        let a = Transaction::new(NodeId(1), 0, 1, vec![g.id]);
        let b = Transaction::new(NodeId(1), 1, 2, vec![a.id]);
        let c = Transaction::new(NodeId(1), 2, 3, vec![b.id]);

        let mut origin = DummyPeer::new(1, true);
        for tx in vec![a.clone(), b.clone(), c.clone()] {
            let _ = origin.known.insert(tx.id, tx);
        }
        let (node, _peers) = start_node(vec![origin], Parameters::default());

        let ack = node.send(QueryTx { tx: c.clone(), origin: NodeId(1) }).await.unwrap();
        assert_eq!((ack.id, ack.tx_id, ack.outcome), (NodeId(0), c.id, true));

        let snapshot = node.send(GetSnapshot).await.unwrap().unwrap();
        let ids: Vec<TxId> = snapshot.txs.iter().map(|tx| tx.id).collect();
        assert_eq!(ids, vec![g.id, a.id, b.id, c.id]);
    }

    #[actix_rt::test]
    async fn test_query_with_missing_ancestry() {
        let g = genesis();
        let a = Transaction::new(NodeId(1), 0, 1, vec![g.id]);
        let b = Transaction::new(NodeId(1), 1, 2, vec![a.id]);

        // The origin lost `a`, an unknown origin has nothing to offer at all
        let mut origin = DummyPeer::new(1, true);
        let _ = origin.known.insert(b.id, b.clone());
        let (node, _peers) = start_node(vec![origin], Parameters::default());

        let ack = node.send(QueryTx { tx: b.clone(), origin: NodeId(1) }).await.unwrap();
        assert!(!ack.outcome);
        let ack = node.send(QueryTx { tx: b.clone(), origin: NodeId(7) }).await.unwrap();
        assert!(!ack.outcome);

        let snapshot = node.send(GetSnapshot).await.unwrap().unwrap();
        assert_eq!(snapshot.txs.len(), 1);

        // A transaction on top of known parents needs no fetch
        let d = Transaction::new(NodeId(7), 0, 4, vec![g.id]);
        let ack = node.send(QueryTx { tx: d, origin: NodeId(7) }).await.unwrap();
        assert!(ack.outcome);
    }

    #[actix_rt::test]
    async fn test_fetch_txs() {
        let (node, _peers) = start_node(voters(&[true; 5]), Parameters::default());
        let tx = node.send(GenerateTx { data: 1 }).await.unwrap().unwrap();

        let txs = node.send(FetchTxs { ids: vec![tx.id, genesis().id] }).await.unwrap().unwrap();
        assert_eq!(txs, vec![tx, genesis()]);
        match node.send(FetchTxs { ids: vec![TxId::zero()] }).await.unwrap() {
            Err(Error::Avalanche(crate::avalanche::Error::ParentNotFound(id))) => {
                assert_eq!(id, TxId::zero())
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
