use crate::colored::{ColoredString, Colorize};
use crate::graph::{self, DAG};
use crate::id::{NodeId, TxId};
use crate::params::Parameters;

use super::conflict_map::ConflictMap;
use super::conflict_set::ConflictSet;
use super::quorum::Quorum;
use super::snapshot::{NodeSnapshot, TxSummary};
use super::source::TxSource;
use super::tx::{ConflictKey, Transaction};
use super::{Error, Result};

use tracing::{debug, info};

use std::collections::{HashMap, HashSet, VecDeque};


/// One node's view of the transaction DAG and its consensus state.
pub struct Consensus {
    /// The identity of the owning node.
    node_id: NodeId,
    params: Parameters,
    /// Nonce of the next transaction authored by this node.
    nonce: u64,
    /// The set of all known transactions.
    known_txs: HashMap<TxId, Transaction>,
    /// Known transactions in the order they were stored, parents before children.
    order: Vec<TxId>,
    /// Transactions this node already ran a query for.
    queried_txs: HashSet<TxId>,
    /// The transactions accepted so far (never shrinks).
    accepted_txs: HashSet<TxId>,
    /// One conflict set per conflict key.
    conflict_map: ConflictMap,
    /// The consensus graph.
    dag: DAG<TxId>,
}

impl Consensus {
    /// Seeds a view with its own copy of the genesis transaction, which is queried,
    /// accepted and starts with a confidence of one.
    pub fn new(node_id: NodeId, genesis: Transaction, params: Parameters) -> Result<Self> {
        let mut consensus = Consensus {
            node_id,
            params,
            nonce: 0,
            known_txs: HashMap::default(),
            order: vec![],
            queried_txs: HashSet::new(),
            accepted_txs: HashSet::new(),
            conflict_map: ConflictMap::new(),
            dag: DAG::new(),
        };
        let genesis_id = genesis.id;
        consensus.store(genesis)?;
        consensus.dag.set_chit(genesis_id, 1)?;
        consensus.dag.set_confidence(&genesis_id, 1)?;
        let _ = consensus.queried_txs.insert(genesis_id);
        let _ = consensus.accepted_txs.insert(genesis_id);
        Ok(consensus)
    }

    fn tag(&self) -> ColoredString {
        self.node_id.to_string().as_str().cyan()
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    // View

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_known(&self, id: &TxId) -> bool {
        self.known_txs.contains_key(id)
    }

    pub fn get(&self, id: &TxId) -> Option<&Transaction> {
        self.known_txs.get(id)
    }

    fn data_of(&self, id: &TxId) -> Result<ConflictKey> {
        self.known_txs.get(id).map(|tx| tx.data).ok_or(Error::UnknownTx(*id))
    }

    /// Ids of every known transaction.
    pub fn known_ids(&self) -> HashSet<TxId> {
        self.order.iter().cloned().collect()
    }

    /// Known transactions in the order they were stored.
    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> + '_ {
        self.order.iter().filter_map(move |id| self.known_txs.get(id))
    }

    pub fn is_queried(&self, id: &TxId) -> bool {
        self.queried_txs.contains(id)
    }

    /// Transactions which have not been subjected to a query yet, in view order.
    pub fn unqueried(&self) -> Vec<Transaction> {
        self.transactions().filter(|tx| !self.queried_txs.contains(&tx.id)).cloned().collect()
    }

    pub fn chit(&self, id: &TxId) -> Option<u8> {
        self.dag.get_chit(id)
    }

    pub fn confidence(&self, id: &TxId) -> Result<u32> {
        Ok(self.dag.confidence(id)?)
    }

    pub fn conflict_set(&self, key: &ConflictKey) -> Result<&ConflictSet<TxId>> {
        self.conflict_map.get(key)
    }

    pub fn accepted(&self) -> &HashSet<TxId> {
        &self.accepted_txs
    }

    // Receiving transactions

    /// Called for every transaction this node learns about.
    ///
    /// Missing ancestors are pulled from `source` first. If one of them cannot be found
    /// nothing is stored and `ParentNotFound` is returned. Returns `true` if the
    /// transaction had not been encountered before.
    pub fn receive<S: TxSource + ?Sized>(&mut self, tx: &Transaction, source: &S) -> Result<bool> {
        if self.is_known(&tx.id) {
            return Ok(false);
        }

        let mut pulled: HashMap<TxId, Transaction> = HashMap::new();
        let mut queue: VecDeque<TxId> = tx.parents.iter().cloned().collect();
        while let Some(id) = queue.pop_front() {
            if self.is_known(&id) || pulled.contains_key(&id) {
                continue;
            }
            let parent = source.fetch(&id)?;
            queue.extend(parent.parents.iter().cloned());
            let _ = pulled.insert(id, parent);
        }
        if !pulled.is_empty() {
            debug!("[{}] pulled {} ancestors of {:?}", self.tag(), pulled.len(), tx.id);
        }

        // Parents are always stored before their children
        while !pulled.is_empty() {
            let mut ready: Vec<TxId> = pulled
                .values()
                .filter(|t| t.parents.iter().all(|p| self.is_known(p)))
                .map(|t| t.id)
                .collect();
            if ready.is_empty() {
                return Err(Error::Graph(graph::Error::VacantEntry));
            }
            ready.sort();
            for id in ready.iter() {
                if let Some(t) = pulled.remove(id) {
                    self.store(t)?;
                }
            }
        }
        self.store(tx.clone())?;
        Ok(true)
    }

    fn store(&mut self, tx: Transaction) -> Result<()> {
        self.dag.insert_vx(tx.id, tx.parents.clone())?;
        self.conflict_map.insert(tx.data, tx.id);
        self.order.push(tx.id);
        debug!("[{}] stored {}", self.tag(), tx);
        let _ = self.known_txs.insert(tx.id, tx);
        Ok(())
    }

    /// Authors a new transaction on top of the parents picked by parent selection and
    /// stores it in the local view.
    pub fn generate_transaction<R: rand::Rng + ?Sized>(
        &mut self,
        data: ConflictKey,
        rng: &mut R,
    ) -> Result<Transaction> {
        let parents = self.select_parents(rng)?;
        let tx = Transaction::new(self.node_id, self.nonce, data, parents);
        self.nonce += 1;
        let _ = self.receive(&tx, &super::source::NoSource)?;
        info!("[{}] generated {}", self.tag(), tx);
        Ok(tx)
    }

    // Voting

    /// Answers a query from a peer: the transaction is received first, the vote is
    /// whether it is strongly preferred afterwards.
    pub fn on_query<S: TxSource + ?Sized>(&mut self, tx: &Transaction, source: &S) -> Result<bool> {
        let _ = self.receive(tx, source)?;
        self.is_strongly_preferred(&tx.id)
    }

    /// Applies the outcome of the query for `id` sampled from `k` peers.
    ///
    /// On success the chit is set and every member of the lineage gains confidence,
    /// possibly moving the preference of its conflict set. Returns whether the query
    /// succeeded.
    pub fn record_quorum(&mut self, id: &TxId, quorum: &Quorum, k: usize) -> Result<bool> {
        if !self.is_known(id) {
            return Err(Error::UnknownTx(*id));
        }
        if self.queried_txs.contains(id) {
            return Ok(self.dag.get_chit(id) == Some(1));
        }
        let success = quorum.decide(self.params.alpha, k);
        if success {
            self.dag.set_chit(*id, 1)?;
            for t in self.lineage(id)? {
                let data = self.data_of(&t)?;
                let pref = self.conflict_map.get(&data)?.pref;
                let d2 = self.dag.confidence(&pref)?;
                let d1 = self.dag.increment_confidence(&t)?;
                self.conflict_map.get_mut(&data)?.update(t, d1, d2);
            }
            debug!("[{}] query for {:?} complete ({}), chit = 1", self.tag(), id, quorum);
        } else {
            self.dag.set_chit(*id, 0)?;
            debug!("[{}] query for {:?} failed ({}), chit = 0", self.tag(), id, quorum);
        }
        let _ = self.queried_txs.insert(*id);
        Ok(success)
    }

    // Ancestry

    /// Every known transaction reachable from `id` through parent links.
    pub fn ancestors(&mut self, id: &TxId) -> Result<Vec<TxId>> {
        Ok(self.dag.ancestors(id)?.to_vec())
    }

    /// The transaction itself followed by its ancestors.
    fn lineage(&mut self, id: &TxId) -> Result<Vec<TxId>> {
        let mut lineage = vec![*id];
        lineage.extend_from_slice(self.dag.ancestors(id)?);
        Ok(lineage)
    }

    // Branch preference

    pub fn is_preferred(&self, id: &TxId) -> Result<bool> {
        let data = self.data_of(id)?;
        self.conflict_map.is_preferred(&data, id)
    }

    /// Whether every ancestor of the transaction is preferred. A transaction without
    /// ancestors is strongly preferred.
    pub fn is_strongly_preferred(&mut self, id: &TxId) -> Result<bool> {
        for t in self.ancestors(id)? {
            if !self.is_preferred(&t)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    // Finality

    fn check_accepted(&self, id: &TxId) -> Result<bool> {
        let tx = match self.known_txs.get(id) {
            Some(tx) => tx,
            None => return Ok(false),
        };
        // A transaction is never accepted ahead of its parents
        if !tx.parents.iter().all(|p| self.accepted_txs.contains(p)) {
            return Ok(false);
        }
        let cs = self.conflict_map.get(&tx.data)?;

        // No known conflicts and enough confidence
        if cs.is_singleton() && self.dag.confidence(id)? > self.params.beta1 {
            return Ok(true);
        }
        // Contested, but the preference held over enough consecutive updates
        Ok(cs.is_preferred(id) && cs.cnt > self.params.beta2)
    }

    /// Checks whether the transaction is accepted as final. Once true it stays true.
    pub fn is_accepted(&mut self, id: &TxId) -> Result<bool> {
        if self.accepted_txs.contains(id) {
            return Ok(true);
        }
        if self.check_accepted(id)? {
            let _ = self.accepted_txs.insert(*id);
            info!("[{}] transaction {:?} is accepted", self.tag(), id);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Re-evaluates acceptance over the whole view, parents first, and returns the
    /// transactions which became accepted.
    pub fn compute_accepted(&mut self) -> Result<Vec<TxId>> {
        let pending: Vec<TxId> =
            self.order.iter().filter(|id| !self.accepted_txs.contains(id)).cloned().collect();
        let mut new = vec![];
        for id in pending.iter() {
            if self.is_accepted(id)? {
                new.push(*id);
            }
        }
        Ok(new)
    }

    /// A read-only copy of the view for statistics and diagnostics. Acceptance is reported
    /// as recorded so far, callers wanting a fresh sweep run `compute_accepted` first.
    pub fn snapshot(&self) -> Result<NodeSnapshot> {
        let mut txs = vec![];
        for tx in self.transactions() {
            let cs = self.conflict_map.get(&tx.data)?;
            txs.push(TxSummary {
                id: tx.id,
                data: tx.data,
                parents: tx.parents.clone(),
                chit: self.dag.get_chit(&tx.id),
                confidence: self.dag.confidence(&tx.id)?,
                preferred: cs.is_preferred(&tx.id),
                conflict_set_size: cs.size(),
                accepted: self.accepted_txs.contains(&tx.id),
            });
        }
        Ok(NodeSnapshot { node_id: self.node_id, txs })
    }
}

impl TxSource for Consensus {
    fn fetch(&self, id: &TxId) -> Result<Transaction> {
        self.known_txs.get(id).cloned().ok_or(Error::ParentNotFound(*id))
    }
}
