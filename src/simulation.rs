//! Drives a [Network] step by step and checks the outcome for accepted double spends.

use crate::colored::Colorize;

use crate::avalanche::{ConflictKey, NodeSnapshot, Transaction};
use crate::id::{NodeId, TxId};
use crate::network::{Network, RoundSummary};
use crate::Result;

use tracing::{info, warn};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use std::collections::BTreeMap;

/// What happened in one simulation step.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub step: usize,
    pub author: NodeId,
    pub tx: Transaction,
    /// A transaction reusing the conflict key of an earlier step
    pub double_spend: Option<Transaction>,
    pub rounds: Vec<RoundSummary>,
    /// Fraction of the author's view which is accepted after the step
    pub fraction_accepted: f64,
}

/// More than one member of a conflict set is accepted somewhere in the network.
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictViolation {
    pub data: ConflictKey,
    /// The accepted members of the conflict set, each with the nodes accepting it
    pub accepted: Vec<(TxId, Vec<NodeId>)>,
}

impl std::fmt::Display for ConflictViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "conflict key {}:", self.data)?;
        for (tx_id, nodes) in self.accepted.iter() {
            write!(f, " {:?} accepted by {:?};", tx_id, nodes)?;
        }
        Ok(())
    }
}

pub struct Simulation {
    network: Network,
    /// Probability of a double spend in each step
    double_spend_rate: f64,
    /// Every transaction authored so far, double spends included
    issued: Vec<Transaction>,
    step: usize,
    rng: StdRng,
}

impl Simulation {
    pub fn new(network: Network, double_spend_rate: f64, seed: u64) -> Self {
        Simulation { network, double_spend_rate, issued: vec![], step: 0, rng: StdRng::seed_from_u64(seed) }
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn issued(&self) -> &[Transaction] {
        &self.issued
    }

    fn random_node(&mut self) -> NodeId {
        NodeId(self.rng.gen_range(0, self.network.len()) as u32)
    }

    /// A random node authors a transaction keyed by the step number, sometimes another
    /// one double spends an earlier key, then one network round runs.
    pub async fn step(&mut self) -> Result<StepReport> {
        let step = self.step;
        self.step += 1;

        let author = self.random_node();
        let tx = self.network.generate_transaction(author, step as ConflictKey).await?;
        self.issued.push(tx.clone());

        let mut double_spend = None;
        if step > 0 && self.rng.gen::<f64>() < self.double_spend_rate {
            let data = self.rng.gen_range(0, step) as ConflictKey;
            let spender = self.random_node();
            info!("[{}] {} double spends {}", "simulation".cyan(), spender, data);
            let ds = self.network.generate_transaction(spender, data).await?;
            self.issued.push(ds.clone());
            double_spend = Some(ds);
        }

        let rounds = self.network.run_round().await?;
        let fraction_accepted = self.network.snapshot(author).await?.fraction_accepted();
        info!("[{}] {}: {:.3}", "simulation".cyan(), step, fraction_accepted);

        Ok(StepReport { step, author, tx, double_spend, rounds, fraction_accepted })
    }

    /// Checks every conflict set with more than one issued member across all nodes.
    pub async fn conflict_violations(&self) -> Result<Vec<ConflictViolation>> {
        let snapshots = self.network.snapshots().await?;
        let violations = find_violations(&self.issued, &snapshots);
        for violation in violations.iter() {
            warn!("[{}] {}", "simulation".cyan(), violation);
        }
        Ok(violations)
    }
}

/// Reports each conflict key for which some node accepts one member while some node
/// (possibly another one) accepts a different member.
pub fn find_violations(issued: &[Transaction], snapshots: &[NodeSnapshot]) -> Vec<ConflictViolation> {
    let mut conflicts: BTreeMap<ConflictKey, Vec<TxId>> = BTreeMap::new();
    for tx in issued.iter() {
        conflicts.entry(tx.data).or_insert_with(Vec::new).push(tx.id);
    }

    let mut violations = vec![];
    for (data, txs) in conflicts.into_iter().filter(|(_, txs)| txs.len() > 1) {
        let accepted: Vec<(TxId, Vec<NodeId>)> = txs
            .into_iter()
            .map(|tx_id| {
                let nodes = snapshots
                    .iter()
                    .filter(|s| s.get(&tx_id).map_or(false, |tx| tx.accepted))
                    .map(|s| s.node_id)
                    .collect::<Vec<NodeId>>();
                (tx_id, nodes)
            })
            .filter(|(_, nodes)| !nodes.is_empty())
            .collect();
        if accepted.len() > 1 {
            violations.push(ConflictViolation { data, accepted });
        }
    }
    violations
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::avalanche::TxSummary;
    use crate::params::Parameters;

    fn summary(tx: &Transaction, accepted: bool) -> TxSummary {
        TxSummary {
            id: tx.id,
            data: tx.data,
            parents: tx.parents.clone(),
            chit: Some(1),
            confidence: 6,
            preferred: true,
            conflict_set_size: 2,
            accepted,
        }
    }

    #[test]
    fn test_find_violations() {
        let g = Transaction::genesis(-1);
        let t1 = Transaction::new(NodeId(0), 0, 3, vec![g.id]);
        let t2 = Transaction::new(NodeId(1), 0, 3, vec![g.id]);
        let other = Transaction::new(NodeId(1), 1, 4, vec![g.id]);
        let issued = vec![t1.clone(), t2.clone(), other.clone()];

        // Only one side is accepted anywhere
        let safe = vec![
            NodeSnapshot { node_id: NodeId(0), txs: vec![summary(&t1, true), summary(&t2, false)] },
            NodeSnapshot { node_id: NodeId(1), txs: vec![summary(&t1, true), summary(&other, true)] },
        ];
        assert!(find_violations(&issued, &safe).is_empty());

        // Each side is accepted by a different node
        let unsafe_ = vec![
            NodeSnapshot { node_id: NodeId(0), txs: vec![summary(&t1, true)] },
            NodeSnapshot { node_id: NodeId(1), txs: vec![summary(&t1, false), summary(&t2, true)] },
        ];
        let violations = find_violations(&issued, &unsafe_);
        assert_eq!(
            violations,
            vec![ConflictViolation {
                data: 3,
                accepted: vec![(t1.id, vec![NodeId(0)]), (t2.id, vec![NodeId(1)])]
            }]
        );
    }

    #[actix_rt::test]
    async fn test_simulation_without_double_spends() {
        let params = Parameters { active_nodes_per_round: 10, ..Parameters::default() };
        let network = Network::create(10, Transaction::genesis(params.genesis_data), params, 3).unwrap();
        let mut simulation = Simulation::new(network, 0.0, 3);

        let mut accepted = 0;
        for i in 0..20 {
            let report = simulation.step().await.unwrap();
            assert_eq!(report.step, i);
            assert_eq!(report.tx.data, i as i64);
            assert!(report.double_spend.is_none());
            assert_eq!(report.rounds.len(), 10);
            assert!(report.fraction_accepted > 0.0);
            accepted += report.rounds.iter().map(|r| r.accepted.len()).sum::<usize>();
        }
        assert_eq!(simulation.issued().len(), 20);
        assert!(accepted > 0);
        assert!(simulation.conflict_violations().await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn test_simulation_with_double_spends() {
        let params = Parameters { active_nodes_per_round: 10, ..Parameters::default() };
        let network = Network::create(10, Transaction::genesis(params.genesis_data), params, 9).unwrap();
        let mut simulation = Simulation::new(network, 1.0, 9);

        for _ in 0..10 {
            let report = simulation.step().await.unwrap();
            if report.step > 0 {
                let ds = report.double_spend.unwrap();
                assert!(ds.data < report.step as i64);
            }
        }
        assert_eq!(simulation.issued().len(), 19);
    }
}
