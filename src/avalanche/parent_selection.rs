// Adaptive Parent Selection

use super::consensus::Consensus;
use super::Result;

use crate::id::TxId;

use rand::seq::SliceRandom;
use rand::Rng;

use std::collections::HashSet;

impl Consensus {
    /// Picks the parents of a transaction authored by this node.
    ///
    /// The eligible transactions are the queried, strongly preferred ones which are either
    /// uncontested or already gathered some confidence. The parents are their ancestors
    /// which are not eligible themselves. When there are none, `fallback_picks` of the
    /// `fallback_pool` most recently stored transactions are picked at random, so once the
    /// genesis exists a new transaction always gets a parent.
    pub fn select_parents<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Vec<TxId>> {
        let mut eligible = vec![];
        for tx in self.queried_ids() {
            if !self.is_strongly_preferred(&tx)? {
                continue;
            }
            let data = match self.get(&tx) {
                Some(t) => t.data,
                None => continue,
            };
            if self.conflict_set(&data)?.is_singleton() || self.confidence(&tx)? > 0 {
                eligible.push(tx);
            }
        }

        let eligible_set: HashSet<TxId> = eligible.iter().cloned().collect();
        let mut candidates: HashSet<TxId> = HashSet::new();
        for tx in eligible.iter() {
            for ancestor in self.ancestors(tx)? {
                if !eligible_set.contains(&ancestor) {
                    let _ = candidates.insert(ancestor);
                }
            }
        }
        let parents: Vec<TxId> =
            self.transactions().map(|t| t.id).filter(|id| candidates.contains(id)).collect();
        if !parents.is_empty() {
            return Ok(parents);
        }
        Ok(self.fallback_parents(rng))
    }

    /// Queried transactions in view order.
    fn queried_ids(&self) -> Vec<TxId> {
        self.transactions().map(|t| t.id).filter(|id| self.is_queried(id)).collect()
    }

    fn fallback_parents<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<TxId> {
        let known: Vec<TxId> = self.transactions().map(|t| t.id).collect();
        let mut pool: Vec<TxId> =
            known.into_iter().rev().take(self.params().fallback_pool).collect();
        pool.shuffle(rng);
        pool.truncate(self.params().fallback_picks);
        pool
    }
}
