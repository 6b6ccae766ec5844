use super::{Error, Result};

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

/// The consensus graph of a single node.
///
/// Besides the parent links it holds the per-vertex consensus values observed by the
/// owning node (chit and confidence) and a memo of every ancestor set computed so far.
#[derive(Debug)]
pub struct DAG<V> {
    /// `g` defines a directed acyclic graph with only inbound edges.
    g: HashMap<V, Vec<V>>,
    /// `chits` defines a {0, 1} vote for a queried vertex.
    chits: HashMap<V, u8>,
    /// `confidence` counts the successful chits of a vertex and its progeny.
    confidence: HashMap<V, u32>,
    /// Memoised ancestor sets, in breadth-first order.
    ancestry: HashMap<V, Vec<V>>,
}

impl<V> std::ops::Deref for DAG<V>
where
    V: Eq + std::hash::Hash + Clone,
{
    type Target = HashMap<V, Vec<V>>;

    fn deref(&self) -> &'_ Self::Target {
        &self.g
    }
}

impl<V: Clone + Eq + std::hash::Hash + std::fmt::Debug> DAG<V> {
    pub fn new() -> Self {
        DAG {
            g: HashMap::default(),
            chits: HashMap::default(),
            confidence: HashMap::default(),
            ancestry: HashMap::default(),
        }
    }

    /// Inserts a new vertex into the DAG.
    ///   Note: every parent must already be a vertex. Since ancestors can never be
    ///   added after the fact, a memoised ancestor set is complete once computed.
    pub fn insert_vx(&mut self, vx: V, edges: Vec<V>) -> Result<()> {
        if self.g.contains_key(&vx) {
            return Err(Error::VertexExists);
        }
        for parent in edges.iter() {
            if !self.g.contains_key(parent) {
                return Err(Error::VacantEntry);
            }
        }
        let _ = self.confidence.insert(vx.clone(), 0);
        let _ = self.g.insert(vx, edges);
        Ok(())
    }

    /// Gets the chit of a vertex, `None` if it was never queried.
    pub fn get_chit(&self, vx: &V) -> Option<u8> {
        self.chits.get(vx).cloned()
    }

    /// Sets the chit of a particular vertex. A chit of 1 is final.
    pub fn set_chit(&mut self, vx: V, chit: u8) -> Result<()> {
        if !self.g.contains_key(&vx) {
            return Err(Error::UndefinedVertex);
        }
        match self.chits.entry(vx) {
            Entry::Occupied(mut o) => {
                let o = o.get_mut();
                if *o == 1 {
                    Err(Error::ChitReplace)
                } else {
                    *o = chit;
                    Ok(())
                }
            }
            Entry::Vacant(v) => {
                let _ = v.insert(chit);
                Ok(())
            }
        }
    }

    /// The confidence of a vertex as observed by this node.
    pub fn confidence(&self, vx: &V) -> Result<u32> {
        self.confidence.get(vx).cloned().ok_or(Error::UndefinedVertex)
    }

    /// Overrides the confidence of a vertex (used to seed the genesis).
    pub fn set_confidence(&mut self, vx: &V, confidence: u32) -> Result<()> {
        match self.confidence.get_mut(vx) {
            Some(c) => {
                *c = confidence;
                Ok(())
            }
            None => Err(Error::UndefinedVertex),
        }
    }

    /// Increments the confidence of a vertex and returns the new value.
    pub fn increment_confidence(&mut self, vx: &V) -> Result<u32> {
        match self.confidence.get_mut(vx) {
            Some(c) => {
                *c += 1;
                Ok(*c)
            }
            None => Err(Error::UndefinedVertex),
        }
    }

    /// Returns every vertex reachable from `vx` through parent links, excluding `vx`.
    ///
    /// The traversal is breadth-first, one frontier at a time, and parents that are not
    /// vertices of this DAG are skipped. The result is memoised per vertex.
    pub fn ancestors(&mut self, vx: &V) -> Result<&[V]> {
        if !self.ancestry.contains_key(vx) {
            let ancestors = self.compute_ancestors(vx)?;
            let _ = self.ancestry.insert(vx.clone(), ancestors);
        }
        match self.ancestry.get(vx) {
            Some(ancestors) => Ok(ancestors.as_slice()),
            None => Err(Error::UndefinedVertex),
        }
    }

    fn compute_ancestors(&self, vx: &V) -> Result<Vec<V>> {
        let mut frontier = match self.g.get(vx) {
            Some(parents) => parents.clone(),
            None => return Err(Error::UndefinedVertex),
        };
        let mut visited: HashSet<V> = HashSet::new();
        let mut result = vec![];
        while !frontier.is_empty() {
            let mut next = vec![];
            for elt in frontier.into_iter() {
                if !visited.insert(elt.clone()) {
                    continue;
                }
                if let Some(parents) = self.g.get(&elt) {
                    next.extend(parents.iter().cloned());
                    result.push(elt);
                }
            }
            frontier = next;
        }
        Ok(result)
    }

    /// Whether the ancestor set of `vx` has already been computed.
    #[cfg(test)]
    pub fn is_memoised(&self, vx: &V) -> bool {
        self.ancestry.contains_key(vx)
    }
}
