use super::conflict_set::ConflictSet;
use super::tx::ConflictKey;
use super::{Error, Result};

use crate::id::TxId;

use std::collections::{hash_map::Entry, HashMap};

/// The conflict map stores one conflict set per conflict key.
#[derive(Debug)]
pub struct ConflictMap {
    inner: HashMap<ConflictKey, ConflictSet<TxId>>,
}

impl ConflictMap {
    pub fn new() -> Self {
        ConflictMap { inner: HashMap::default() }
    }

    pub fn get(&self, key: &ConflictKey) -> Result<&ConflictSet<TxId>> {
        self.inner.get(key).ok_or(Error::UnknownConflictKey(*key))
    }

    pub fn get_mut(&mut self, key: &ConflictKey) -> Result<&mut ConflictSet<TxId>> {
        self.inner.get_mut(key).ok_or(Error::UnknownConflictKey(*key))
    }

    /// Whether a transaction is preferred within its conflict set.
    pub fn is_preferred(&self, key: &ConflictKey, t: &TxId) -> Result<bool> {
        Ok(self.get(key)?.is_preferred(t))
    }

    /// Inserts a transaction within some existing conflict set, or creates a singleton set.
    pub fn insert(&mut self, key: ConflictKey, t: TxId) {
        match self.inner.entry(key) {
            Entry::Occupied(mut o) => {
                let cs = o.get_mut();
                let _ = cs.insert(t);
            }
            Entry::Vacant(v) => {
                let cs = ConflictSet::new(t);
                let _ = v.insert(cs);
            }
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.inner.len()
    }
}
