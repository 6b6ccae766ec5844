//! Where the receive path pulls missing ancestors from.
use super::tx::Transaction;
use super::{Error, Result};

use crate::id::TxId;

use std::collections::HashMap;

/// A peer (or a batch prefetched from one) able to hand out copies of transactions.
pub trait TxSource {
    /// Returns a copy of the transaction, `ParentNotFound` if the source lacks it.
    fn fetch(&self, id: &TxId) -> Result<Transaction>;
}

impl TxSource for HashMap<TxId, Transaction> {
    fn fetch(&self, id: &TxId) -> Result<Transaction> {
        self.get(id).cloned().ok_or(Error::ParentNotFound(*id))
    }
}

/// A source which knows nothing, for transactions whose parents are all local.
pub struct NoSource;

impl TxSource for NoSource {
    fn fetch(&self, id: &TxId) -> Result<Transaction> {
        Err(Error::ParentNotFound(*id))
    }
}
