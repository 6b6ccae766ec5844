//! [ConflictSet] maintains a set of conflicting transactions
use std::collections::HashSet;

/// `ConflictSet` represents the transactions sharing one conflict key.
///
/// It is used to determine whether a transaction can be accepted in face of
/// conflicts. For singleton conflict sets [BETA1][crate::avalanche::BETA1] confidence is
/// needed. If there are conflicts the preferred transaction will only be accepted after
/// more than [BETA2][crate::avalanche::BETA2] consecutive re-confirmations (in the DAG a
/// vote for a child also raises the confidence of its ancestors).
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct ConflictSet<T: Eq + std::hash::Hash> {
    /// The set of conflicts
    pub conflicts: HashSet<T>,
    /// The preferred element
    pub pref: T,
    /// The element which last triggered a preference update
    pub last: T,
    /// Consecutive updates triggered by `last`
    pub cnt: u32,
}

impl<T> std::ops::Deref for ConflictSet<T>
where
    T: Eq + std::hash::Hash + Clone,
{
    type Target = HashSet<T>;

    fn deref(&self) -> &'_ Self::Target {
        &self.conflicts
    }
}

impl<T> ConflictSet<T>
where
    T: Eq + std::hash::Hash + Clone,
{
    /// Create a new singleton conflict set
    pub fn new(t: T) -> Self {
        let mut conflicts = HashSet::new();
        conflicts.insert(t.clone());
        ConflictSet { conflicts, pref: t.clone(), last: t, cnt: 0 }
    }

    /// Adds a conflicting element, returns `false` if it was already known.
    pub fn insert(&mut self, t: T) -> bool {
        self.conflicts.insert(t)
    }

    /// Return if the given element is the preferred one
    pub fn is_preferred(&self, t: &T) -> bool {
        self.pref == *t
    }

    /// Return if the conflict set is a singleton, i.e., has only one element
    pub fn is_singleton(&self) -> bool {
        self.conflicts.len() == 1
    }

    /// Number of distinct elements known
    pub fn size(&self) -> usize {
        self.conflicts.len()
    }

    /// Records a successful vote for `t`, whose confidence just became `d1`, while the
    /// current preference has confidence `d2`.
    ///
    /// The preference only moves on a strictly greater confidence, the incumbent wins ties.
    pub fn update(&mut self, t: T, d1: u32, d2: u32) {
        if d1 > d2 {
            self.pref = t.clone();
        }
        if t != self.last {
            self.last = t;
            self.cnt = 0;
        } else {
            self.cnt += 1;
        }
    }
}
