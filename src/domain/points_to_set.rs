//! Points-to sets: immutable sets of abstract objects with `join = ∪` and
//! `⊑ = ⊆`. Backed directly by [`AbstractObject`] values rather than an
//! interned dense integer space, since `AbstractObject` already carries a
//! cheap structural hash and the engine's hot path is dominated by set
//! union, not membership testing against a huge universe.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::abstract_object::AbstractObject;

/// An over-approximation of the abstract objects a variable or field may
/// refer to. Backed by a `BTreeSet` so that equality is exactly "same
/// underlying object set" and iteration order is deterministic, which a
/// stable results bundle needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsToSet(BTreeSet<AbstractObject>);

impl PointsToSet {
    pub fn empty() -> Self {
        Self(BTreeSet::new())
    }

    pub fn singleton(obj: AbstractObject) -> Self {
        let mut s = BTreeSet::new();
        s.insert(obj);
        Self(s)
    }

    pub fn from_iter(iter: impl IntoIterator<Item = AbstractObject>) -> Self {
        Self(iter.into_iter().collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, obj: &AbstractObject) -> bool {
        self.0.contains(obj)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AbstractObject> {
        self.0.iter()
    }

    /// `join(a, b) = a ∪ b`. Returns whether `self` changed, mirroring the
    /// `update(m, k, Δ)` contract so callers can decide worklist
    /// reinsertion without a separate equality check.
    pub fn join_in_place(&mut self, other: &PointsToSet) -> bool {
        let before = self.0.len();
        let mut changed = false;
        for obj in &other.0 {
            if self.0.insert(obj.clone()) {
                changed = true;
            }
        }
        debug_assert!(self.0.len() >= before);
        changed
    }

    pub fn join(&self, other: &PointsToSet) -> PointsToSet {
        let mut out = self.clone();
        out.join_in_place(other);
        out
    }

    /// `⊑ = ⊆`: whether `self` is covered by `other`.
    pub fn is_subset_of(&self, other: &PointsToSet) -> bool {
        self.0.is_subset(&other.0)
    }
}

impl FromIterator<AbstractObject> for PointsToSet {
    fn from_iter<T: IntoIterator<Item = AbstractObject>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a PointsToSet {
    type Item = &'a AbstractObject;
    type IntoIter = std::collections::btree_set::Iter<'a, AbstractObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
