//! `Env` and `Heap`: the two pointwise-join mappings the engine operates
//! on, backed by `FxHashMap`s with a monotone-join update contract.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::abstract_object::AbstractObject;
use super::context::Context;
use super::field_key::FieldKey;
use super::points_to_set::PointsToSet;

/// `Env : (Context, VarName) → PointsToSet`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Env {
    map: FxHashMap<(Context, String), PointsToSet>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, ctx: &Context, var: &str) -> PointsToSet {
        self.map
            .get(&(ctx.clone(), var.to_string()))
            .cloned()
            .unwrap_or_else(PointsToSet::empty)
    }

    /// `update(Env, (ctx, var), delta)`: joins `delta` in and reports
    /// whether anything changed.
    pub fn update(&mut self, ctx: &Context, var: &str, delta: &PointsToSet) -> bool {
        if delta.is_empty() {
            return false;
        }
        let entry = self
            .map
            .entry((ctx.clone(), var.to_string()))
            .or_insert_with(PointsToSet::empty);
        entry.join_in_place(delta)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(Context, String), &PointsToSet)> {
        self.map.iter()
    }
}

/// `Heap : (AbstractObject, FieldKey) → PointsToSet`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Heap {
    map: FxHashMap<(AbstractObject, FieldKey), PointsToSet>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, obj: &AbstractObject, field: &FieldKey) -> PointsToSet {
        self.map
            .get(&(obj.clone(), field.clone()))
            .cloned()
            .unwrap_or_else(PointsToSet::empty)
    }

    pub fn update(&mut self, obj: &AbstractObject, field: &FieldKey, delta: &PointsToSet) -> bool {
        if delta.is_empty() {
            return false;
        }
        let entry = self
            .map
            .entry((obj.clone(), field.clone()))
            .or_insert_with(PointsToSet::empty);
        entry.join_in_place(delta)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(AbstractObject, FieldKey), &PointsToSet)> {
        self.map.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::abstract_object::AllocKind;
    use crate::domain::context::ContextPolicy;

    fn obj(id: &str) -> AbstractObject {
        AbstractObject::make(id, AllocKind::Obj, ContextPolicy::Insensitive.empty_context(), &[], 0)
    }

    #[test]
    fn env_update_is_monotone() {
        let mut env = Env::new();
        let ctx = ContextPolicy::Insensitive.empty_context();
        assert!(env.update(&ctx, "x", &PointsToSet::singleton(obj("a"))));
        let before = env.get(&ctx, "x");
        assert!(!env.update(&ctx, "x", &PointsToSet::singleton(obj("a"))));
        let after = env.get(&ctx, "x");
        assert!(before.is_subset_of(&after) && after.is_subset_of(&before));
    }

    #[test]
    fn heap_update_joins_fields() {
        let mut heap = Heap::new();
        let o = obj("container");
        let field = FieldKey::elem();
        assert!(heap.update(&o, &field, &PointsToSet::singleton(obj("a"))));
        assert!(heap.update(&o, &field, &PointsToSet::singleton(obj("b"))));
        assert_eq!(heap.get(&o, &field).len(), 2);
    }

    #[test]
    fn missing_key_reads_as_empty() {
        let env = Env::new();
        let ctx = ContextPolicy::Insensitive.empty_context();
        assert!(env.get(&ctx, "nope").is_empty());
    }
}
