//! Builtin/summary mechanism: closed-form transfer functions for
//! library-level calls, registered by qualified name, plus the
//! conservative default used for any unresolved call target.
//!
//! Grounded in
//! `features/taint_analysis/infrastructure/interprocedural/summary.rs`'s
//! `FunctionSummary` — a name-addressed, per-call record the engine
//! consults instead of re-analyzing a callee's body — generalized here to
//! a fixed table of closed-form transfer functions rather than
//! per-function inferred data.

use rustc_hash::FxHashMap;

use crate::domain::{AbstractObject, AllocKind, Context, Diagnostics, Env, FieldKey, Heap, PointsToSet, SiteId};

/// Everything a summary is allowed to touch: the calling context,
/// the return-target variable (if any), the argument variables, and a
/// restricted handle onto `Env`/`Heap` plus fresh-object allocation.
/// Summaries must be monotone: they may only join points-to information
/// in, never remove it.
pub struct BuiltinCallCtx<'a> {
    pub ctx: &'a Context,
    pub call_id: &'a SiteId,
    pub target: Option<&'a str>,
    pub args: &'a [String],
    pub env: &'a mut Env,
    pub heap: &'a mut Heap,
    pub diagnostics: &'a mut Diagnostics,
    fresh_counter: &'a mut u64,
}

impl<'a> BuiltinCallCtx<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ctx: &'a Context,
        call_id: &'a SiteId,
        target: Option<&'a str>,
        args: &'a [String],
        env: &'a mut Env,
        heap: &'a mut Heap,
        diagnostics: &'a mut Diagnostics,
        fresh_counter: &'a mut u64,
    ) -> Self {
        Self { ctx, call_id, target, args, env, heap, diagnostics, fresh_counter }
    }

    /// Allocate a fresh object identified by this call site plus a local
    /// counter, so repeated calls to the same summary at the same site
    /// under the same context still grow the heap rather than collapse.
    fn fresh_object(&mut self, kind: AllocKind) -> AbstractObject {
        *self.fresh_counter += 1;
        let alloc_id = format!("{}#{}", self.call_id, self.fresh_counter);
        AbstractObject::make(alloc_id, kind, self.ctx.clone(), &[], 0)
    }

    fn join_target(&mut self, pts: &PointsToSet) {
        if let Some(target) = self.target {
            self.env.update(self.ctx, target, pts);
        }
    }
}

type SummaryFn = fn(&mut BuiltinCallCtx);

/// Allocates a fresh `kind`-tagged object and assigns it to the target;
/// used by `list()`/`tuple()`/`dict()`/`set()` before the element copy.
fn fresh_container(cx: &mut BuiltinCallCtx, kind: AllocKind) {
    let obj = cx.fresh_object(kind);
    cx.join_target(&PointsToSet::singleton(obj.clone()));
    let field = if kind == AllocKind::Dict { FieldKey::value() } else { FieldKey::elem() };
    for arg in cx.args.to_vec() {
        // An argument container's own elem/value contents become this
        // container's contents, so a type conversion like `dict(some_list)`
        // still carries points-to information through.
        let arg_pts = cx.env.get(cx.ctx, &arg);
        for arg_obj in arg_pts.iter() {
            let from_elem = cx.heap.get(arg_obj, &FieldKey::elem());
            let from_value = cx.heap.get(arg_obj, &FieldKey::value());
            cx.heap.update(&obj, &field, &from_elem);
            cx.heap.update(&obj, &field, &from_value);
        }
    }
}

fn summary_len(_cx: &mut BuiltinCallCtx) {
    // `len()` returns an integer; no points-to information is produced.
}

fn summary_iter(cx: &mut BuiltinCallCtx) {
    let obj = cx.fresh_object(AllocKind::Obj);
    cx.join_target(&PointsToSet::singleton(obj.clone()));
    if let Some(container_var) = cx.args.first().cloned() {
        let container_pts = cx.env.get(cx.ctx, &container_var);
        for container in container_pts.iter() {
            let elems = cx.heap.get(container, &FieldKey::elem());
            cx.heap.update(&obj, &FieldKey::elem(), &elems);
        }
    }
}

fn summary_list(cx: &mut BuiltinCallCtx) {
    fresh_container(cx, AllocKind::List);
}

fn summary_tuple(cx: &mut BuiltinCallCtx) {
    fresh_container(cx, AllocKind::Tuple);
}

fn summary_dict(cx: &mut BuiltinCallCtx) {
    fresh_container(cx, AllocKind::Dict);
}

fn summary_set(cx: &mut BuiltinCallCtx) {
    fresh_container(cx, AllocKind::Set);
}

/// `getattr(obj, name, default?)` with a dynamic (non-literal) attribute
/// name: resolved conservatively through the `unknown` field key rather
/// than any specific attribute, and flagged as a soundness notice.
fn summary_getattr(cx: &mut BuiltinCallCtx) {
    let call_id = cx.call_id.clone();
    if let Some(obj_var) = cx.args.first().cloned() {
        let obj_pts = cx.env.get(cx.ctx, &obj_var);
        let mut result = PointsToSet::empty();
        for obj in obj_pts.iter() {
            result = result.join(&cx.heap.get(obj, &FieldKey::unknown()));
        }
        cx.join_target(&result);
    }
    cx.diagnostics.notice(Some(call_id), "getattr resolved via dynamic attribute name (unknown field)");
}

/// The default summary for an unresolved call target: allocate a fresh
/// return object, leave arguments untouched.
fn summary_default(cx: &mut BuiltinCallCtx) {
    let obj = cx.fresh_object(AllocKind::Obj);
    cx.join_target(&PointsToSet::singleton(obj));
}

/// Registry of builtin summaries, addressed by qualified name.
pub struct BuiltinRegistry {
    summaries: FxHashMap<String, SummaryFn>,
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        let mut summaries: FxHashMap<String, SummaryFn> = FxHashMap::default();
        summaries.insert("len".to_string(), summary_len as SummaryFn);
        summaries.insert("iter".to_string(), summary_iter as SummaryFn);
        summaries.insert("list".to_string(), summary_list as SummaryFn);
        summaries.insert("tuple".to_string(), summary_tuple as SummaryFn);
        summaries.insert("dict".to_string(), summary_dict as SummaryFn);
        summaries.insert("set".to_string(), summary_set as SummaryFn);
        summaries.insert("getattr".to_string(), summary_getattr as SummaryFn);
        Self { summaries }
    }
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.summaries.contains_key(name)
    }

    /// Register or override a summary (tests install fakes this way, per
    /// the registration-through-configuration note in the design notes).
    pub fn register(&mut self, name: impl Into<String>, f: SummaryFn) {
        self.summaries.insert(name.into(), f);
    }

    /// Invoke the summary for `name`, or the conservative default if
    /// `name` is not registered.
    pub fn invoke(&self, name: &str, cx: &mut BuiltinCallCtx) {
        match self.summaries.get(name) {
            Some(f) => f(cx),
            None => summary_default(cx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ContextPolicy;

    fn new_ctx_parts() -> (Context, Env, Heap, Diagnostics, u64) {
        (ContextPolicy::Insensitive.empty_context(), Env::new(), Heap::new(), Diagnostics::new(), 0)
    }

    #[test]
    fn list_constructor_copies_element_points_to() {
        let (ctx, mut env, mut heap, mut diags, mut counter) = new_ctx_parts();
        let call_id = SiteId::raw("s1");
        let elem = AbstractObject::make("e1", AllocKind::Obj, ctx.clone(), &[], 0);
        env.update(&ctx, "src", &PointsToSet::singleton(elem.clone()));

        // seed a source container whose elem field already has contents
        let src_container = AbstractObject::make("c0", AllocKind::List, ctx.clone(), &[], 0);
        heap.update(&src_container, &FieldKey::elem(), &PointsToSet::singleton(elem));
        env.update(&ctx, "arg0", &PointsToSet::singleton(src_container));

        let registry = BuiltinRegistry::new();
        let args = vec!["arg0".to_string()];
        let mut cx = BuiltinCallCtx::new(&ctx, &call_id, Some("out"), &args, &mut env, &mut heap, &mut diags, &mut counter);
        registry.invoke("list", &mut cx);

        let out_pts = env.get(&ctx, "out");
        assert_eq!(out_pts.len(), 1);
        let new_list = out_pts.iter().next().unwrap();
        assert_eq!(new_list.alloc_kind, AllocKind::List);
    }

    #[test]
    fn unresolved_builtin_falls_back_to_default_summary() {
        let (ctx, mut env, mut heap, mut diags, mut counter) = new_ctx_parts();
        let call_id = SiteId::raw("s1");
        let registry = BuiltinRegistry::new();
        let args: Vec<String> = vec![];
        let mut cx = BuiltinCallCtx::new(&ctx, &call_id, Some("out"), &args, &mut env, &mut heap, &mut diags, &mut counter);
        registry.invoke("totally_unmodeled_fn", &mut cx);
        assert_eq!(env.get(&ctx, "out").len(), 1);
    }

    #[test]
    fn getattr_uses_unknown_field_and_records_notice() {
        let (ctx, mut env, mut heap, mut diags, mut counter) = new_ctx_parts();
        let call_id = SiteId::raw("s1");
        let obj = AbstractObject::make("o1", AllocKind::Obj, ctx.clone(), &[], 0);
        let target_val = AbstractObject::make("v1", AllocKind::Obj, ctx.clone(), &[], 0);
        heap.update(&obj, &FieldKey::unknown(), &PointsToSet::singleton(target_val));
        env.update(&ctx, "o", &PointsToSet::singleton(obj));

        let registry = BuiltinRegistry::new();
        let args = vec!["o".to_string()];
        let mut cx = BuiltinCallCtx::new(&ctx, &call_id, Some("out"), &args, &mut env, &mut heap, &mut diags, &mut counter);
        registry.invoke("getattr", &mut cx);
        assert_eq!(env.get(&ctx, "out").len(), 1);
        assert_eq!(diags.soundness_notices.len(), 1);
    }
}
