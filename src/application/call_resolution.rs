//! Call candidate resolution: a name-map-then-fallback resolution style
//! generalized to the three call forms (direct/indirect/method) and to
//! resolving through points-to sets instead of a static symbol table
//! alone.

use rustc_hash::FxHashMap;

use crate::application::builtins::BuiltinRegistry;
use crate::domain::{AbstractObject, Context, Diagnostics, Env, FieldKey, FunctionIr, SiteId};
use crate::infrastructure::ClassHierarchy;

/// Borrowed access to the class hierarchy index and the instance→class
/// map, passed down only when `use_mro` is enabled. `mro()` memoizes, so
/// the hierarchy half needs `&mut`.
pub struct ClassContext<'a> {
    pub hierarchy: &'a mut ClassHierarchy,
    pub instance_classes: &'a FxHashMap<AbstractObject, String>,
}

/// The three call shapes an event's `call` record can take.
#[derive(Debug, Clone)]
pub enum CallForm {
    Direct { symbol: String },
    Indirect { expr_var: String },
    Method { receiver: String, method: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    Function,
    Builtin,
}

/// One resolved candidate callee, with the receiver object that produced
/// it (if any) so the caller can thread it into `self`-binding and into
/// `selector.on_call`'s receiver parameters.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub func_name: String,
    pub receiver: Option<AbstractObject>,
    pub source: CandidateSource,
}

/// Decode the function name an allocation "encodes": by convention, a
/// `func`-kind object's `alloc_id` *is* its qualified function name (the
/// only kind tagged callable — see DESIGN.md, Open Question 2).
///
/// `pub(crate)` so the async-facts helper can reuse it to decode
/// coroutine/callback targets from resolved points-to sets.
pub(crate) fn decode_function_name(obj: &AbstractObject) -> Option<&str> {
    obj.alloc_kind.is_callable().then_some(obj.alloc_id.as_str())
}

/// Suffix-match a call symbol against the registered qualified names,
/// matching only on dot boundaries (e.g. `"pkg.Cls.method"` matches a
/// registered `"Cls.method"`, but not a registered `"othercls.method"`).
fn suffix_match<'a>(symbol: &str, functions: &'a FxHashMap<String, FunctionIr>) -> Option<&'a str> {
    functions.keys().find_map(|name| {
        let matches = name == symbol
            || symbol.ends_with(name.as_str()) && symbol[..symbol.len() - name.len()].ends_with('.')
            || name.ends_with(symbol) && name[..name.len() - symbol.len()].ends_with('.');
        matches.then_some(name.as_str())
    })
}

pub fn resolve_candidates(
    form: &CallForm,
    ctx: &Context,
    call_id: &SiteId,
    functions: &FxHashMap<String, FunctionIr>,
    env: &Env,
    heap: &crate::domain::Heap,
    builtins: &BuiltinRegistry,
    diagnostics: &mut Diagnostics,
    class_ctx: Option<ClassContext<'_>>,
) -> Vec<Candidate> {
    match form {
        CallForm::Direct { symbol } => resolve_direct(symbol, call_id, ctx, functions, builtins, diagnostics),
        CallForm::Indirect { expr_var } => {
            resolve_indirect(expr_var, call_id, ctx, env, diagnostics)
        }
        CallForm::Method { receiver, method } => {
            resolve_method(receiver, method, call_id, ctx, env, heap, functions, diagnostics, class_ctx)
        }
    }
}

fn resolve_direct(
    symbol: &str,
    call_id: &SiteId,
    ctx: &Context,
    functions: &FxHashMap<String, FunctionIr>,
    builtins: &BuiltinRegistry,
    diagnostics: &mut Diagnostics,
) -> Vec<Candidate> {
    if functions.contains_key(symbol) {
        return vec![Candidate {
            func_name: symbol.to_string(),
            receiver: None,
            source: CandidateSource::Function,
        }];
    }
    if let Some(name) = suffix_match(symbol, functions) {
        return vec![Candidate {
            func_name: name.to_string(),
            receiver: None,
            source: CandidateSource::Function,
        }];
    }
    if builtins.contains(symbol) {
        return vec![Candidate {
            func_name: symbol.to_string(),
            receiver: None,
            source: CandidateSource::Builtin,
        }];
    }
    diagnostics.record_unresolved_call(call_id.clone(), ctx.to_string(), format!("no candidate for direct call `{symbol}`"));
    Vec::new()
}

fn resolve_indirect(
    expr_var: &str,
    call_id: &SiteId,
    ctx: &Context,
    env: &Env,
    diagnostics: &mut Diagnostics,
) -> Vec<Candidate> {
    let pts = env.get(ctx, expr_var);
    let mut candidates = Vec::new();
    for obj in pts.iter() {
        if let Some(name) = decode_function_name(obj) {
            candidates.push(Candidate {
                func_name: name.to_string(),
                receiver: None,
                source: CandidateSource::Function,
            });
        }
    }
    if candidates.is_empty() {
        diagnostics.record_unresolved_call(
            call_id.clone(),
            ctx.to_string(),
            format!("indirect call through `{expr_var}` resolved to no callable object"),
        );
    }
    candidates
}

fn resolve_method(
    receiver_var: &str,
    method: &str,
    call_id: &SiteId,
    ctx: &Context,
    env: &Env,
    heap: &crate::domain::Heap,
    functions: &FxHashMap<String, FunctionIr>,
    diagnostics: &mut Diagnostics,
    mut class_ctx: Option<ClassContext<'_>>,
) -> Vec<Candidate> {
    let receivers = env.get(ctx, receiver_var);
    let attr = FieldKey::attr(method);
    let mut candidates = Vec::new();
    for recv_obj in receivers.iter() {
        let attr_pts = heap.get(recv_obj, &attr);
        let mut resolved_via_heap = false;
        for callee_obj in attr_pts.iter() {
            if let Some(name) = decode_function_name(callee_obj) {
                candidates.push(Candidate {
                    func_name: name.to_string(),
                    receiver: Some(recv_obj.clone()),
                    source: CandidateSource::Function,
                });
                resolved_via_heap = true;
            }
        }
        if !resolved_via_heap {
            if let Some(found) = resolve_via_mro(recv_obj, method, functions, class_ctx.as_mut()) {
                candidates.push(found);
            }
        }
    }
    if candidates.is_empty() {
        diagnostics.record_unresolved_call(
            call_id.clone(),
            ctx.to_string(),
            format!("method call `.{method}` on `{receiver_var}` resolved to no candidate"),
        );
    }
    candidates
}

/// Additional candidate source gated behind `use_mro`: walk the
/// receiver's declared class's C3 linearization looking for a
/// `"{ancestor}.{method}"` registered function, the way a dynamic
/// dispatch would fall through the MRO when the instance's own heap
/// fields don't already carry a bound method.
fn resolve_via_mro(
    recv_obj: &AbstractObject,
    method: &str,
    functions: &FxHashMap<String, FunctionIr>,
    class_ctx: Option<&mut ClassContext<'_>>,
) -> Option<Candidate> {
    let class_ctx = class_ctx?;
    let class_name = class_ctx.instance_classes.get(recv_obj)?;
    for ancestor in class_ctx.hierarchy.mro(class_name) {
        let qualified = format!("{ancestor}.{method}");
        if functions.contains_key(&qualified) {
            return Some(Candidate {
                func_name: qualified,
                receiver: Some(recv_obj.clone()),
                source: CandidateSource::Function,
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::builtins::BuiltinRegistry;
    use crate::domain::{AllocKind, ContextPolicy, Heap};

    fn ctx() -> Context {
        ContextPolicy::Insensitive.empty_context()
    }

    #[test]
    fn direct_call_resolves_exact_symbol() {
        let mut functions = FxHashMap::default();
        functions.insert("foo".to_string(), FunctionIr::default());
        let env = Env::new();
        let heap = Heap::new();
        let builtins = BuiltinRegistry::new();
        let mut diags = Diagnostics::new();
        let candidates = resolve_candidates(
            &CallForm::Direct { symbol: "foo".into() },
            &ctx(),
            &SiteId::raw("s1"),
            &functions,
            &env,
            &heap,
            &builtins,
            &mut diags,
            None,
        );
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].func_name, "foo");
    }

    #[test]
    fn direct_call_falls_back_to_builtin() {
        let functions = FxHashMap::default();
        let env = Env::new();
        let heap = Heap::new();
        let builtins = BuiltinRegistry::new();
        let mut diags = Diagnostics::new();
        let candidates = resolve_candidates(
            &CallForm::Direct { symbol: "len".into() },
            &ctx(),
            &SiteId::raw("s1"),
            &functions,
            &env,
            &heap,
            &builtins,
            &mut diags,
            None,
        );
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].source, CandidateSource::Builtin);
    }

    #[test]
    fn unresolved_direct_call_is_recorded_not_fatal() {
        let functions = FxHashMap::default();
        let env = Env::new();
        let heap = Heap::new();
        let builtins = BuiltinRegistry::new();
        let mut diags = Diagnostics::new();
        let candidates = resolve_candidates(
            &CallForm::Direct { symbol: "totally_unknown".into() },
            &ctx(),
            &SiteId::raw("s1"),
            &functions,
            &env,
            &heap,
            &builtins,
            &mut diags,
            None,
        );
        assert!(candidates.is_empty());
        assert_eq!(diags.unresolved_calls.len(), 1);
    }

    #[test]
    fn method_call_resolves_via_heap_attr() {
        let mut env = Env::new();
        let mut heap = Heap::new();
        let recv = AbstractObject::make("r1", AllocKind::Obj, ctx(), &[], 0);
        let func = AbstractObject::make("Cls.bar", AllocKind::Func, ctx(), &[], 0);
        env.update(&ctx(), "x", &crate::domain::PointsToSet::singleton(recv.clone()));
        heap.update(&recv, &FieldKey::attr("bar"), &crate::domain::PointsToSet::singleton(func));
        let functions = FxHashMap::default();
        let builtins = BuiltinRegistry::new();
        let mut diags = Diagnostics::new();
        let candidates = resolve_candidates(
            &CallForm::Method { receiver: "x".into(), method: "bar".into() },
            &ctx(),
            &SiteId::raw("s1"),
            &functions,
            &env,
            &heap,
            &builtins,
            &mut diags,
            None,
        );
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].func_name, "Cls.bar");
        assert_eq!(candidates[0].receiver.as_ref().unwrap().alloc_id, "r1");
    }

    #[test]
    fn method_call_falls_back_to_mro_when_heap_attr_is_empty() {
        use crate::infrastructure::ClassHierarchy;

        let mut env = Env::new();
        let heap = Heap::new();
        let recv = AbstractObject::make("r1", AllocKind::Obj, ctx(), &[], 0);
        env.update(&ctx(), "x", &crate::domain::PointsToSet::singleton(recv.clone()));

        let mut functions = FxHashMap::default();
        functions.insert("Base.bar".to_string(), FunctionIr::default());
        let builtins = BuiltinRegistry::new();
        let mut diags = Diagnostics::new();

        let mut hierarchy = ClassHierarchy::new();
        hierarchy.declare("Base", vec![]);
        hierarchy.declare("Derived", vec!["Base".to_string()]);
        let mut instance_classes = FxHashMap::default();
        instance_classes.insert(recv.clone(), "Derived".to_string());
        let class_ctx = ClassContext { hierarchy: &mut hierarchy, instance_classes: &instance_classes };

        let candidates = resolve_candidates(
            &CallForm::Method { receiver: "x".into(), method: "bar".into() },
            &ctx(),
            &SiteId::raw("s1"),
            &functions,
            &env,
            &heap,
            &builtins,
            &mut diags,
            Some(class_ctx),
        );
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].func_name, "Base.bar");
        assert_eq!(candidates[0].receiver.as_ref().unwrap().alloc_id, "r1");
    }

    #[test]
    fn method_call_without_class_ctx_stays_unresolved() {
        let mut env = Env::new();
        let heap = Heap::new();
        let recv = AbstractObject::make("r1", AllocKind::Obj, ctx(), &[], 0);
        env.update(&ctx(), "x", &crate::domain::PointsToSet::singleton(recv));
        let functions = FxHashMap::default();
        let builtins = BuiltinRegistry::new();
        let mut diags = Diagnostics::new();
        let candidates = resolve_candidates(
            &CallForm::Method { receiver: "x".into(), method: "bar".into() },
            &ctx(),
            &SiteId::raw("s1"),
            &functions,
            &env,
            &heap,
            &builtins,
            &mut diags,
            None,
        );
        assert!(candidates.is_empty());
        assert_eq!(diags.unresolved_calls.len(), 1);
    }
}
