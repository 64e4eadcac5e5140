//! The fixpoint engine: drives the constraint and call worklists to a
//! monotone fixpoint over `Env`/`Heap`/`CG`, following the
//! `PLANNED → RUNNING → COMPLETE|STOPPED → READY` state machine.

use std::time::Instant;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::domain::{
    AbstractObject, AllocKind, CallSite, Context, Diagnostics, Env, Event, FieldKey, FunctionIr, Heap, PointsToSet, SiteId,
};
use crate::errors::PtaResult;
use crate::infrastructure::{CallGraph, CallGraphNode, ClassHierarchy, DedupWorklist};

use super::builtins::{BuiltinCallCtx, BuiltinRegistry};
use super::call_resolution::{resolve_candidates, CallForm, CandidateSource, ClassContext};
use super::context_selector::ContextSelector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Planned,
    Running,
    Complete,
    Stopped,
    Ready,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Statistics {
    pub objects_created: u64,
    pub constraints_processed: u64,
    pub calls_processed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallGraphStats {
    pub num_nodes: usize,
    pub num_edges: usize,
}

/// The results bundle returned once the engine has reached a fixpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsBundle {
    pub points_to: FxHashMap<String, Vec<String>>,
    pub call_graph: CallGraphStats,
    pub contexts: FxHashMap<String, usize>,
    pub statistics: Statistics,
    pub heap_size: usize,
    pub env_size: usize,
    pub partial: bool,
    pub config: ConfigEcho,
}

/// The subset of `EngineConfig` worth echoing back to a caller inspecting
/// the results bundle: the policy token plus the two class-hierarchy
/// flags, since they silently change what method calls resolve to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigEcho {
    pub policy: String,
    pub build_class_hierarchy: bool,
    pub use_mro: bool,
}

/// Outcome of a `run()` call: whether the fixpoint completed or was cut
/// short, and how many outer iterations it took.
#[derive(Debug, Clone, Copy)]
pub struct RunOutcome {
    pub partial: bool,
    pub iterations: u64,
}

#[derive(Debug, Clone)]
enum ConstraintItem {
    Copy { ctx: Context, src: String, tgt: String },
    Load { ctx: Context, src: String, field: FieldKey, tgt: String },
    Store { ctx: Context, tgt: String, field: FieldKey, src: String },
}

#[derive(Debug, Clone)]
struct CallItem {
    ctx: Context,
    call_id: SiteId,
    caller_func: String,
    form: CallForm,
    args: Vec<String>,
    target: Option<String>,
}

/// Per-function-qualified name for the reserved `return` pseudo-variable,
/// so that two functions invoked under the same context (trivially true
/// under 0-CFA, where every context is identical) don't clobber each
/// other's return value in `Env`, which is keyed only on `(Context, VarName)`.
fn return_var(func: &str) -> String {
    format!("{func}#return")
}

pub struct Engine {
    config: EngineConfig,
    selector: ContextSelector,
    functions: FxHashMap<String, FunctionIr>,
    builtins: BuiltinRegistry,

    env: Env,
    heap: Heap,
    call_graph: CallGraph,
    diagnostics: Diagnostics,

    class_hierarchy: ClassHierarchy,
    instance_classes: FxHashMap<AbstractObject, String>,

    expanded: FxHashSet<(String, Context)>,
    constraint_items: Vec<ConstraintItem>,
    call_items: Vec<CallItem>,

    alloc_counter: u64,
    stats: Statistics,
    state: EngineState,
    deadline: Option<Instant>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> PtaResult<Self> {
        config.validate()?;
        let selector = ContextSelector::new(config.policy);
        Ok(Self {
            config,
            selector,
            functions: FxHashMap::default(),
            builtins: BuiltinRegistry::new(),
            env: Env::new(),
            heap: Heap::new(),
            call_graph: CallGraph::new(),
            diagnostics: Diagnostics::new(),
            class_hierarchy: ClassHierarchy::new(),
            instance_classes: FxHashMap::default(),
            expanded: FxHashSet::default(),
            constraint_items: Vec::new(),
            call_items: Vec::new(),
            alloc_counter: 0,
            stats: Statistics::default(),
            state: EngineState::Planned,
            deadline: None,
        })
    }

    /// Register an analyzable function's event stream. Only valid before
    /// `initialize()`.
    pub fn register_function(&mut self, name: impl Into<String>, ir: FunctionIr) {
        debug_assert_eq!(self.state, EngineState::Planned);
        self.functions.insert(name.into(), ir);
    }

    pub fn builtins_mut(&mut self) -> &mut BuiltinRegistry {
        &mut self.builtins
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Expand every registered function under the policy's empty context,
    /// enumerating its events once.
    pub fn initialize(&mut self) {
        debug_assert_eq!(self.state, EngineState::Planned);
        if let Some(timeout) = self.config.timeout {
            self.deadline = Some(Instant::now() + timeout);
        }
        let entry_ctx = self.selector.empty();
        let names: Vec<String> = self.functions.keys().cloned().collect();
        for name in names {
            self.expand(&name, &entry_ctx);
        }
        self.state = EngineState::Running;
    }

    /// Idempotent per-`(func, ctx)` expansion: dispatches every event in
    /// `func`'s body under `ctx`, producing allocations immediately and
    /// queuing constraint/call items for everything else.
    fn expand(&mut self, func: &str, ctx: &Context) {
        if !self.expanded.insert((func.to_string(), ctx.clone())) {
            return;
        }
        let Some(ir) = self.functions.get(func).cloned() else {
            self.diagnostics.record_skip(format!("unknown function `{func}`"));
            return;
        };
        for event in &ir.events {
            self.dispatch_event(func, ctx, event);
        }
    }

    fn dispatch_event(&mut self, func: &str, ctx: &Context, event: &Event) {
        match event {
            Event::Alloc { alloc_id, target, alloc_type, elements, values, bases } => {
                self.handle_alloc(ctx, alloc_id, target, alloc_type, elements, values, bases);
            }
            Event::Copy { source, target } => {
                self.constraint_items.push(ConstraintItem::Copy {
                    ctx: ctx.clone(),
                    src: source.clone(),
                    tgt: target.clone(),
                });
            }
            Event::AttrLoad { obj, attr, target } => {
                self.constraint_items.push(ConstraintItem::Load {
                    ctx: ctx.clone(),
                    src: obj.clone(),
                    field: FieldKey::from_token(attr),
                    tgt: target.clone(),
                });
            }
            Event::AttrStore { obj, attr, value } => {
                self.constraint_items.push(ConstraintItem::Store {
                    ctx: ctx.clone(),
                    tgt: obj.clone(),
                    field: FieldKey::from_token(attr),
                    src: value.clone(),
                });
            }
            Event::ElemLoad { container, target, container_kind } => {
                self.constraint_items.push(ConstraintItem::Load {
                    ctx: ctx.clone(),
                    src: container.clone(),
                    field: FieldKey::for_container_kind(container_kind),
                    tgt: target.clone(),
                });
            }
            Event::ElemStore { container, value, container_kind } => {
                self.constraint_items.push(ConstraintItem::Store {
                    ctx: ctx.clone(),
                    tgt: container.clone(),
                    field: FieldKey::for_container_kind(container_kind),
                    src: value.clone(),
                });
            }
            Event::Call { call_id, callee_symbol, callee_expr, args, receiver, target } => {
                let form = if let Some(recv) = receiver {
                    CallForm::Method {
                        receiver: recv.clone(),
                        method: callee_symbol.clone().unwrap_or_default(),
                    }
                } else if let Some(expr) = callee_expr {
                    CallForm::Indirect { expr_var: expr.clone() }
                } else if let Some(sym) = callee_symbol {
                    CallForm::Direct { symbol: sym.clone() }
                } else {
                    self.diagnostics.record_skip("call event with no callee symbol/expr/receiver");
                    return;
                };
                self.call_items.push(CallItem {
                    ctx: ctx.clone(),
                    call_id: SiteId::raw(call_id.clone()),
                    caller_func: func.to_string(),
                    form,
                    args: args.clone(),
                    target: target.clone(),
                });
            }
            Event::Return { source } => {
                self.constraint_items.push(ConstraintItem::Copy {
                    ctx: ctx.clone(),
                    src: source.clone(),
                    tgt: return_var(func),
                });
            }
            Event::Async(_) => {
                // Consumed only by the async-facts helper, not the fixpoint.
            }
        }
    }

    fn handle_alloc(
        &mut self,
        ctx: &Context,
        alloc_id: &str,
        target: &str,
        alloc_type: &str,
        elements: &[String],
        values: &[String],
        bases: &[String],
    ) {
        let kind = AllocKind::from_str(alloc_type);
        let alloc_ctx = self.selector.on_alloc(ctx, alloc_id, Some(alloc_type));
        let obj = AbstractObject::make(alloc_id, kind, alloc_ctx, &[], 0);
        self.stats.objects_created += 1;
        self.env.update(ctx, target, &PointsToSet::singleton(obj.clone()));

        if self.config.build_class_hierarchy {
            if kind == AllocKind::Class {
                self.class_hierarchy.declare(alloc_id.to_string(), bases.to_vec());
            } else if kind == AllocKind::Obj && alloc_type != "obj" {
                // `alloc_type` names a declared (or not-yet-declared) class;
                // `AllocKind::from_str` already collapsed it to `Obj`, so
                // stash the original string as this instance's class.
                self.instance_classes.insert(obj.clone(), alloc_type.to_string());
            }
        }

        if !elements.is_empty() {
            let mut pts = PointsToSet::empty();
            for var in elements {
                pts = pts.join(&self.env.get(ctx, var));
            }
            self.heap.update(&obj, &FieldKey::elem(), &pts);
        }
        if !values.is_empty() {
            let mut pts = PointsToSet::empty();
            for var in values {
                pts = pts.join(&self.env.get(ctx, var));
            }
            self.heap.update(&obj, &FieldKey::value(), &pts);
        }
    }

    /// Drive both worklists to a monotone fixpoint, respecting the
    /// iteration cap and deadline.
    pub fn run(&mut self) -> RunOutcome {
        debug_assert_eq!(self.state, EngineState::Running);
        let mut iterations: u64 = 0;
        loop {
            let changed = self.drain_one_pass();
            iterations += 1;
            if self.deadline_hit() {
                warn!(iterations, "pointer analysis stopped: deadline reached");
                self.diagnostics.stopped_early = true;
                self.state = EngineState::Stopped;
                return RunOutcome { partial: true, iterations };
            }
            if let Some(cap) = self.config.max_iterations {
                if iterations >= cap {
                    warn!(iterations, cap, "pointer analysis stopped: iteration cap reached");
                    self.diagnostics.stopped_early = true;
                    self.state = EngineState::Stopped;
                    return RunOutcome { partial: true, iterations };
                }
            }
            if !changed {
                debug!(iterations, "pointer analysis reached fixpoint");
                self.state = EngineState::Complete;
                return RunOutcome { partial: false, iterations };
            }
        }
    }

    fn deadline_hit(&self) -> bool {
        matches!(self.deadline, Some(d) if Instant::now() >= d)
    }

    /// One outer iteration: seed both worklists from everything known so
    /// far, drain to emptiness (newly discovered `(func, ctx)` pairs may
    /// grow the known item lists mid-drain), and report whether anything
    /// actually changed in `Env`/`Heap`/`CG`.
    fn drain_one_pass(&mut self) -> bool {
        let mut changed = false;
        let mut constraint_wl: DedupWorklist<usize> = DedupWorklist::new();
        for i in 0..self.constraint_items.len() {
            constraint_wl.push(i);
        }
        let mut call_wl: DedupWorklist<usize> = DedupWorklist::new();
        for i in 0..self.call_items.len() {
            call_wl.push(i);
        }

        let mut next_constraint = self.constraint_items.len();
        let mut next_call = self.call_items.len();
        loop {
            while let Some(i) = constraint_wl.pop() {
                if self.process_constraint(i) {
                    changed = true;
                }
            }
            while let Some(i) = call_wl.pop() {
                self.process_call(i);
                // processing a call may append new constraint/call items
                // (parameter passing, return wiring, freshly expanded
                // callees); pick those up on the next round below.
            }
            let mut grew = false;
            for i in next_constraint..self.constraint_items.len() {
                constraint_wl.push(i);
                grew = true;
            }
            next_constraint = self.constraint_items.len();
            for i in next_call..self.call_items.len() {
                call_wl.push(i);
                grew = true;
            }
            next_call = self.call_items.len();
            if !grew {
                break;
            }
        }
        changed
    }

    fn process_constraint(&mut self, i: usize) -> bool {
        self.stats.constraints_processed += 1;
        let item = self.constraint_items[i].clone();
        match item {
            ConstraintItem::Copy { ctx, src, tgt } => {
                let delta = self.env.get(&ctx, &src);
                self.env.update(&ctx, &tgt, &delta)
            }
            ConstraintItem::Load { ctx, src, field, tgt } => {
                let srcs = self.env.get(&ctx, &src);
                let mut delta = PointsToSet::empty();
                for obj in srcs.iter() {
                    delta = delta.join(&self.heap.get(obj, &field));
                }
                self.env.update(&ctx, &tgt, &delta)
            }
            ConstraintItem::Store { ctx, tgt, field, src } => {
                let delta = self.env.get(&ctx, &src);
                let mut changed = false;
                let targets = self.env.get(&ctx, &tgt);
                for obj in targets.iter() {
                    if self.heap.update(obj, &field, &delta) {
                        changed = true;
                    }
                }
                changed
            }
        }
    }

    fn process_call(&mut self, i: usize) {
        self.stats.calls_processed += 1;
        let item = self.call_items[i].clone();
        let class_ctx = self.config.use_mro.then(|| ClassContext {
            hierarchy: &mut self.class_hierarchy,
            instance_classes: &self.instance_classes,
        });
        let candidates = resolve_candidates(
            &item.form,
            &item.ctx,
            &item.call_id,
            &self.functions,
            &self.env,
            &self.heap,
            &self.builtins,
            &mut self.diagnostics,
            class_ctx,
        );

        if candidates.is_empty() {
            // Unresolved: fall back to the default summary on the target.
            let mut cx = BuiltinCallCtx::new(
                &item.ctx,
                &item.call_id,
                item.target.as_deref(),
                &item.args,
                &mut self.env,
                &mut self.heap,
                &mut self.diagnostics,
                &mut self.alloc_counter,
            );
            self.builtins.invoke("__default__", &mut cx);
            return;
        }

        let call_site = CallSite::new(item.call_id.clone(), item.caller_func.clone(), 0);
        for candidate in candidates {
            match candidate.source {
                CandidateSource::Builtin => {
                    let mut cx = BuiltinCallCtx::new(
                        &item.ctx,
                        &item.call_id,
                        item.target.as_deref(),
                        &item.args,
                        &mut self.env,
                        &mut self.heap,
                        &mut self.diagnostics,
                        &mut self.alloc_counter,
                    );
                    self.builtins.invoke(&candidate.func_name, &mut cx);
                }
                CandidateSource::Function => {
                    let receiver_alloc = candidate.receiver.as_ref().map(|o| o.alloc_id.as_str());
                    let receiver_type = None;
                    let callee_ctx = self.selector.on_call(&item.ctx, &call_site, &candidate.func_name, receiver_alloc, receiver_type);

                    self.call_graph.add_edge(
                        CallGraphNode::new(call_site.func.clone(), item.ctx.clone()),
                        call_site.clone(),
                        CallGraphNode::new(candidate.func_name.clone(), callee_ctx.clone()),
                    );

                    self.wire_parameters(&item, &candidate.func_name, candidate.receiver.as_ref(), &callee_ctx);
                    self.wire_return(&item, &candidate.func_name, &callee_ctx);

                    self.expand(&candidate.func_name, &callee_ctx);
                }
            }
        }
    }

    fn formal_params(&self, callee: &str, num_args: usize) -> Vec<String> {
        if let Some(ir) = self.functions.get(callee) {
            if let Some(params) = &ir.params {
                return params.clone();
            }
        }
        let has_class_component = callee.contains('.');
        let mut formals = Vec::new();
        if has_class_component {
            formals.push("self".to_string());
        }
        for idx in 0..num_args {
            formals.push(format!("param_{idx}"));
        }
        formals
    }

    fn wire_parameters(&mut self, item: &CallItem, callee: &str, receiver: Option<&AbstractObject>, callee_ctx: &Context) {
        let formals = self.formal_params(callee, item.args.len());
        let mut remaining = formals.as_slice();

        if remaining.first().map(String::as_str) == Some("self") {
            remaining = &remaining[1..];
            if let Some(recv_obj) = receiver {
                self.env.update(callee_ctx, "self", &PointsToSet::singleton(recv_obj.clone()));
            } else if let Some(target) = &item.target {
                let existing = self.env.get(&item.ctx, target);
                if !existing.is_empty() {
                    self.env.update(callee_ctx, "self", &existing);
                } else {
                    self.alloc_counter += 1;
                    let alloc_id = format!("{}#ctor#{}", item.call_id, self.alloc_counter);
                    let fresh = AbstractObject::make(alloc_id, AllocKind::Obj, item.ctx.clone(), &[], 0);
                    self.stats.objects_created += 1;
                    self.env.update(&item.ctx, target, &PointsToSet::singleton(fresh.clone()));
                    self.env.update(callee_ctx, "self", &PointsToSet::singleton(fresh));
                }
            }
        }

        for (formal, actual) in remaining.iter().zip(item.args.iter()) {
            let actual_pts = self.env.get(&item.ctx, actual);
            self.env.update(callee_ctx, formal, &actual_pts);
        }
    }

    /// Copy the callee's `return` pseudo-variable (under `callee_ctx`)
    /// into the call's target (under the caller's `ctx`). Done as a
    /// direct copy rather than a queued `ConstraintItem` since
    /// source and target live under different contexts, and because
    /// `process_call` already reruns every outer iteration, so this picks
    /// up growth in the callee's return value on its own.
    fn wire_return(&mut self, item: &CallItem, callee: &str, callee_ctx: &Context) {
        if let Some(target) = &item.target {
            let pts = self.env.get(callee_ctx, &return_var(callee));
            self.env.update(&item.ctx, target, &pts);
        }
    }

    pub fn results(&mut self) -> ResultsBundle {
        let partial = matches!(self.state, EngineState::Stopped);
        self.state = EngineState::Ready;

        let mut points_to: FxHashMap<String, Vec<String>> = FxHashMap::default();
        for ((ctx, var), pts) in self.env.iter() {
            let key = format!("{var}@{ctx}");
            let mut objs: Vec<String> = pts.iter().map(|o| o.to_string()).collect();
            objs.sort();
            points_to.insert(key, objs);
        }

        let mut contexts: FxHashMap<String, usize> = FxHashMap::default();
        for ((ctx, _), _) in self.env.iter() {
            contexts.entry(ctx.to_string()).or_insert_with(|| ctx.depth());
        }

        ResultsBundle {
            points_to,
            call_graph: CallGraphStats {
                num_nodes: self.call_graph.num_nodes(),
                num_edges: self.call_graph.num_edges(),
            },
            contexts,
            statistics: self.stats.clone(),
            heap_size: self.heap.len(),
            env_size: self.env.len(),
            partial,
            config: ConfigEcho {
                policy: format!("{:?}", self.config.policy),
                build_class_hierarchy: self.config.build_class_hierarchy,
                use_mro: self.config.use_mro,
            },
        }
    }

    pub fn call_graph(&self) -> &CallGraph {
        &self.call_graph
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn state(&self) -> EngineState {
        self.state
    }
}
