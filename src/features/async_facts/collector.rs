//! The async facts collector: a second pass over every function's event
//! stream, run once the pointer analysis has reached a fixpoint, that
//! turns each async-construct event into a typed fact and resolves its
//! variable references through the completed `Env`.

use rustc_hash::FxHashMap;

use crate::application::call_resolution::decode_function_name;
use crate::domain::{AsyncEvent, Env, Event, FunctionIr};

use super::types::AsyncFact;

/// Resolve a variable to the allocation IDs of the objects it may point
/// to, unioned across every context the variable was ever assigned
/// under. Variable names are assumed unique per file, so this join is
/// exact, not an approximation across unrelated variables that happen to
/// share a name.
fn resolve_targets(env: &Env, var: &str) -> Vec<String> {
    let mut targets = Vec::new();
    for ((_, v), pts) in env.iter() {
        if v != var {
            continue;
        }
        for obj in pts.iter() {
            targets.push(obj.alloc_id.clone());
        }
    }
    targets.sort();
    targets.dedup();
    targets
}

/// Like [`resolve_targets`], but decodes each resolved object to a
/// callable's qualified name rather than its raw allocation ID (used for
/// `create_task`'s coroutine argument and callback scheduling, where the
/// interesting fact is *which function* was referenced, not which
/// coroutine-frame object).
fn resolve_callable_targets(env: &Env, var: &str) -> Vec<String> {
    let mut targets = Vec::new();
    for ((_, v), pts) in env.iter() {
        if v != var {
            continue;
        }
        for obj in pts.iter() {
            if let Some(name) = decode_function_name(obj) {
                targets.push(name.to_string());
            }
        }
    }
    targets.sort();
    targets.dedup();
    targets
}

/// Run the collector over every registered function's event stream.
pub fn collect(functions: &FxHashMap<String, FunctionIr>, env: &Env) -> Vec<AsyncFact> {
    let mut facts = Vec::new();
    for ir in functions.values() {
        for event in &ir.events {
            if let Event::Async(async_event) = event {
                facts.push(to_fact(async_event, env));
                // `loop_cb_schedule` and `callback_edge` describe the same
                // scheduling site from two angles; emit both.
                if let AsyncEvent::LoopCallbackSchedule { cb_id, callback_var, .. } = async_event {
                    facts.push(AsyncFact::CallbackEdge {
                        cb_id: cb_id.clone(),
                        caller_fn: ir.name.clone(),
                        callee_targets: resolve_callable_targets(env, callback_var),
                    });
                }
            }
        }
    }
    facts
}

fn to_fact(event: &AsyncEvent, env: &Env) -> AsyncFact {
    match event {
        AsyncEvent::CoroutineDef { func_sym, def_site, is_async, is_async_gen } => AsyncFact::CoroutineDef {
            func_sym: func_sym.clone(),
            def_site: def_site.clone(),
            is_async: *is_async,
            is_async_gen: *is_async_gen,
        },
        AsyncEvent::Await { await_id, awaiter_fn, awaited_var } => {
            let awaited_targets = resolve_callable_targets(env, awaited_var);
            let may_unknown = awaited_targets.is_empty();
            AsyncFact::AwaitEdge {
                await_id: await_id.clone(),
                awaiter_fn: awaiter_fn.clone(),
                awaited_targets,
                may_unknown,
            }
        }
        AsyncEvent::CreateTask { task_id, creator_fn, coroutine_var } => {
            let targets = resolve_callable_targets(env, coroutine_var);
            let may_unknown = targets.is_empty();
            AsyncFact::TaskCreate {
                task_id: task_id.clone(),
                creator_fn: creator_fn.clone(),
                targets,
                args_vars: Vec::new(),
                may_unknown,
            }
        }
        AsyncEvent::TaskOp { site_id, op, task_var } => AsyncFact::TaskState {
            site_id: site_id.clone(),
            op: op.clone(),
            task_ids: resolve_targets(env, task_var),
        },
        AsyncEvent::FutureAlloc { fut_id, alloc_site, created_in_fn } => AsyncFact::Future {
            fut_id: fut_id.clone(),
            alloc_site: alloc_site.clone(),
            created_in_fn: created_in_fn.clone(),
        },
        AsyncEvent::QueueAlloc { queue_id, queue_kind, maxsize } => AsyncFact::QueueAlloc {
            queue_id: queue_id.clone(),
            queue_kind: queue_kind.clone(),
            maxsize: *maxsize,
            alloc_ctx: String::new(),
        },
        AsyncEvent::QueuePut { site_id, queue_var, value_var } => AsyncFact::QueuePut {
            site_id: site_id.clone(),
            queue_ids: resolve_targets(env, queue_var),
            value_vars: vec![value_var.clone()],
        },
        AsyncEvent::QueueGet { site_id, queue_var, target_var } => AsyncFact::QueueGet {
            site_id: site_id.clone(),
            queue_ids: resolve_targets(env, queue_var),
            target_var: target_var.clone(),
        },
        AsyncEvent::SyncAlloc { sync_id, kind } => AsyncFact::SyncAlloc {
            sync_id: sync_id.clone(),
            kind: kind.clone(),
        },
        AsyncEvent::SyncOp { site_id, kind, op, target_var } => AsyncFact::SyncOp {
            site_id: site_id.clone(),
            kind: kind.clone(),
            op: op.clone(),
            target_ids: resolve_targets(env, target_var),
        },
        AsyncEvent::LoopCallbackSchedule { cb_id, api, delay, callback_var, args_vars } => AsyncFact::LoopCbSchedule {
            cb_id: cb_id.clone(),
            api: api.clone(),
            delay: *delay,
            callback_targets: resolve_callable_targets(env, callback_var),
            args_vars: args_vars.clone(),
        },
        AsyncEvent::Stream { site_id, api, reader_var, writer_var } => AsyncFact::Stream {
            site_id: site_id.clone(),
            api: api.clone(),
            reader_var: reader_var.clone(),
            writer_var: writer_var.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AbstractObject, AllocKind, ContextPolicy, PointsToSet, SiteId};

    fn ir(name: &str, events: Vec<Event>) -> FunctionIr {
        FunctionIr { name: name.to_string(), params: None, events }
    }

    #[test]
    fn coroutine_def_passes_through_unchanged() {
        let mut functions = FxHashMap::default();
        functions.insert(
            "worker".to_string(),
            ir(
                "worker",
                vec![Event::Async(AsyncEvent::CoroutineDef {
                    func_sym: "worker".into(),
                    def_site: SiteId::raw("f:1:1:def"),
                    is_async: true,
                    is_async_gen: false,
                })],
            ),
        );
        let env = Env::new();
        let facts = collect(&functions, &env);
        assert_eq!(facts.len(), 1);
        match &facts[0] {
            AsyncFact::CoroutineDef { is_async, .. } => assert!(*is_async),
            _ => panic!("wrong fact"),
        }
    }

    #[test]
    fn await_with_no_resolved_target_is_flagged_unknown() {
        let mut functions = FxHashMap::default();
        functions.insert(
            "main".to_string(),
            ir(
                "main",
                vec![Event::Async(AsyncEvent::Await {
                    await_id: SiteId::raw("f:2:1:await"),
                    awaiter_fn: "main".into(),
                    awaited_var: "task".into(),
                })],
            ),
        );
        let env = Env::new();
        let facts = collect(&functions, &env);
        match &facts[0] {
            AsyncFact::AwaitEdge { may_unknown, awaited_targets, .. } => {
                assert!(*may_unknown);
                assert!(awaited_targets.is_empty());
            }
            _ => panic!("wrong fact"),
        }
    }

    #[test]
    fn await_resolves_coroutine_target_via_env() {
        let mut functions = FxHashMap::default();
        functions.insert(
            "main".to_string(),
            ir(
                "main",
                vec![Event::Async(AsyncEvent::Await {
                    await_id: SiteId::raw("f:2:1:await"),
                    awaiter_fn: "main".into(),
                    awaited_var: "task".into(),
                })],
            ),
        );
        let mut env = Env::new();
        let ctx = ContextPolicy::Insensitive.empty_context();
        let func_obj = AbstractObject::make("worker", AllocKind::Func, ctx.clone(), &[], 0);
        env.update(&ctx, "task", &PointsToSet::singleton(func_obj));
        let facts = collect(&functions, &env);
        match &facts[0] {
            AsyncFact::AwaitEdge { awaited_targets, may_unknown, .. } => {
                assert!(!*may_unknown);
                assert_eq!(awaited_targets, &vec!["worker".to_string()]);
            }
            _ => panic!("wrong fact"),
        }
    }
}
