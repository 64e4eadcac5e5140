//! The semantic event schema: the in-process boundary between the
//! (external, out of scope) front-end and this engine.

use serde::{Deserialize, Serialize};

use super::site::SiteId;

/// One semantic event, tagged by kind. All variable references are local
/// variable names; `site`/`*_id` fields are site IDs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    Alloc {
        alloc_id: String,
        target: String,
        #[serde(rename = "type")]
        alloc_type: String,
        #[serde(default)]
        elements: Vec<String>,
        #[serde(default)]
        values: Vec<String>,
        /// Declared base class names, for a `type = "class"` alloc only.
        /// Empty for every other allocation kind.
        #[serde(default)]
        bases: Vec<String>,
    },
    Copy {
        source: String,
        target: String,
    },
    AttrLoad {
        obj: String,
        attr: String,
        target: String,
    },
    AttrStore {
        obj: String,
        attr: String,
        value: String,
    },
    ElemLoad {
        container: String,
        target: String,
        container_kind: String,
    },
    ElemStore {
        container: String,
        value: String,
        container_kind: String,
    },
    Call {
        call_id: String,
        #[serde(default)]
        callee_symbol: Option<String>,
        #[serde(default)]
        callee_expr: Option<String>,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        receiver: Option<String>,
        #[serde(default)]
        target: Option<String>,
    },
    Return {
        source: String,
    },
    /// Async constructs; consumed only by the async-facts helper, ignored
    /// by the pointer-analysis fixpoint itself.
    Async(AsyncEvent),
}

impl Event {
    /// Human-readable kind name, used for diagnostics and the
    /// "unrecognized event kind" skip-counter.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Alloc { .. } => "alloc",
            Self::Copy { .. } => "copy",
            Self::AttrLoad { .. } => "attr_load",
            Self::AttrStore { .. } => "attr_store",
            Self::ElemLoad { .. } => "elem_load",
            Self::ElemStore { .. } => "elem_store",
            Self::Call { .. } => "call",
            Self::Return { .. } => "return",
            Self::Async(e) => e.kind_name(),
        }
    }
}

/// Raw async constructs observed in the event stream, one variant per
/// kind of async syntax the front-end can emit. These feed the async
/// facts helper; the fixpoint engine does not interpret them beyond
/// treating any variable references inside as ordinary variable names
/// already covered by points-to results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "async_kind", rename_all = "snake_case")]
pub enum AsyncEvent {
    CoroutineDef {
        func_sym: String,
        def_site: SiteId,
        is_async: bool,
        is_async_gen: bool,
    },
    Await {
        await_id: SiteId,
        awaiter_fn: String,
        awaited_var: String,
    },
    CreateTask {
        task_id: SiteId,
        creator_fn: String,
        coroutine_var: String,
    },
    TaskOp {
        site_id: SiteId,
        op: String,
        task_var: String,
    },
    FutureAlloc {
        fut_id: SiteId,
        alloc_site: SiteId,
        created_in_fn: String,
    },
    QueueAlloc {
        queue_id: SiteId,
        queue_kind: String,
        maxsize: i64,
    },
    QueuePut {
        site_id: SiteId,
        queue_var: String,
        value_var: String,
    },
    QueueGet {
        site_id: SiteId,
        queue_var: String,
        target_var: String,
    },
    SyncAlloc {
        sync_id: SiteId,
        kind: String,
    },
    SyncOp {
        site_id: SiteId,
        kind: String,
        op: String,
        target_var: String,
    },
    LoopCallbackSchedule {
        cb_id: SiteId,
        api: String,
        #[serde(default)]
        delay: Option<f64>,
        callback_var: String,
        #[serde(default)]
        args_vars: Vec<String>,
    },
    Stream {
        site_id: SiteId,
        api: String,
        #[serde(default)]
        reader_var: Option<String>,
        #[serde(default)]
        writer_var: Option<String>,
    },
}

impl AsyncEvent {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::CoroutineDef { .. } => "coroutine_def",
            Self::Await { .. } => "await",
            Self::CreateTask { .. } => "create_task",
            Self::TaskOp { .. } => "task_op",
            Self::FutureAlloc { .. } => "future",
            Self::QueueAlloc { .. } => "queue_alloc",
            Self::QueuePut { .. } => "queue_put",
            Self::QueueGet { .. } => "queue_get",
            Self::SyncAlloc { .. } => "sync_alloc",
            Self::SyncOp { .. } => "sync_op",
            Self::LoopCallbackSchedule { .. } => "loop_cb_schedule",
            Self::Stream { .. } => "stream",
        }
    }
}

/// A function's event stream plus its declared formal parameters, as
/// enumerated once by the event source adapter at `initialize()`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionIr {
    pub name: String,
    /// Declared argument list, if the adapter exposes one.
    #[serde(default)]
    pub params: Option<Vec<String>>,
    pub events: Vec<Event>,
}
