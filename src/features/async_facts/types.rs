//! The async fact schema: one tagged record per kind of async construct,
//! produced by the collector's second pass over the event stream once
//! the pointer analysis has reached a fixpoint. A closed Rust enum
//! rather than a family of dict shapes, the same "tagged sum over an
//! open class hierarchy" move as [`crate::domain::Context`].

use serde::{Deserialize, Serialize};

use crate::domain::SiteId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "fact_kind", rename_all = "snake_case")]
pub enum AsyncFact {
    CoroutineDef {
        func_sym: String,
        def_site: SiteId,
        is_async: bool,
        is_async_gen: bool,
    },
    AwaitEdge {
        await_id: SiteId,
        awaiter_fn: String,
        awaited_targets: Vec<String>,
        may_unknown: bool,
    },
    TaskCreate {
        task_id: SiteId,
        creator_fn: String,
        targets: Vec<String>,
        args_vars: Vec<String>,
        may_unknown: bool,
    },
    TaskState {
        site_id: SiteId,
        op: String,
        task_ids: Vec<String>,
    },
    Future {
        fut_id: SiteId,
        alloc_site: SiteId,
        created_in_fn: String,
    },
    QueueAlloc {
        queue_id: SiteId,
        queue_kind: String,
        maxsize: i64,
        alloc_ctx: String,
    },
    QueuePut {
        site_id: SiteId,
        queue_ids: Vec<String>,
        value_vars: Vec<String>,
    },
    QueueGet {
        site_id: SiteId,
        queue_ids: Vec<String>,
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
        target_ids: Vec<String>,
    },
    LoopCbSchedule {
        cb_id: SiteId,
        api: String,
        delay: Option<f64>,
        callback_targets: Vec<String>,
        args_vars: Vec<String>,
    },
    CallbackEdge {
        cb_id: SiteId,
        caller_fn: String,
        callee_targets: Vec<String>,
    },
    Stream {
        site_id: SiteId,
        api: String,
        reader_var: Option<String>,
        writer_var: Option<String>,
    },
}

impl AsyncFact {
    /// Ordering key for export: facts are ordered by fact kind then
    /// insertion order, so this is a plain discriminant index into the
    /// schema order.
    pub fn kind_rank(&self) -> u8 {
        match self {
            Self::CoroutineDef { .. } => 0,
            Self::AwaitEdge { .. } => 1,
            Self::TaskCreate { .. } => 2,
            Self::TaskState { .. } => 3,
            Self::Future { .. } => 4,
            Self::QueueAlloc { .. } => 5,
            Self::QueuePut { .. } => 6,
            Self::QueueGet { .. } => 7,
            Self::SyncAlloc { .. } => 8,
            Self::SyncOp { .. } => 9,
            Self::LoopCbSchedule { .. } => 10,
            Self::CallbackEdge { .. } => 11,
            Self::Stream { .. } => 12,
        }
    }
}
