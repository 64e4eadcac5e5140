//! The diagnostics side-channel: everything from the error taxonomy that
//! is not a configuration error is accumulated here instead of being
//! raised, so a run always produces a best-effort result alongside a
//! record of what it had to skip, guess at, or give up on.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::site::SiteId;

/// One unresolved call: a call site where candidate resolution found no
/// callee and the engine fell back to the conservative default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnresolvedCall {
    pub call_id: SiteId,
    pub caller_ctx: String,
    pub reason: String,
}

/// A non-fatal soundness notice: a place where the engine knowingly
/// under- or over-approximates (e.g. an adapter error skip, an iteration
/// cap hit, a builtin with no summary).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundnessNotice {
    pub site: Option<SiteId>,
    pub message: String,
}

/// Accumulated non-fatal findings from one engine run. Never causes a
/// run to fail; `EngineConfig`/callers decide what to do with it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Adapter/event skip counts, keyed by the reason string (e.g. an
    /// unrecognized event kind, a malformed record).
    pub skipped_events: FxHashMap<String, u64>,
    pub unresolved_calls: Vec<UnresolvedCall>,
    pub soundness_notices: Vec<SoundnessNotice>,
    /// Set when the engine stopped early via the iteration cap or
    /// deadline rather than reaching a genuine fixpoint.
    pub stopped_early: bool,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_skip(&mut self, reason: impl Into<String>) {
        *self.skipped_events.entry(reason.into()).or_insert(0) += 1;
    }

    pub fn record_unresolved_call(&mut self, call_id: SiteId, caller_ctx: impl Into<String>, reason: impl Into<String>) {
        self.unresolved_calls.push(UnresolvedCall {
            call_id,
            caller_ctx: caller_ctx.into(),
            reason: reason.into(),
        });
    }

    pub fn notice(&mut self, site: Option<SiteId>, message: impl Into<String>) {
        self.soundness_notices.push(SoundnessNotice {
            site,
            message: message.into(),
        });
    }

    pub fn total_skipped(&self) -> u64 {
        self.skipped_events.values().sum()
    }

    pub fn is_clean(&self) -> bool {
        !self.stopped_early
            && self.unresolved_calls.is_empty()
            && self.soundness_notices.is_empty()
            && self.skipped_events.is_empty()
    }
}
