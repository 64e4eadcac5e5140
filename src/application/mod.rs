//! Application layer: orchestration of the domain types into the
//! fixpoint engine, plus the call-resolution and builtin-summary
//! machinery it drives.

pub mod builtins;
pub mod call_resolution;
pub mod context_selector;
pub mod engine;

pub use builtins::BuiltinRegistry;
pub use call_resolution::resolve_candidates;
pub use context_selector::ContextSelector;
pub use engine::{ConfigEcho, Engine, EngineState, ResultsBundle, RunOutcome};
