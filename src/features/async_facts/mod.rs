//! Async facts helper: a second pass over the event stream, run after
//! the pointer analysis fixpoint, that extracts typed records for
//! coroutine definitions, await edges, task lifecycle operations, queues,
//! synchronization primitives, event-loop callbacks, and streams.

pub mod collector;
pub mod export;
pub mod index;
pub mod types;

pub use collector::collect;
pub use export::to_jsonl;
pub use index::AsyncFactIndex;
pub use types::AsyncFact;
