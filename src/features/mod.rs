//! Feature modules layered on top of the core engine.

pub mod async_facts;

pub use async_facts::{collect, to_jsonl, AsyncFact, AsyncFactIndex};
