//! Domain layer: the abstract points-to domain — pure types and logic,
//! no I/O, no engine orchestration.

pub mod abstract_object;
pub mod context;
pub mod diagnostics;
pub mod env_heap;
pub mod events;
pub mod field_key;
pub mod points_to_set;
pub mod site;

pub use abstract_object::{AbstractObject, AllocKind, ReceiverLink};
pub use context::{Context, ContextPolicy};
pub use diagnostics::{Diagnostics, SoundnessNotice, UnresolvedCall};
pub use env_heap::{Env, Heap};
pub use events::{AsyncEvent, Event, FunctionIr};
pub use field_key::FieldKey;
pub use points_to_set::PointsToSet;
pub use site::{CallSite, SiteId};
