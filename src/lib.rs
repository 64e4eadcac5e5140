/*
 * codegraph-ir - Context-sensitive points-to analysis engine
 *
 * Layering:
 * - domain/         : Pure abstract domain (contexts, objects, points-to sets, events)
 * - config/         : Engine configuration, policy parsing, presets
 * - application/     : The fixpoint engine, call resolution, builtin summaries
 * - infrastructure/ : Call graph, worklists, class hierarchy
 * - features/       : Post-fixpoint helpers (async facts)
 */

// Crate-level lint configuration
#![allow(clippy::too_many_arguments)] // Worklist/engine helpers need many params
#![allow(clippy::type_complexity)] // Context/field-key generic maps are necessarily nested
#![allow(clippy::module_inception)] // Module naming intentional (e.g. call_graph::CallGraph)
#![allow(clippy::needless_range_loop)] // Range loop for explicit worklist index bookkeeping

pub mod application;
pub mod config;
pub mod domain;
pub mod errors;
pub mod features;
pub mod infrastructure;

pub use application::{BuiltinRegistry, ConfigEcho, Engine, EngineState, ResultsBundle, RunOutcome};
pub use config::{parse_policy, EngineConfig, Preset};
pub use domain::{AbstractObject, AllocKind, Context, ContextPolicy, Diagnostics, Event, FieldKey, FunctionIr, PointsToSet};
pub use errors::{PtaError, PtaResult};
pub use features::{AsyncFact, AsyncFactIndex};
