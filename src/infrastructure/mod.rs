//! Infrastructure layer: the call graph, dedup worklists, and the
//! supplemental class hierarchy index.

pub mod call_graph;
pub mod class_hierarchy;
pub mod worklist;

pub use call_graph::{CallEdge, CallGraph, CallGraphNode};
pub use class_hierarchy::ClassHierarchy;
pub use worklist::DedupWorklist;
