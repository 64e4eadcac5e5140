//! The context-sensitive call graph: edges keyed by
//! `(caller_ctx, call_site) → {(callee_ctx, callee)}`, with forward,
//! by-callee, and by-call-site indices, plus text/DOT/JSON dumpers.

use std::fmt::Write as _;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::domain::{CallSite, Context};

/// One call-graph node: a function under a specific calling context.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CallGraphNode {
    pub func: String,
    pub ctx: Context,
}

impl CallGraphNode {
    pub fn new(func: impl Into<String>, ctx: Context) -> Self {
        Self { func: func.into(), ctx }
    }
}

/// A resolved call edge, recorded once per distinct `(caller, site, callee)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEdge {
    pub caller: CallGraphNode,
    pub site: CallSite,
    pub callee: CallGraphNode,
}

/// The call graph built by the engine: provides the forward index
/// directly and derives the by-callee and by-site indices on demand.
#[derive(Debug, Default)]
pub struct CallGraph {
    /// `(caller_func, caller_ctx, site_id) -> {(callee_ctx, callee_func)}`,
    /// the canonical storage; everything else is a derived view.
    forward: FxHashMap<(String, Context, String), Vec<CallGraphNode>>,
    edges: Vec<CallEdge>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one resolved edge. No-op if this exact edge is already present.
    pub fn add_edge(&mut self, caller: CallGraphNode, site: CallSite, callee: CallGraphNode) {
        let key = (caller.func.clone(), caller.ctx.clone(), site.site_id.to_string());
        let bucket = self.forward.entry(key).or_default();
        if bucket.iter().any(|n| *n == callee) {
            return;
        }
        bucket.push(callee.clone());
        self.edges.push(CallEdge { caller, site, callee });
    }

    pub fn edges(&self) -> &[CallEdge] {
        &self.edges
    }

    pub fn callees_at(&self, caller_func: &str, caller_ctx: &Context, site_id: &str) -> &[CallGraphNode] {
        self.forward
            .get(&(caller_func.to_string(), caller_ctx.clone(), site_id.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Reverse (by-callee) index: every `(caller, site)` pair that reaches
    /// this callee node, built on demand.
    pub fn callers_of(&self, callee: &CallGraphNode) -> Vec<(CallGraphNode, CallSite)> {
        self.edges
            .iter()
            .filter(|e| e.callee == *callee)
            .map(|e| (e.caller.clone(), e.site.clone()))
            .collect()
    }

    /// By-site-id index: every edge whose call site matches, regardless
    /// of caller context (useful for "what can this call ever reach").
    pub fn edges_at_site(&self, site_id: &str) -> Vec<&CallEdge> {
        self.edges.iter().filter(|e| e.site.site_id.as_str() == site_id).collect()
    }

    pub fn num_nodes(&self) -> usize {
        let mut nodes = std::collections::HashSet::new();
        for e in &self.edges {
            nodes.insert(e.caller.clone());
            nodes.insert(e.callee.clone());
        }
        nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Plain-text edge list, one `caller@ctx --site--> callee@ctx` per line.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for e in &self.edges {
            let _ = writeln!(
                out,
                "{}@{} --{}--> {}@{}",
                e.caller.func, e.caller.ctx, e.site.site_id, e.callee.func, e.callee.ctx
            );
        }
        out
    }

    /// Graphviz DOT representation.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph call_graph {\n");
        for e in &self.edges {
            let _ = writeln!(
                out,
                "  \"{}@{}\" -> \"{}@{}\" [label=\"{}\"];",
                e.caller.func, e.caller.ctx, e.callee.func, e.callee.ctx, e.site.site_id
            );
        }
        out.push_str("}\n");
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.edges)
    }
}
