//! The context abstraction: a closed tagged union over the five policy
//! families, each carrying its own fixed bound.
//!
//! Modeled as a single sum type rather than an open class hierarchy (see
//! DESIGN.md, Open Question 1): the policy enum names the variant to
//! construct and the engine never needs dynamic dispatch to tell them
//! apart.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::site::CallSite;

/// Context-sensitivity policy, parsed from a policy-string token
/// (see [`crate::config::policy::parse_policy`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextPolicy {
    Insensitive,
    CallString(u8),
    Object(u8),
    Type(u8),
    Receiver(u8),
    Hybrid { call_k: u8, obj_depth: u8 },
}

impl ContextPolicy {
    pub fn empty_context(self) -> Context {
        match self {
            Self::Insensitive => Context::CallString { sites: Vec::new(), k: 0 },
            Self::CallString(k) => Context::CallString { sites: Vec::new(), k },
            Self::Object(depth) => Context::Object { allocs: Vec::new(), depth },
            Self::Type(depth) => Context::Type { types: Vec::new(), depth },
            Self::Receiver(depth) => Context::Receiver { receivers: Vec::new(), depth },
            Self::Hybrid { call_k, obj_depth } => Context::Hybrid {
                sites: Vec::new(),
                allocs: Vec::new(),
                call_k,
                obj_depth,
            },
        }
    }
}

/// A tagged context value. Immutable once created; every mutator returns
/// a new value. Equality and hashing include the variant tag and its
/// bound, so two contexts built under different policies never compare
/// equal even with the same contents.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Context {
    CallString { sites: Vec<CallSite>, k: u8 },
    Object { allocs: Vec<String>, depth: u8 },
    Type { types: Vec<String>, depth: u8 },
    Receiver { receivers: Vec<String>, depth: u8 },
    Hybrid {
        sites: Vec<CallSite>,
        allocs: Vec<String>,
        call_k: u8,
        obj_depth: u8,
    },
}

/// Push an element onto a bounded sequence, dropping the oldest entry
/// first if it is already at its bound.
fn push_bounded<T>(seq: &mut Vec<T>, bound: u8, item: T) {
    if bound == 0 {
        return;
    }
    if seq.len() >= bound as usize {
        seq.remove(0);
    }
    seq.push(item);
}

impl Context {
    /// Depth/length of this context's single dimension (or, for `Hybrid`,
    /// the sum of both dimensions' current lengths — used only for
    /// diagnostics/statistics; bound-checking happens per dimension, not
    /// on this aggregate).
    pub fn depth(&self) -> usize {
        match self {
            Self::CallString { sites, .. } => sites.len(),
            Self::Object { allocs, .. } => allocs.len(),
            Self::Type { types, .. } => types.len(),
            Self::Receiver { receivers, .. } => receivers.len(),
            Self::Hybrid { sites, allocs, .. } => sites.len() + allocs.len(),
        }
    }

    /// Append a call site, respecting the `CallString`/`Hybrid` bound.
    /// No-op (returns `self` unchanged) on other variants.
    pub fn with_call_site(&self, site: &CallSite) -> Self {
        match self {
            Self::CallString { sites, k } => {
                let mut sites = sites.clone();
                push_bounded(&mut sites, *k, site.clone());
                Self::CallString { sites, k: *k }
            }
            Self::Hybrid {
                sites,
                allocs,
                call_k,
                obj_depth,
            } => {
                let mut sites = sites.clone();
                push_bounded(&mut sites, *call_k, site.clone());
                Self::Hybrid {
                    sites,
                    allocs: allocs.clone(),
                    call_k: *call_k,
                    obj_depth: *obj_depth,
                }
            }
            other => other.clone(),
        }
    }

    /// Append an allocation-site string, respecting the `Object`/`Hybrid`
    /// bound.
    pub fn with_alloc(&self, alloc_site: &str) -> Self {
        match self {
            Self::Object { allocs, depth } => {
                let mut allocs = allocs.clone();
                push_bounded(&mut allocs, *depth, alloc_site.to_string());
                Self::Object { allocs, depth: *depth }
            }
            Self::Hybrid {
                sites,
                allocs,
                call_k,
                obj_depth,
            } => {
                let mut allocs = allocs.clone();
                push_bounded(&mut allocs, *obj_depth, alloc_site.to_string());
                Self::Hybrid {
                    sites: sites.clone(),
                    allocs,
                    call_k: *call_k,
                    obj_depth: *obj_depth,
                }
            }
            other => other.clone(),
        }
    }

    /// Append a type name, respecting the `Type` bound.
    pub fn with_type(&self, type_name: &str) -> Self {
        match self {
            Self::Type { types, depth } => {
                let mut types = types.clone();
                push_bounded(&mut types, *depth, type_name.to_string());
                Self::Type { types, depth: *depth }
            }
            other => other.clone(),
        }
    }

    /// Append a receiver allocation site, respecting the `Receiver` bound.
    pub fn with_receiver(&self, receiver_alloc: &str) -> Self {
        match self {
            Self::Receiver { receivers, depth } => {
                let mut receivers = receivers.clone();
                push_bounded(&mut receivers, *depth, receiver_alloc.to_string());
                Self::Receiver {
                    receivers,
                    depth: *depth,
                }
            }
            other => other.clone(),
        }
    }

    /// Coerce this context to the shape `policy` expects, producing the
    /// policy's empty context if the variant tags disagree (e.g. if the
    /// caller context's variant disagrees with the policy).
    pub fn coerce_to(&self, policy: ContextPolicy) -> Self {
        let matches = matches!(
            (self, policy),
            (Context::CallString { .. }, ContextPolicy::Insensitive | ContextPolicy::CallString(_))
                | (Context::Object { .. }, ContextPolicy::Object(_))
                | (Context::Type { .. }, ContextPolicy::Type(_))
                | (Context::Receiver { .. }, ContextPolicy::Receiver(_))
                | (Context::Hybrid { .. }, ContextPolicy::Hybrid { .. })
        );
        if matches {
            self.clone()
        } else {
            policy.empty_context()
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CallString { sites, k } => {
                write!(f, "cs[{}]<=", k)?;
                for (i, s) in sites.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", s.site_id)?;
                }
                Ok(())
            }
            Self::Object { allocs, depth } => write!(f, "obj[{}]<={}>", allocs.join(","), depth),
            Self::Type { types, depth } => write!(f, "type[{}]<={}>", types.join(","), depth),
            Self::Receiver { receivers, depth } => {
                write!(f, "rcv[{}]<={}>", receivers.join(","), depth)
            }
            Self::Hybrid {
                sites,
                allocs,
                call_k,
                obj_depth,
            } => {
                let site_str: Vec<String> = sites.iter().map(|s| s.site_id.to_string()).collect();
                write!(
                    f,
                    "hybrid[{}|{}]<={},{}>",
                    site_str.join(","),
                    allocs.join(","),
                    call_k,
                    obj_depth
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(id: &str) -> CallSite {
        CallSite::new(id.into(), "f", 0)
    }

    #[test]
    fn truncation_drops_oldest() {
        let ctx = ContextPolicy::CallString(2).empty_context();
        let ctx = ctx.with_call_site(&site("a"));
        let ctx = ctx.with_call_site(&site("b"));
        let ctx = ctx.with_call_site(&site("c"));
        match ctx {
            Context::CallString { sites, k } => {
                assert_eq!(k, 2);
                assert_eq!(sites.len(), 2);
                assert_eq!(sites[0].site_id.as_str(), "b");
                assert_eq!(sites[1].site_id.as_str(), "c");
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn zero_bound_never_grows() {
        let ctx = ContextPolicy::CallString(0).empty_context();
        let ctx = ctx.with_call_site(&site("a"));
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn distinct_policies_never_compare_equal() {
        let a = ContextPolicy::CallString(2).empty_context();
        let b = ContextPolicy::Object(2).empty_context();
        assert_ne!(a, b);
    }

    #[test]
    fn coerce_replaces_mismatched_variant() {
        let wrong = ContextPolicy::Object(2).empty_context();
        let coerced = wrong.coerce_to(ContextPolicy::CallString(2));
        assert_eq!(coerced, ContextPolicy::CallString(2).empty_context());
    }
}
