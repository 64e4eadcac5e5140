//! Abstract objects: heap addresses identified by `(alloc_id, alloc_ctx,
//! recv_fingerprint?)`.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::context::Context;

/// The kind an allocation site was declared with. Mirrors the `type`
/// field of an `alloc` event. `Func`/`Class` are tagged explicitly at
/// emission time rather than inferred from the allocation ID string —
/// see DESIGN.md, Open Question 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AllocKind {
    Obj,
    List,
    Tuple,
    Dict,
    Set,
    Func,
    Class,
    Exc,
    GenFrame,
    Queue,
    Sync,
    Future,
    Stream,
}

impl AllocKind {
    pub fn from_str(s: &str) -> Self {
        match s {
            "list" => Self::List,
            "tuple" => Self::Tuple,
            "dict" => Self::Dict,
            "set" => Self::Set,
            "func" => Self::Func,
            "class" => Self::Class,
            "exc" => Self::Exc,
            "genframe" => Self::GenFrame,
            "queue" => Self::Queue,
            "sync" => Self::Sync,
            "future" => Self::Future,
            "stream" => Self::Stream,
            _ => Self::Obj,
        }
    }

    /// Whether an object of this kind is a candidate callee for
    /// indirect/method call resolution.
    pub fn is_callable(self) -> bool {
        matches!(self, Self::Func)
    }

    pub fn is_container(self) -> bool {
        matches!(self, Self::List | Self::Tuple | Self::Dict | Self::Set)
    }
}

/// One element of a receiver fingerprint: the `(alloc_id, alloc_ctx)` pair
/// of a receiver object, truncated to `obj_depth` entries.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReceiverLink {
    pub alloc_id: String,
    pub alloc_ctx: String,
}

/// `(alloc_id, alloc_ctx, recv_fingerprint?)` — object identity and thus
/// the heap address space.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AbstractObject {
    pub alloc_id: String,
    pub alloc_kind: AllocKind,
    pub alloc_ctx: Context,
    pub recv_fingerprint: Vec<ReceiverLink>,
}

impl AbstractObject {
    /// Build an object identity from an allocation site, its context, and
    /// (for k-object sensitivity) the enclosing receiver chain.
    ///
    /// `receivers` is the caller's current receiver chain (oldest first);
    /// only the last `depth` entries are kept, each mapped to
    /// `(alloc_id, string_of(alloc_ctx))`. The fingerprint must come from
    /// abstract receiver objects, not concrete call sites.
    pub fn make(
        alloc_id: impl Into<String>,
        alloc_kind: AllocKind,
        alloc_ctx: Context,
        receivers: &[AbstractObject],
        depth: u8,
    ) -> Self {
        let fingerprint = if receivers.is_empty() || depth == 0 {
            Vec::new()
        } else {
            let depth = depth as usize;
            let start = receivers.len().saturating_sub(depth);
            receivers[start..]
                .iter()
                .map(|r| ReceiverLink {
                    alloc_id: r.alloc_id.clone(),
                    alloc_ctx: r.alloc_ctx.to_string(),
                })
                .collect()
        };
        Self {
            alloc_id: alloc_id.into(),
            alloc_kind,
            alloc_ctx,
            recv_fingerprint: fingerprint,
        }
    }
}

impl fmt::Display for AbstractObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.alloc_id, self.alloc_ctx)?;
        if !self.recv_fingerprint.is_empty() {
            write!(f, "/")?;
            for (i, r) in self.recv_fingerprint.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{}@{}", r.alloc_id, r.alloc_ctx)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::context::ContextPolicy;

    #[test]
    fn empty_receivers_give_empty_fingerprint() {
        let ctx = ContextPolicy::Insensitive.empty_context();
        let o = AbstractObject::make("a1", AllocKind::Obj, ctx, &[], 2);
        assert!(o.recv_fingerprint.is_empty());
    }

    #[test]
    fn fingerprint_keeps_last_depth_receivers() {
        let ctx = ContextPolicy::Insensitive.empty_context();
        let r1 = AbstractObject::make("r1", AllocKind::Obj, ctx.clone(), &[], 0);
        let r2 = AbstractObject::make("r2", AllocKind::Obj, ctx.clone(), &[], 0);
        let r3 = AbstractObject::make("r3", AllocKind::Obj, ctx.clone(), &[], 0);
        let receivers = [r1, r2, r3];
        let o = AbstractObject::make("a1", AllocKind::Obj, ctx, &receivers, 2);
        assert_eq!(o.recv_fingerprint.len(), 2);
        assert_eq!(o.recv_fingerprint[0].alloc_id, "r2");
        assert_eq!(o.recv_fingerprint[1].alloc_id, "r3");
    }

    #[test]
    fn depth_zero_gives_empty_fingerprint_even_with_receivers() {
        let ctx = ContextPolicy::Insensitive.empty_context();
        let r1 = AbstractObject::make("r1", AllocKind::Obj, ctx.clone(), &[], 0);
        let o = AbstractObject::make("a1", AllocKind::Obj, ctx, &[r1], 0);
        assert!(o.recv_fingerprint.is_empty());
    }

    #[test]
    fn distinct_alloc_kind_is_part_of_identity() {
        // NOTE: alloc_kind participates in equality by construction (field of the struct),
        // matching the callability tagging decision in DESIGN.md.
        let ctx = ContextPolicy::Insensitive.empty_context();
        let func = AbstractObject::make("a1", AllocKind::Func, ctx.clone(), &[], 0);
        let obj = AbstractObject::make("a1", AllocKind::Obj, ctx, &[], 0);
        assert_ne!(func, obj);
        assert!(func.alloc_kind.is_callable());
        assert!(!obj.alloc_kind.is_callable());
    }
}
