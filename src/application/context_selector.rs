//! The context selector: one strategy over `empty()`/`on_call`/
//! `on_alloc`, dispatched by policy.

use crate::domain::{CallSite, Context, ContextPolicy};

/// Selects the empty context and the two context transitions, dispatched
/// entirely by the wrapped policy — one selector instance covers every
/// policy rather than one type per policy, since the rules differ only
/// in which sequence they append to.
#[derive(Debug, Clone, Copy)]
pub struct ContextSelector {
    policy: ContextPolicy,
}

impl ContextSelector {
    pub fn new(policy: ContextPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ContextPolicy {
        self.policy
    }

    pub fn empty(&self) -> Context {
        self.policy.empty_context()
    }

    /// `on_call(caller, site, callee_name, receiver_alloc?, receiver_type?)`.
    pub fn on_call(
        &self,
        caller: &Context,
        site: &CallSite,
        callee_name: &str,
        receiver_alloc: Option<&str>,
        receiver_type: Option<&str>,
    ) -> Context {
        let caller = caller.coerce_to(self.policy);
        match self.policy {
            ContextPolicy::Insensitive => caller,
            ContextPolicy::CallString(_) => caller.with_call_site(site),
            ContextPolicy::Object(_) => {
                let proxy = receiver_alloc.map(str::to_string).unwrap_or_else(|| format!("call:{}", site.site_id));
                caller.with_alloc(&proxy)
            }
            ContextPolicy::Type(_) => {
                let proxy = receiver_type.unwrap_or(callee_name);
                caller.with_type(proxy)
            }
            ContextPolicy::Receiver(_) => match receiver_alloc {
                Some(alloc) => caller.with_receiver(alloc),
                None => caller,
            },
            ContextPolicy::Hybrid { .. } => {
                let with_site = caller.with_call_site(site);
                match receiver_alloc {
                    Some(alloc) => with_site.with_alloc(alloc),
                    None => with_site,
                }
            }
        }
    }

    /// `on_alloc(current, alloc_site, alloc_type?)`.
    pub fn on_alloc(&self, current: &Context, alloc_site: &str, _alloc_type: Option<&str>) -> Context {
        let current = current.coerce_to(self.policy);
        match self.policy {
            ContextPolicy::Insensitive | ContextPolicy::CallString(_) | ContextPolicy::Type(_) | ContextPolicy::Receiver(_) => current,
            ContextPolicy::Object(_) => current.with_alloc(alloc_site),
            ContextPolicy::Hybrid { .. } => current.with_alloc(alloc_site),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(id: &str) -> CallSite {
        CallSite::new(id.into(), "caller_fn", 0)
    }

    #[test]
    fn zero_cfa_on_call_returns_caller_unchanged() {
        let sel = ContextSelector::new(ContextPolicy::Insensitive);
        let caller = sel.empty();
        let callee_ctx = sel.on_call(&caller, &site("s1"), "f", None, None);
        assert_eq!(callee_ctx, caller);
    }

    #[test]
    fn k_cfa_on_call_appends_site() {
        let sel = ContextSelector::new(ContextPolicy::CallString(1));
        let caller = sel.empty();
        let callee_ctx = sel.on_call(&caller, &site("s1"), "f", None, None);
        assert_eq!(callee_ctx.depth(), 1);
    }

    #[test]
    fn k_obj_on_call_uses_call_site_proxy_when_no_receiver() {
        let sel = ContextSelector::new(ContextPolicy::Object(1));
        let caller = sel.empty();
        let callee_ctx = sel.on_call(&caller, &site("s1"), "f", None, None);
        match callee_ctx {
            Context::Object { allocs, .. } => assert_eq!(allocs[0], format!("call:{}", site("s1").site_id)),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn k_obj_on_call_prefers_receiver_alloc() {
        let sel = ContextSelector::new(ContextPolicy::Object(1));
        let caller = sel.empty();
        let callee_ctx = sel.on_call(&caller, &site("s1"), "f", Some("a1"), None);
        match callee_ctx {
            Context::Object { allocs, .. } => assert_eq!(allocs[0], "a1"),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn k_rcv_on_call_falls_back_to_caller_without_receiver() {
        let sel = ContextSelector::new(ContextPolicy::Receiver(1));
        let caller = sel.empty();
        let callee_ctx = sel.on_call(&caller, &site("s1"), "f", None, None);
        assert_eq!(callee_ctx, caller);
    }

    #[test]
    fn hybrid_on_call_appends_both_dimensions() {
        let sel = ContextSelector::new(ContextPolicy::Hybrid { call_k: 1, obj_depth: 1 });
        let caller = sel.empty();
        let callee_ctx = sel.on_call(&caller, &site("s1"), "f", Some("a1"), None);
        match callee_ctx {
            Context::Hybrid { sites, allocs, .. } => {
                assert_eq!(sites.len(), 1);
                assert_eq!(allocs, vec!["a1".to_string()]);
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn k_obj_on_alloc_appends_site() {
        let sel = ContextSelector::new(ContextPolicy::Object(1));
        let current = sel.empty();
        let ctx = sel.on_alloc(&current, "alloc1", None);
        match ctx {
            Context::Object { allocs, .. } => assert_eq!(allocs, vec!["alloc1".to_string()]),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn call_string_on_alloc_is_identity() {
        let sel = ContextSelector::new(ContextPolicy::CallString(2));
        let current = sel.empty().with_call_site(&site("s1"));
        let ctx = sel.on_alloc(&current, "alloc1", None);
        assert_eq!(ctx, current);
    }
}
