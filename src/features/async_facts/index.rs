//! Query indices over a collected fact set: awaiter function, awaited
//! target, creator function, and callback scheduler, each mapping to the
//! facts that mention it.

use rustc_hash::FxHashMap;

use super::types::AsyncFact;

#[derive(Debug, Default)]
pub struct AsyncFactIndex {
    facts: Vec<AsyncFact>,
    by_awaiter: FxHashMap<String, Vec<usize>>,
    by_awaited_target: FxHashMap<String, Vec<usize>>,
    by_creator_fn: FxHashMap<String, Vec<usize>>,
    by_callback_scheduler: FxHashMap<String, Vec<usize>>,
}

impl AsyncFactIndex {
    pub fn build(facts: Vec<AsyncFact>) -> Self {
        let mut index = Self { facts, ..Self::default() };
        for (i, fact) in index.facts.iter().enumerate() {
            match fact {
                AsyncFact::AwaitEdge { awaiter_fn, awaited_targets, .. } => {
                    index.by_awaiter.entry(awaiter_fn.clone()).or_default().push(i);
                    for target in awaited_targets {
                        index.by_awaited_target.entry(target.clone()).or_default().push(i);
                    }
                }
                AsyncFact::TaskCreate { creator_fn, .. } => {
                    index.by_creator_fn.entry(creator_fn.clone()).or_default().push(i);
                }
                AsyncFact::CallbackEdge { caller_fn, .. } => {
                    index.by_callback_scheduler.entry(caller_fn.clone()).or_default().push(i);
                }
                _ => {}
            }
        }
        index
    }

    pub fn facts(&self) -> &[AsyncFact] {
        &self.facts
    }

    pub fn awaits_by(&self, awaiter_fn: &str) -> Vec<&AsyncFact> {
        self.by_awaiter.get(awaiter_fn).map(|idxs| idxs.iter().map(|&i| &self.facts[i]).collect()).unwrap_or_default()
    }

    pub fn awaits_of_target(&self, target: &str) -> Vec<&AsyncFact> {
        self.by_awaited_target.get(target).map(|idxs| idxs.iter().map(|&i| &self.facts[i]).collect()).unwrap_or_default()
    }

    pub fn tasks_created_by(&self, creator_fn: &str) -> Vec<&AsyncFact> {
        self.by_creator_fn.get(creator_fn).map(|idxs| idxs.iter().map(|&i| &self.facts[i]).collect()).unwrap_or_default()
    }

    pub fn callbacks_scheduled_by(&self, caller_fn: &str) -> Vec<&AsyncFact> {
        self.by_callback_scheduler.get(caller_fn).map(|idxs| idxs.iter().map(|&i| &self.facts[i]).collect()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SiteId;

    #[test]
    fn awaiter_index_finds_await_edges() {
        let facts = vec![AsyncFact::AwaitEdge {
            await_id: SiteId::raw("f:1:1:await"),
            awaiter_fn: "main".into(),
            awaited_targets: vec!["worker".into()],
            may_unknown: false,
        }];
        let index = AsyncFactIndex::build(facts);
        assert_eq!(index.awaits_by("main").len(), 1);
        assert_eq!(index.awaits_of_target("worker").len(), 1);
        assert!(index.awaits_by("nobody").is_empty());
    }

    #[test]
    fn creator_index_finds_task_creates() {
        let facts = vec![AsyncFact::TaskCreate {
            task_id: SiteId::raw("f:1:1:task"),
            creator_fn: "main".into(),
            targets: vec!["worker".into()],
            args_vars: vec![],
            may_unknown: false,
        }];
        let index = AsyncFactIndex::build(facts);
        assert_eq!(index.tasks_created_by("main").len(), 1);
    }
}
