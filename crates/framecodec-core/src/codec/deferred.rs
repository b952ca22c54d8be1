//! Deferred-action queue.
//!
//! Actions are plain data naming the module that registered them and the
//! field they act on. The resolver pops them back out by scope and hands
//! each one to the owning protocol's `run_deferred`. Ordering is ascending
//! priority, then registration order, and actions may be pushed while the
//! queue is being drained.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Scope {
    /// Runs once the registering module finishes its decode walk.
    AfterDecode,
    /// Runs once the registering module finishes its encode walk.
    AfterEncode,
    /// Runs after `AfterEncode`, still inside the registering module's turn.
    SelfEncode,
    /// Pooled across the chain; runs after every module has encoded.
    Packet,
}

impl Scope {
    /// Scopes that are drained per module rather than per pass.
    pub fn is_module_local(self) -> bool {
        !matches!(self, Scope::Packet)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeferredAction {
    pub scope: Scope,
    pub priority: i32,
    pub module: usize,
    pub target: String,
    seq: u64,
}

#[derive(Debug, Default)]
pub struct DeferredQueue {
    actions: Vec<DeferredAction>,
    next_seq: u64,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, scope: Scope, priority: i32, module: usize, target: impl Into<String>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.actions.push(DeferredAction {
            scope,
            priority,
            module,
            target: target.into(),
            seq,
        });
    }

    /// Remove and return the next action of `scope`.
    ///
    /// Module-local scopes only yield actions registered by `module`; the
    /// packet scope ignores it.
    pub fn pop_next(&mut self, scope: Scope, module: usize) -> Option<DeferredAction> {
        let idx = self
            .actions
            .iter()
            .enumerate()
            .filter(|(_, action)| {
                action.scope == scope && (!scope.is_module_local() || action.module == module)
            })
            .min_by_key(|(_, action)| (action.priority, action.seq))
            .map(|(idx, _)| idx)?;
        Some(self.actions.remove(idx))
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(queue: &mut DeferredQueue, scope: Scope, module: usize) -> Vec<String> {
        std::iter::from_fn(|| queue.pop_next(scope, module))
            .map(|action| action.target)
            .collect()
    }

    #[test]
    fn packet_actions_run_by_priority_across_modules() {
        let mut queue = DeferredQueue::new();
        queue.push(Scope::Packet, 100, 2, "checksum");
        queue.push(Scope::Packet, 10, 1, "length");
        queue.push(Scope::Packet, 30, 1, "checksum");
        assert_eq!(drain(&mut queue, Scope::Packet, 0), ["length", "checksum", "checksum"]);
    }

    #[test]
    fn ties_keep_registration_order() {
        let mut queue = DeferredQueue::new();
        for target in ["a", "b", "c"] {
            queue.push(Scope::AfterEncode, 0, 0, target);
        }
        assert_eq!(drain(&mut queue, Scope::AfterEncode, 0), ["a", "b", "c"]);
    }

    #[test]
    fn local_scopes_are_filtered_by_module() {
        let mut queue = DeferredQueue::new();
        queue.push(Scope::SelfEncode, 1, 0, "hdrLen");
        queue.push(Scope::SelfEncode, 1, 1, "hdrLen");
        queue.push(Scope::Packet, 1, 0, "length");
        assert_eq!(queue.pop_next(Scope::SelfEncode, 1).map(|a| a.module), Some(1));
        assert!(queue.pop_next(Scope::SelfEncode, 1).is_none());
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn actions_pushed_while_draining_are_seen() {
        let mut queue = DeferredQueue::new();
        queue.push(Scope::AfterDecode, 0, 0, "first");
        let mut seen = Vec::new();
        while let Some(action) = queue.pop_next(Scope::AfterDecode, 0) {
            if action.target == "first" {
                queue.push(Scope::AfterDecode, 0, 0, "second");
            }
            seen.push(action.target);
        }
        assert_eq!(seen, ["first", "second"]);
        assert!(queue.is_empty());
    }
}
