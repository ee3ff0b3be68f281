//! Pending-effect queue and the application pass
//!
//! The queue owns every not-yet-resolved side effect. One pass applies
//! each container exactly once, partitions by outcome, and retains only
//! the containers that reported they cannot complete yet. New containers
//! enter the queue only through rule evaluation, never mid-pass.

use std::time::Instant;

use tracing::{debug, warn};

use crate::core::types::ContainerId;
use crate::effect::{ApplyCtx, ApplyOutcome, SideEffect};
use crate::engine::history::History;

/// One pending side effect plus lifecycle bookkeeping
#[derive(Debug)]
pub struct SideEffectContainer {
    pub id: ContainerId,
    pub effect: SideEffect,
    pub pending_since: Instant,
    pub executed_at: Option<Instant>,
}

impl SideEffectContainer {
    pub fn new(effect: SideEffect, now: Instant) -> Self {
        Self {
            id: ContainerId::new(),
            effect,
            pending_since: now,
            executed_at: None,
        }
    }

    /// Mark the container executed and rewind the effect's internal state
    /// machine, so stateful/composite effects are clean if reused
    pub fn set_executed(&mut self, now: Instant) {
        self.executed_at = Some(now);
        self.effect.reset();
    }
}

/// Counters for one application pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    pub attempted: usize,
    pub applied_unique: usize,
    pub applied_duplicate: usize,
    pub retained: usize,
    pub conditional_failures: usize,
    pub failures: usize,
}

/// The set of pending side-effect containers
#[derive(Debug, Default)]
pub struct PendingQueue {
    items: Vec<SideEffectContainer>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, container: SideEffectContainer) {
        self.items.push(container);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SideEffectContainer> {
        self.items.iter()
    }

    /// Apply every pending container once and keep only the retryable rest
    ///
    /// Successful unique applications are recorded into `history`;
    /// duplicates complete silently. Failure outcomes drop the container
    /// without retry.
    pub fn run_pass(&mut self, ctx: &mut ApplyCtx<'_>, history: &mut History) -> PassStats {
        let pending = std::mem::take(&mut self.items);
        let mut stats = PassStats {
            attempted: pending.len(),
            ..PassStats::default()
        };

        for mut container in pending {
            let outcome = container.effect.apply(ctx);
            match outcome {
                ApplyOutcome::AppliedUnique => {
                    let description = container.effect.describe();
                    container.set_executed(ctx.now);
                    debug!(id = ?container.id, %description, "effect applied");
                    history.record(ctx.now, description);
                    stats.applied_unique += 1;
                }
                ApplyOutcome::AppliedDuplicate => {
                    container.set_executed(ctx.now);
                    stats.applied_duplicate += 1;
                }
                ApplyOutcome::UnableToApply => {
                    self.items.push(container);
                    stats.retained += 1;
                }
                ApplyOutcome::ConditionalFailure => {
                    debug!(
                        id = ?container.id,
                        effect = %container.effect.describe(),
                        "effect rejected by coordination precondition"
                    );
                    stats.conditional_failures += 1;
                }
                ApplyOutcome::Failure => {
                    warn!(
                        id = ?container.id,
                        effect = %container.effect.describe(),
                        "effect failed and will not be retried"
                    );
                    stats.failures += 1;
                }
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::tests::test_ctx;
    use crate::effect::timing::Delayed;
    use crate::effect::vars::SetFlag;
    use std::time::Duration;

    fn history() -> History {
        History::new(Duration::from_secs(60), 64)
    }

    #[test]
    fn test_pass_removes_completed_and_keeps_waiting() {
        let mut fixture = test_ctx();
        let mut queue = PendingQueue::new();
        let mut history = history();

        queue.enqueue(SideEffectContainer::new(
            SideEffect::SetFlag(SetFlag::new("instant")),
            fixture.now,
        ));
        queue.enqueue(SideEffectContainer::new(
            SideEffect::Delayed(Delayed::new(
                Duration::from_millis(500),
                SideEffect::SetFlag(SetFlag::new("later")),
            )),
            fixture.now,
        ));

        let stats = queue.run_pass(&mut fixture.ctx(), &mut history);
        assert_eq!(stats.attempted, 2);
        assert_eq!(stats.applied_unique, 1);
        assert_eq!(stats.retained, 1);
        assert_eq!(queue.len(), 1, "only the delayed effect remains pending");
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_duplicates_complete_without_history() {
        let mut fixture = test_ctx();
        let mut queue = PendingQueue::new();
        let mut history = history();

        fixture.vars.set_flag("already");
        queue.enqueue(SideEffectContainer::new(
            SideEffect::SetFlag(SetFlag::new("already")),
            fixture.now,
        ));

        let stats = queue.run_pass(&mut fixture.ctx(), &mut history);
        assert_eq!(stats.applied_duplicate, 1);
        assert!(queue.is_empty());
        assert_eq!(history.len(), 0, "duplicates never reach history");
    }

    #[test]
    fn test_failed_containers_are_not_retried() {
        let mut fixture = test_ctx();
        let mut queue = PendingQueue::new();
        let mut history = history();

        // No disconnect capability registered -> Failure
        queue.enqueue(SideEffectContainer::new(
            SideEffect::Disconnect(crate::effect::bridge::Disconnect::new()),
            fixture.now,
        ));

        let stats = queue.run_pass(&mut fixture.ctx(), &mut history);
        assert_eq!(stats.failures, 1);
        assert!(queue.is_empty());

        let stats = queue.run_pass(&mut fixture.ctx(), &mut history);
        assert_eq!(stats.attempted, 0);
    }

    #[test]
    fn test_retained_container_resolves_on_later_pass() {
        let mut fixture = test_ctx();
        let mut queue = PendingQueue::new();
        let mut history = history();

        queue.enqueue(SideEffectContainer::new(
            SideEffect::Delayed(Delayed::new(
                Duration::from_millis(100),
                SideEffect::SetFlag(SetFlag::new("later")),
            )),
            fixture.now,
        ));

        queue.run_pass(&mut fixture.ctx(), &mut history);
        assert_eq!(queue.len(), 1);

        fixture.next_tick(Duration::from_millis(150));
        let stats = queue.run_pass(&mut fixture.ctx(), &mut history);
        assert_eq!(stats.applied_unique, 1);
        assert!(queue.is_empty());
        assert!(fixture.vars.flag("later"));
    }
}
