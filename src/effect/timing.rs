//! Multi-tick timing effects
//!
//! These variants carry the tagged wait state the engine's retry loop
//! drives: an attempt that cannot complete yet records where it is and
//! returns `UnableToApply`; a later attempt finishes the protocol. The
//! engine calls `reset` on success so a re-enqueued instance starts over.

use std::time::{Duration, Instant};

use crate::core::types::Vec2;
use crate::effect::{ApplyCtx, ApplyOutcome, SideEffect};

/// Wait state shared by the delay-style protocols
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaitState {
    Idle,
    Waiting { since: Instant },
}

/// Run an inner effect after a fixed delay
///
/// The delay starts counting at the first application attempt, not at
/// production time; a container that sits in the queue behind a blocked
/// tick does not silently burn its delay.
#[derive(Debug, Clone)]
pub struct Delayed {
    pub delay: Duration,
    pub inner: Box<SideEffect>,
    state: WaitState,
}

impl Delayed {
    pub fn new(delay: Duration, inner: SideEffect) -> Self {
        Self {
            delay,
            inner: Box::new(inner),
            state: WaitState::Idle,
        }
    }

    pub fn apply(&mut self, ctx: &mut ApplyCtx<'_>) -> ApplyOutcome {
        match self.state {
            WaitState::Idle => {
                self.state = WaitState::Waiting { since: ctx.now };
                // A zero delay falls through immediately
                if self.delay.is_zero() {
                    self.inner.apply(ctx)
                } else {
                    ApplyOutcome::UnableToApply
                }
            }
            WaitState::Waiting { since } => {
                if ctx.now.saturating_duration_since(since) < self.delay {
                    ApplyOutcome::UnableToApply
                } else {
                    self.inner.apply(ctx)
                }
            }
        }
    }

    pub fn reset(&mut self) {
        self.state = WaitState::Idle;
        self.inner.reset();
    }

    pub fn describe(&self) -> String {
        format!(
            "after {}ms, {}",
            self.delay.as_millis(),
            self.inner.describe()
        )
    }
}

/// Move the pointer to a target and keep it there for a dwell period
///
/// Completes with `AppliedUnique` once the dwell has elapsed. The move
/// request is re-queued every tick of the dwell so the pointer stays put
/// even if something else moved it between ticks.
#[derive(Debug, Clone)]
pub struct Hover {
    pub target: Vec2,
    pub dwell: Duration,
    state: WaitState,
}

impl Hover {
    pub fn new(target: Vec2, dwell: Duration) -> Self {
        Self {
            target,
            dwell,
            state: WaitState::Idle,
        }
    }

    pub fn apply(&mut self, ctx: &mut ApplyCtx<'_>) -> ApplyOutcome {
        match self.state {
            WaitState::Idle => {
                ctx.frame.pointer_move = Some(self.target);
                self.state = WaitState::Waiting { since: ctx.now };
                if self.dwell.is_zero() {
                    ApplyOutcome::AppliedUnique
                } else {
                    ApplyOutcome::UnableToApply
                }
            }
            WaitState::Waiting { since } => {
                if ctx.now.saturating_duration_since(since) < self.dwell {
                    ctx.frame.pointer_move = Some(self.target);
                    ApplyOutcome::UnableToApply
                } else {
                    ApplyOutcome::AppliedUnique
                }
            }
        }
    }

    pub fn reset(&mut self) {
        self.state = WaitState::Idle;
    }

    pub fn describe(&self) -> String {
        format!(
            "hovered ({:.0}, {:.0}) for {}ms",
            self.target.x,
            self.target.y,
            self.dwell.as_millis()
        )
    }
}

/// Which stage of a two-effect sequence is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SequenceStage {
    First,
    Second,
}

/// Run two effects in order; the second starts only after the first
/// reports terminal success
///
/// The canonical use is hover-then-cast: the cast fires the same tick the
/// hover settles. A failure in either stage is the sequence's failure.
#[derive(Debug, Clone)]
pub struct Sequence {
    pub first: Box<SideEffect>,
    pub second: Box<SideEffect>,
    stage: SequenceStage,
}

impl Sequence {
    pub fn new(first: SideEffect, second: SideEffect) -> Self {
        Self {
            first: Box::new(first),
            second: Box::new(second),
            stage: SequenceStage::First,
        }
    }

    pub fn apply(&mut self, ctx: &mut ApplyCtx<'_>) -> ApplyOutcome {
        if self.stage == SequenceStage::First {
            match self.first.apply(ctx) {
                ApplyOutcome::AppliedUnique | ApplyOutcome::AppliedDuplicate => {
                    self.stage = SequenceStage::Second;
                    // Delegate immediately so a zero-delay second stage
                    // completes in the same tick the first one settled
                }
                other => return other,
            }
        }
        self.second.apply(ctx)
    }

    pub fn reset(&mut self) {
        self.stage = SequenceStage::First;
        self.first.reset();
        self.second.reset();
    }

    pub fn describe(&self) -> String {
        format!("{}, then {}", self.first.describe(), self.second.describe())
    }
}
