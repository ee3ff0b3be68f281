//! Side effects and their application state machines
//!
//! A side effect is one intended action produced by a rule. The same
//! effect instance is re-applied once per application pass until it
//! reaches a terminal outcome, so variants that wait (delays, hovers)
//! carry their own tagged state and reset it on completion.

pub mod bridge;
pub mod display;
pub mod key;
pub mod timing;
pub mod vars;

use std::time::Instant;

use ahash::AHashSet;

use crate::bridge::BridgeRegistry;
use crate::core::config::EngineConfig;
use crate::core::types::KeyRequest;
use crate::frame::FrameState;
use crate::vars::VariableStore;

/// Outcome of one application attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Completed this attempt and was semantically new
    AppliedUnique,
    /// Completed but repeated an already-applied action
    AppliedDuplicate,
    /// Cannot complete yet; retain and retry next tick
    UnableToApply,
    /// A coordination precondition rejected the attempt; not retried
    ConditionalFailure,
    /// Unrecoverable; not retried
    Failure,
}

impl ApplyOutcome {
    /// Anything but `UnableToApply` ends the container's lifecycle
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ApplyOutcome::UnableToApply)
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self,
            ApplyOutcome::AppliedUnique | ApplyOutcome::AppliedDuplicate
        )
    }
}

/// Everything an effect may touch while applying
///
/// The frame is the only channel to the outside world; the variable store
/// is the only long-lived state an effect may mutate.
pub struct ApplyCtx<'a> {
    pub now: Instant,
    pub frame: &'a mut FrameState,
    pub vars: &'a mut VariableStore,
    pub bridge: &'a BridgeRegistry,
    /// Keys the engine currently holds down, for duplicate detection
    pub held: &'a mut AHashSet<KeyRequest>,
    pub config: &'a EngineConfig,
}

/// The closed set of effect variants
#[derive(Debug, Clone)]
pub enum SideEffect {
    PressKey(key::PressKey),
    StartHold(key::StartHold),
    ReleaseHold(key::ReleaseHold),
    DisplayText(display::DisplayText),
    DisplayGraphic(display::DisplayGraphic),
    DisplayProgressBar(display::DisplayProgressBar),
    SetFlag(vars::SetFlag),
    ResetFlag(vars::ResetFlag),
    SetNumber(vars::SetNumber),
    ResetNumber(vars::ResetNumber),
    StartTimer(vars::StartTimer),
    StopTimer(vars::StopTimer),
    ResetTimer(vars::ResetTimer),
    Delayed(timing::Delayed),
    Hover(timing::Hover),
    Sequence(timing::Sequence),
    Disconnect(bridge::Disconnect),
    BridgeCall(bridge::BridgeCall),
}

impl SideEffect {
    /// Attempt to apply this effect once
    pub fn apply(&mut self, ctx: &mut ApplyCtx<'_>) -> ApplyOutcome {
        match self {
            SideEffect::PressKey(e) => e.apply(ctx),
            SideEffect::StartHold(e) => e.apply(ctx),
            SideEffect::ReleaseHold(e) => e.apply(ctx),
            SideEffect::DisplayText(e) => e.apply(ctx),
            SideEffect::DisplayGraphic(e) => e.apply(ctx),
            SideEffect::DisplayProgressBar(e) => e.apply(ctx),
            SideEffect::SetFlag(e) => e.apply(ctx),
            SideEffect::ResetFlag(e) => e.apply(ctx),
            SideEffect::SetNumber(e) => e.apply(ctx),
            SideEffect::ResetNumber(e) => e.apply(ctx),
            SideEffect::StartTimer(e) => e.apply(ctx),
            SideEffect::StopTimer(e) => e.apply(ctx),
            SideEffect::ResetTimer(e) => e.apply(ctx),
            SideEffect::Delayed(e) => e.apply(ctx),
            SideEffect::Hover(e) => e.apply(ctx),
            SideEffect::Sequence(e) => e.apply(ctx),
            SideEffect::Disconnect(e) => e.apply(ctx),
            SideEffect::BridgeCall(e) => e.apply(ctx),
        }
    }

    /// Return internal state to idle so a re-enqueued instance starts the
    /// full protocol from scratch. Stateless variants are no-ops.
    pub fn reset(&mut self) {
        match self {
            SideEffect::Delayed(e) => e.reset(),
            SideEffect::Hover(e) => e.reset(),
            SideEffect::Sequence(e) => e.reset(),
            _ => {}
        }
    }

    /// Human-readable description for history and logging
    pub fn describe(&self) -> String {
        match self {
            SideEffect::PressKey(e) => e.describe(),
            SideEffect::StartHold(e) => e.describe(),
            SideEffect::ReleaseHold(e) => e.describe(),
            SideEffect::DisplayText(e) => e.describe(),
            SideEffect::DisplayGraphic(e) => e.describe(),
            SideEffect::DisplayProgressBar(e) => e.describe(),
            SideEffect::SetFlag(e) => e.describe(),
            SideEffect::ResetFlag(e) => e.describe(),
            SideEffect::SetNumber(e) => e.describe(),
            SideEffect::ResetNumber(e) => e.describe(),
            SideEffect::StartTimer(e) => e.describe(),
            SideEffect::StopTimer(e) => e.describe(),
            SideEffect::ResetTimer(e) => e.describe(),
            SideEffect::Delayed(e) => e.describe(),
            SideEffect::Hover(e) => e.describe(),
            SideEffect::Sequence(e) => e.describe(),
            SideEffect::Disconnect(e) => e.describe(),
            SideEffect::BridgeCall(e) => e.describe(),
        }
    }
}
