//! Execution gate
//!
//! Pure predicate over the snapshot that decides whether the pipeline runs
//! this tick. Checks run in a fixed order and short-circuit on the first
//! failure so the reported reason is always the most fundamental one.

use crate::core::config::EngineConfig;
use crate::snapshot::Snapshot;

/// Name of the post-death protection buff during which automation must
/// stay idle: any input would forfeit the protection.
pub const GRACE_PERIOD_BUFF: &str = "grace_period";

/// Why the gate blocked this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    WindowUnfocused,
    EscapeActive,
    NoVitals,
    PlayerDead,
    GracePeriod,
    NoActor,
}

impl BlockReason {
    pub fn describe(&self) -> &'static str {
        match self {
            BlockReason::WindowUnfocused => "host window does not have input focus",
            BlockReason::EscapeActive => "escape state is active",
            BlockReason::NoVitals => "player vitals are unavailable",
            BlockReason::PlayerDead => "player is dead",
            BlockReason::GracePeriod => "grace period buff is active",
            BlockReason::NoActor => "player has no actor component",
        }
    }
}

/// Gate verdict for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateVerdict {
    Ready,
    Blocked(BlockReason),
}

impl GateVerdict {
    pub fn should_run(&self) -> bool {
        matches!(self, GateVerdict::Ready)
    }

    pub fn reason(&self) -> &'static str {
        match self {
            GateVerdict::Ready => "Ready",
            GateVerdict::Blocked(reason) => reason.describe(),
        }
    }
}

/// Evaluate the gate for this tick's snapshot
pub fn evaluate(snapshot: &Snapshot, config: &EngineConfig) -> GateVerdict {
    if !snapshot.window_focused {
        return GateVerdict::Blocked(BlockReason::WindowUnfocused);
    }

    if snapshot.panels.escape_open && !config.run_in_escape_state {
        return GateVerdict::Blocked(BlockReason::EscapeActive);
    }

    let vitals = match snapshot.vitals {
        Some(vitals) => vitals,
        None => return GateVerdict::Blocked(BlockReason::NoVitals),
    };
    if vitals.health <= 0.0 {
        return GateVerdict::Blocked(BlockReason::PlayerDead);
    }

    if snapshot.has_buff(GRACE_PERIOD_BUFF) {
        return GateVerdict::Blocked(BlockReason::GracePeriod);
    }

    if !snapshot.has_actor {
        return GateVerdict::Blocked(BlockReason::NoActor);
    }

    GateVerdict::Ready
}
