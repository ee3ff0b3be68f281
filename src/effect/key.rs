//! Key press and hold effects

use tracing::warn;

use crate::bridge::{methods, BridgeValue};
use crate::core::types::KeyRequest;
use crate::effect::{ApplyCtx, ApplyOutcome};

/// Check the externally owned input-arbitration capability, if present.
///
/// Absence or a failing capability falls back to "input is free": another
/// subsystem's crash must never freeze this engine's presses.
fn input_arbitration_rejects(ctx: &ApplyCtx<'_>) -> bool {
    let Some(capability) = ctx.bridge.lookup(methods::INPUT_BLOCKED) else {
        return false;
    };
    match capability(&[]) {
        Ok(BridgeValue::Bool(blocked)) => blocked,
        Ok(other) => {
            warn!(?other, "input arbitration returned a non-bool, ignoring");
            false
        }
        Err(error) => {
            warn!(%error, "input arbitration capability failed, ignoring");
            false
        }
    }
}

fn describe_key(key: KeyRequest) -> String {
    match key {
        KeyRequest::Key(code) => format!("key {}", code.0),
        KeyRequest::PrimaryPointer => "primary pointer button".to_string(),
    }
}

/// Press and release one key this tick
///
/// Claims the frame's single press slot; a second press request in the
/// same tick waits for the next one. The shared cooldown is honored both
/// here (via the frame's derived fact) and again at realization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PressKey {
    pub key: KeyRequest,
}

impl PressKey {
    pub fn new(key: KeyRequest) -> Self {
        Self { key }
    }

    pub fn apply(&mut self, ctx: &mut ApplyCtx<'_>) -> ApplyOutcome {
        if input_arbitration_rejects(ctx) {
            return ApplyOutcome::ConditionalFailure;
        }
        if !ctx.frame.can_press_key {
            return ApplyOutcome::UnableToApply;
        }
        if ctx.frame.key_to_press.is_some() {
            return ApplyOutcome::UnableToApply;
        }
        ctx.frame.key_to_press = Some(self.key);
        ApplyOutcome::AppliedUnique
    }

    pub fn describe(&self) -> String {
        format!("pressed {}", describe_key(self.key))
    }
}

/// Begin holding a key down until a matching release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartHold {
    pub key: KeyRequest,
}

impl StartHold {
    pub fn new(key: KeyRequest) -> Self {
        Self { key }
    }

    pub fn apply(&mut self, ctx: &mut ApplyCtx<'_>) -> ApplyOutcome {
        if input_arbitration_rejects(ctx) {
            return ApplyOutcome::ConditionalFailure;
        }
        if !ctx.held.insert(self.key) {
            // Already held; repeating the hold must not re-issue key_down
            return ApplyOutcome::AppliedDuplicate;
        }
        ctx.frame.holds.push(self.key);
        ApplyOutcome::AppliedUnique
    }

    pub fn describe(&self) -> String {
        format!("started holding {}", describe_key(self.key))
    }
}

/// Release a held key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseHold {
    pub key: KeyRequest,
}

impl ReleaseHold {
    pub fn new(key: KeyRequest) -> Self {
        Self { key }
    }

    pub fn apply(&mut self, ctx: &mut ApplyCtx<'_>) -> ApplyOutcome {
        if !ctx.held.remove(&self.key) {
            return ApplyOutcome::AppliedDuplicate;
        }
        ctx.frame.releases.push(self.key);
        ApplyOutcome::AppliedUnique
    }

    pub fn describe(&self) -> String {
        format!("released {}", describe_key(self.key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::tests::test_ctx;

    #[test]
    fn test_press_claims_single_slot_per_tick() {
        let mut fixture = test_ctx();
        let mut ctx = fixture.ctx();

        let key_a = KeyRequest::Key(crate::core::types::KeyCode::from_char('A'));
        let key_b = KeyRequest::Key(crate::core::types::KeyCode::from_char('B'));

        assert_eq!(
            PressKey::new(key_a).apply(&mut ctx),
            ApplyOutcome::AppliedUnique
        );
        assert_eq!(
            PressKey::new(key_b).apply(&mut ctx),
            ApplyOutcome::UnableToApply,
            "second press this tick must wait"
        );
        assert_eq!(ctx.frame.key_to_press, Some(key_a));
    }

    #[test]
    fn test_press_blocked_by_cooldown() {
        let mut fixture = test_ctx();
        fixture.frame.can_press_key = false;
        let mut ctx = fixture.ctx();

        let key = KeyRequest::Key(crate::core::types::KeyCode::from_char('A'));
        assert_eq!(
            PressKey::new(key).apply(&mut ctx),
            ApplyOutcome::UnableToApply
        );
        assert!(ctx.frame.key_to_press.is_none());
    }

    #[test]
    fn test_press_rejected_by_input_arbitration() {
        let mut fixture = test_ctx();
        fixture
            .bridge
            .register(methods::INPUT_BLOCKED, |_| Ok(BridgeValue::Bool(true)));
        let mut ctx = fixture.ctx();

        let key = KeyRequest::Key(crate::core::types::KeyCode::from_char('A'));
        assert_eq!(
            PressKey::new(key).apply(&mut ctx),
            ApplyOutcome::ConditionalFailure
        );
    }

    #[test]
    fn test_failing_arbitration_falls_back_to_free_input() {
        let mut fixture = test_ctx();
        fixture.bridge.register(methods::INPUT_BLOCKED, |_| {
            Err(crate::core::error::ReflexError::EffectFailed("down".into()))
        });
        let mut ctx = fixture.ctx();

        let key = KeyRequest::Key(crate::core::types::KeyCode::from_char('A'));
        assert_eq!(
            PressKey::new(key).apply(&mut ctx),
            ApplyOutcome::AppliedUnique
        );
    }

    #[test]
    fn test_duplicate_hold_and_release() {
        let mut fixture = test_ctx();
        let mut ctx = fixture.ctx();
        let key = KeyRequest::PrimaryPointer;

        assert_eq!(
            StartHold::new(key).apply(&mut ctx),
            ApplyOutcome::AppliedUnique
        );
        assert_eq!(
            StartHold::new(key).apply(&mut ctx),
            ApplyOutcome::AppliedDuplicate,
            "hold of a held key is a repeat"
        );
        assert_eq!(ctx.frame.holds, vec![key], "key_down queued exactly once");

        assert_eq!(
            ReleaseHold::new(key).apply(&mut ctx),
            ApplyOutcome::AppliedUnique
        );
        assert_eq!(
            ReleaseHold::new(key).apply(&mut ctx),
            ApplyOutcome::AppliedDuplicate,
            "release of an unheld key is a repeat"
        );
        assert_eq!(ctx.frame.releases, vec![key]);
    }
}
