//! Coordination-bridge effects

use tracing::warn;

use crate::bridge::{methods, BridgeValue};
use crate::effect::{ApplyCtx, ApplyOutcome};
use crate::frame::BridgeInvocation;

/// Queue a named bridge invocation for dispatch at the end of the tick
///
/// Completion means "queued": lookup failures and invocation errors are
/// dispatch-time concerns, logged there and ignored for the tick.
#[derive(Debug, Clone)]
pub struct BridgeCall {
    pub method: String,
    pub args: Vec<BridgeValue>,
}

impl BridgeCall {
    pub fn new(method: impl Into<String>, args: Vec<BridgeValue>) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }

    pub fn apply(&mut self, ctx: &mut ApplyCtx<'_>) -> ApplyOutcome {
        ctx.frame.bridge_calls.push(BridgeInvocation {
            method: self.method.clone(),
            args: self.args.clone(),
        });
        ApplyOutcome::AppliedUnique
    }

    pub fn describe(&self) -> String {
        format!("invoked bridge method '{}'", self.method)
    }
}

/// Sever the host connection through the registered capability
///
/// There is no built-in fallback for severing a connection, so a missing
/// capability is a logged failure rather than a silent success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Disconnect;

impl Disconnect {
    pub fn new() -> Self {
        Self
    }

    pub fn apply(&mut self, ctx: &mut ApplyCtx<'_>) -> ApplyOutcome {
        match ctx.bridge.lookup(methods::DISCONNECT) {
            Some(capability) => match capability(&[]) {
                Ok(_) => ApplyOutcome::AppliedUnique,
                Err(error) => {
                    warn!(%error, "disconnect capability failed");
                    ApplyOutcome::Failure
                }
            },
            None => {
                warn!("disconnect requested but no capability is registered");
                ApplyOutcome::Failure
            }
        }
    }

    pub fn describe(&self) -> String {
        "disconnected from host".to_string()
    }
}
