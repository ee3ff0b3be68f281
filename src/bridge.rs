//! Coordination bridge
//!
//! Named-capability registry through which external subsystems and this
//! engine discover each other. The engine consumes capabilities with
//! point-of-use `lookup` (absence is always tolerated) and exposes its own
//! status queries as closures over an atomic status cell, registered once
//! at startup.

use ahash::AHashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::core::config::RECENT_ACTIVITY_WINDOW_MS;
use crate::core::error::{ReflexError, Result};

/// Well-known capability names
pub mod methods {
    /// Consumed: external input arbitration; `Bool(true)` means another
    /// subsystem currently owns input and presses must back off
    pub const INPUT_BLOCKED: &str = "input.blocked";
    /// Consumed: sever the host's connection (panic logout)
    pub const DISCONNECT: &str = "net.disconnect";

    /// Exposed: engine busy/idle boolean
    pub const IS_ACTIVE: &str = "reflex.is_active";
    /// Exposed: structured coordination snapshot
    pub const STATUS: &str = "reflex.status";
    /// Exposed: raw timing facts
    pub const TIMING: &str = "reflex.timing";
}

/// Value passed across the bridge boundary
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeValue {
    Unit,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Json(serde_json::Value),
}

/// A named remote-callable function
pub type Capability = Box<dyn Fn(&[BridgeValue]) -> Result<BridgeValue>>;

/// Registry of named capabilities
#[derive(Default)]
pub struct BridgeRegistry {
    capabilities: AHashMap<String, Capability>,
}

impl BridgeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability, replacing any previous holder of the name
    pub fn register<F>(&mut self, name: &str, capability: F)
    where
        F: Fn(&[BridgeValue]) -> Result<BridgeValue> + 'static,
    {
        self.capabilities.insert(name.to_owned(), Box::new(capability));
    }

    /// Point-of-use lookup; callers must tolerate `None`
    pub fn lookup(&self, name: &str) -> Option<&Capability> {
        self.capabilities.get(name)
    }

    /// Invoke a capability by name
    pub fn invoke(&self, name: &str, args: &[BridgeValue]) -> Result<BridgeValue> {
        let capability = self
            .capabilities
            .get(name)
            .ok_or_else(|| ReflexError::BridgeMethodMissing(name.to_owned()))?;
        capability(args)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.capabilities.contains_key(name)
    }
}

/// Sentinel for "no key press has happened yet"
const NEVER_PRESSED: u64 = u64::MAX;

/// Shared coordination state, written by the engine once per tick and read
/// by the exposed query closures. Atomics because queries may be invoked
/// from outside the tick path; the engine remains the only writer.
#[derive(Debug)]
pub struct StatusCell {
    enabled: AtomicBool,
    pending: AtomicUsize,
    evaluating: AtomicBool,
    press_allowed: AtomicBool,
    ms_since_press: AtomicU64,
}

impl StatusCell {
    pub fn new() -> Self {
        Self {
            enabled: AtomicBool::new(true),
            pending: AtomicUsize::new(0),
            evaluating: AtomicBool::new(false),
            press_allowed: AtomicBool::new(true),
            ms_since_press: AtomicU64::new(NEVER_PRESSED),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn set_pending(&self, pending: usize) {
        self.pending.store(pending, Ordering::Relaxed);
    }

    pub fn set_evaluating(&self, evaluating: bool) {
        self.evaluating.store(evaluating, Ordering::Relaxed);
    }

    pub fn set_press_allowed(&self, allowed: bool) {
        self.press_allowed.store(allowed, Ordering::Relaxed);
    }

    pub fn set_ms_since_press(&self, ms: Option<u64>) {
        self.ms_since_press
            .store(ms.unwrap_or(NEVER_PRESSED), Ordering::Relaxed);
    }

    pub fn ms_since_press(&self) -> Option<u64> {
        match self.ms_since_press.load(Ordering::Relaxed) {
            NEVER_PRESSED => None,
            ms => Some(ms),
        }
    }

    pub fn snapshot(&self) -> CoordinationStatus {
        CoordinationStatus {
            enabled: self.enabled.load(Ordering::Relaxed),
            pending_effects: self.pending.load(Ordering::Relaxed),
            ms_since_last_press: self.ms_since_press(),
            can_press_key: self.press_allowed.load(Ordering::Relaxed),
            evaluating: self.evaluating.load(Ordering::Relaxed),
        }
    }
}

impl Default for StatusCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Structured coordination snapshot exposed over the bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoordinationStatus {
    pub enabled: bool,
    pub pending_effects: usize,
    pub ms_since_last_press: Option<u64>,
    pub can_press_key: bool,
    pub evaluating: bool,
}

/// Raw timing facts exposed over the bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimingFacts {
    pub cooldown_ms: u64,
    pub ms_since_last_press: Option<u64>,
    /// Press within the fixed activity window, not the cooldown
    pub recently_active: bool,
}

/// Register the engine's exposed queries into `registry`
///
/// Called once at startup; the closures capture the shared status cell.
pub fn install_engine_queries(
    registry: &mut BridgeRegistry,
    cell: Arc<StatusCell>,
    cooldown_ms: u64,
) {
    let active_cell = Arc::clone(&cell);
    registry.register(methods::IS_ACTIVE, move |_args| {
        let status = active_cell.snapshot();
        let pressed_recently = status
            .ms_since_last_press
            .is_some_and(|ms| ms < cooldown_ms);
        Ok(BridgeValue::Bool(
            status.pending_effects > 0 || pressed_recently,
        ))
    });

    let status_cell = Arc::clone(&cell);
    registry.register(methods::STATUS, move |_args| {
        let status = status_cell.snapshot();
        let json = serde_json::to_value(&status)?;
        Ok(BridgeValue::Json(json))
    });

    registry.register(methods::TIMING, move |_args| {
        let ms_since = cell.ms_since_press();
        let facts = TimingFacts {
            cooldown_ms,
            ms_since_last_press: ms_since,
            recently_active: ms_since.is_some_and(|ms| ms <= RECENT_ACTIVITY_WINDOW_MS),
        };
        Ok(BridgeValue::Json(serde_json::to_value(&facts)?))
    });
}
