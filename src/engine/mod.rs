//! Engine - owns all process-wide state and drives the per-tick pipeline
//!
//! One `Engine` value is created at startup and passed `&mut` into every
//! tick. A tick runs: execution gate -> rebuild frame state -> apply the
//! effects carried from last tick -> evaluate rule groups -> enqueue and
//! apply this tick's effects -> dispatch coordination calls -> realize the
//! frame's input and overlay instructions. Nothing in here blocks; effects
//! that must wait report back next tick.

pub mod history;
pub mod queue;

use std::sync::Arc;
use std::time::Instant;

use ahash::AHashSet;
use tracing::{debug, info, warn};

use crate::backend::{InputBackend, OverlayBackend};
use crate::bridge::{self, BridgeRegistry, CoordinationStatus, StatusCell};
use crate::core::config::EngineConfig;
use crate::core::error::Result;
use crate::core::types::{KeyRequest, Rect, Tick, Vec2};
use crate::effect::ApplyCtx;
use crate::frame::FrameState;
use crate::gate::{self, GateVerdict};
use crate::rules::{self, Profile, RuleCtx};
use crate::snapshot::Snapshot;
use crate::vars::VariableStore;

use self::history::History;
use self::queue::{PassStats, PendingQueue, SideEffectContainer};

/// What one tick did, for the host and for tests
#[derive(Debug)]
pub struct TickReport {
    pub tick: Tick,
    pub enabled: bool,
    pub verdict: GateVerdict,
    /// Whether the effect pipeline ran (gate passed, not inspect-only)
    pub ran: bool,
    /// Effects produced by rule evaluation this tick
    pub produced: usize,
    /// Application pass over effects carried from previous ticks
    pub pass_before: PassStats,
    /// Application pass over this tick's queue after enqueueing
    pub pass_after: PassStats,
    /// Pending containers left for next tick
    pub pending: usize,
    /// Would-be effect descriptions, populated in inspect-only mode
    pub inspected: Vec<String>,
}

impl TickReport {
    fn new(tick: Tick, enabled: bool, verdict: GateVerdict) -> Self {
        Self {
            tick,
            enabled,
            verdict,
            ran: false,
            produced: 0,
            pass_before: PassStats::default(),
            pass_after: PassStats::default(),
            pending: 0,
            inspected: Vec::new(),
        }
    }
}

/// Idempotent image loading for the overlay backend
#[derive(Debug, Default)]
struct ImageRegistry {
    loaded: AHashSet<String>,
    failed: AHashSet<String>,
}

impl ImageRegistry {
    /// True when the image is usable; loads it on first sight and caches
    /// failures so a bad path is reported once, not every tick
    fn ensure(&mut self, overlay: &mut dyn OverlayBackend, id: &str, path: &str) -> bool {
        if self.loaded.contains(id) {
            return true;
        }
        if self.failed.contains(id) {
            return false;
        }
        if overlay.load_image(id, path) {
            self.loaded.insert(id.to_owned());
            true
        } else {
            warn!(id, path, "failed to load overlay image");
            self.failed.insert(id.to_owned());
            false
        }
    }
}

/// The automation engine
pub struct Engine {
    config: EngineConfig,
    queue: PendingQueue,
    vars: VariableStore,
    history: History,
    held: AHashSet<KeyRequest>,
    images: ImageRegistry,
    last_key_press: Option<Instant>,
    enabled: bool,
    status: Arc<StatusCell>,
    tick_count: Tick,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let history = History::new(config.history_retention(), config.history_max_entries);
        Ok(Self {
            config,
            queue: PendingQueue::new(),
            vars: VariableStore::new(),
            history,
            held: AHashSet::new(),
            images: ImageRegistry::default(),
            last_key_press: None,
            enabled: true,
            status: Arc::new(StatusCell::new()),
            tick_count: 0,
        })
    }

    /// Register the engine's exposed coordination queries; call once at
    /// startup on the registry external collaborators share
    pub fn install_bridge_queries(&self, registry: &mut BridgeRegistry) {
        bridge::install_engine_queries(
            registry,
            Arc::clone(&self.status),
            self.config.key_cooldown_ms,
        );
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable the pipeline. Disabling releases every held key
    /// so no modifier is left stuck while the engine sleeps.
    pub fn set_enabled(&mut self, enabled: bool, input: &mut dyn InputBackend) {
        if self.enabled && !enabled && !self.held.is_empty() {
            for key in self.held.drain() {
                match key {
                    KeyRequest::Key(code) => input.key_up(code),
                    KeyRequest::PrimaryPointer => input.pointer_up(),
                }
            }
            info!("engine disabled, released held keys");
        }
        self.enabled = enabled;
        self.status.set_enabled(enabled);
    }

    /// Whether the shared cooldown clock allows a press right now
    pub fn can_press_key(&self, now: Instant) -> bool {
        match self.last_key_press {
            Some(at) => now.saturating_duration_since(at) >= self.config.key_cooldown(),
            None => true,
        }
    }

    /// Busy/idle as seen by external collaborators: pending work exists or
    /// a key was pressed within the cooldown window
    pub fn is_active(&self, now: Instant) -> bool {
        if !self.queue.is_empty() {
            return true;
        }
        match self.last_key_press {
            Some(at) => now.saturating_duration_since(at) < self.config.key_cooldown(),
            None => false,
        }
    }

    pub fn coordination_status(&self, now: Instant) -> CoordinationStatus {
        CoordinationStatus {
            enabled: self.enabled,
            pending_effects: self.queue.len(),
            ms_since_last_press: self
                .last_key_press
                .map(|at| now.saturating_duration_since(at).as_millis() as u64),
            can_press_key: self.can_press_key(now),
            evaluating: false,
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn vars(&self) -> &VariableStore {
        &self.vars
    }

    pub fn pending_effects(&self) -> usize {
        self.queue.len()
    }

    /// Run one tick of the pipeline
    pub fn tick(
        &mut self,
        now: Instant,
        snapshot: &Snapshot,
        profile: &Profile,
        registry: &BridgeRegistry,
        input: &mut dyn InputBackend,
        overlay: &mut dyn OverlayBackend,
    ) -> TickReport {
        self.tick_count += 1;
        let verdict = gate::evaluate(snapshot, &self.config);
        let mut report = TickReport::new(self.tick_count, self.enabled, verdict);

        if !self.enabled {
            self.publish_status(now);
            return report;
        }

        let inspect = self.config.inspect_only;
        let run_effects = verdict.should_run() && !inspect;
        if !verdict.should_run() {
            debug!(reason = verdict.reason(), "execution gate blocked tick");
        }

        if !verdict.should_run() && !inspect {
            self.publish_status(now);
            return report;
        }

        let mut frame = FrameState::rebuild(snapshot, self.can_press_key(now));

        // Pass 1: flush effect decisions carried from the previous tick
        if run_effects {
            let mut ctx = ApplyCtx {
                now,
                frame: &mut frame,
                vars: &mut self.vars,
                bridge: registry,
                held: &mut self.held,
                config: &self.config,
            };
            report.pass_before = self.queue.run_pass(&mut ctx, &mut self.history);
        }

        // Rule evaluation: effects are the only output channel
        self.status.set_evaluating(true);
        let rule_ctx = RuleCtx {
            snapshot,
            frame: &frame,
            vars: &self.vars,
            now,
        };
        let produced = rules::evaluate_groups(profile, &rule_ctx);
        self.status.set_evaluating(false);
        report.produced = produced.len();

        if run_effects {
            for effect in produced {
                self.queue.enqueue(SideEffectContainer::new(effect, now));
            }

            // Pass 2: give this tick's zero-delay effects their chance to
            // resolve within the tick that produced them
            let mut ctx = ApplyCtx {
                now,
                frame: &mut frame,
                vars: &mut self.vars,
                bridge: registry,
                held: &mut self.held,
                config: &self.config,
            };
            report.pass_after = self.queue.run_pass(&mut ctx, &mut self.history);

            self.dispatch_bridge_calls(&mut frame, registry);
            self.realize(&frame, now, input, overlay);
            report.ran = true;
        } else {
            report.inspected = produced.iter().map(|e| e.describe()).collect();
        }

        report.pending = self.queue.len();
        self.publish_status(now);
        report
    }

    /// Invoke every bridge call the frame accumulated. Missing methods and
    /// invocation errors are logged and ignored; the tick always finishes.
    fn dispatch_bridge_calls(&mut self, frame: &mut FrameState, registry: &BridgeRegistry) {
        for call in frame.bridge_calls.drain(..) {
            match registry.invoke(&call.method, &call.args) {
                Ok(_) => debug!(method = %call.method, "bridge call dispatched"),
                Err(error) => warn!(method = %call.method, %error, "bridge call failed"),
            }
        }
    }

    /// Issue the frame's aggregated instructions to the backends
    fn realize(
        &mut self,
        frame: &FrameState,
        now: Instant,
        input: &mut dyn InputBackend,
        overlay: &mut dyn OverlayBackend,
    ) {
        // At most one key press per tick; the cooldown is re-checked here
        // because the clock may have been reset since the frame was built
        if let Some(key) = frame.key_to_press {
            if self.can_press_key(now) {
                match key {
                    KeyRequest::Key(code) => input.key_press(code),
                    KeyRequest::PrimaryPointer => {
                        input.pointer_down();
                        input.pointer_up();
                    }
                }
                self.last_key_press = Some(now);
            } else {
                debug!("key press suppressed by shared cooldown");
            }
        }

        if let Some(pos) = frame.pointer_move {
            input.pointer_move(pos);
        }

        for &key in &frame.holds {
            match key {
                KeyRequest::Key(code) => input.key_down(code),
                KeyRequest::PrimaryPointer => input.pointer_down(),
            }
        }
        for &key in &frame.releases {
            match key {
                KeyRequest::Key(code) => input.key_up(code),
                KeyRequest::PrimaryPointer => input.pointer_up(),
            }
        }

        for bar in &frame.progress_bars {
            overlay.draw_box(bar.rect, bar.background);
            let fill = Rect::new(
                bar.rect.x,
                bar.rect.y,
                bar.rect.width * bar.fraction,
                bar.rect.height,
            );
            overlay.draw_box(fill, bar.fill);
            if let Some(label) = &bar.label {
                let size = overlay.measure_text(label);
                let center = bar.rect.center();
                let pos = Vec2::new(center.x - size.x / 2.0, center.y - size.y / 2.0);
                overlay.draw_text(label, pos, crate::core::types::Color::WHITE);
            }
        }

        for text in &frame.texts {
            overlay.draw_text(&text.text, text.pos, text.color);
        }

        for graphic in &frame.graphics {
            if self
                .images
                .ensure(overlay, &graphic.image_id, &graphic.path)
            {
                overlay.draw_image(&graphic.image_id, graphic.rect, graphic.tint);
            }
        }
    }

    /// Publish coordination facts for the exposed bridge queries
    fn publish_status(&self, now: Instant) {
        self.status.set_enabled(self.enabled);
        self.status.set_pending(self.queue.len());
        self.status.set_press_allowed(self.can_press_key(now));
        self.status.set_ms_since_press(
            self.last_key_press
                .map(|at| now.saturating_duration_since(at).as_millis() as u64),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Color;

    #[derive(Default)]
    struct NullInput;

    impl InputBackend for NullInput {
        fn key_press(&mut self, _key: crate::core::types::KeyCode) {}
        fn key_down(&mut self, _key: crate::core::types::KeyCode) {}
        fn key_up(&mut self, _key: crate::core::types::KeyCode) {}
        fn pointer_down(&mut self) {}
        fn pointer_up(&mut self) {}
        fn pointer_move(&mut self, _pos: Vec2) {}
    }

    /// Overlay double that counts load attempts per image id
    #[derive(Default)]
    struct CountingOverlay {
        load_calls: Vec<String>,
        load_result: bool,
        draws: usize,
    }

    impl OverlayBackend for CountingOverlay {
        fn measure_text(&mut self, text: &str) -> Vec2 {
            Vec2::new(text.len() as f32 * 7.0, 12.0)
        }
        fn draw_box(&mut self, _rect: Rect, _color: Color) {
            self.draws += 1;
        }
        fn draw_text(&mut self, _text: &str, _pos: Vec2, _color: Color) {
            self.draws += 1;
        }
        fn draw_image(&mut self, _id: &str, _rect: Rect, _tint: Color) {
            self.draws += 1;
        }
        fn load_image(&mut self, id: &str, _path: &str) -> bool {
            self.load_calls.push(id.to_owned());
            self.load_result
        }
    }

    #[test]
    fn test_image_registry_loads_once_and_caches_failures() {
        let mut registry = ImageRegistry::default();
        let mut overlay = CountingOverlay {
            load_result: true,
            ..CountingOverlay::default()
        };

        assert!(registry.ensure(&mut overlay, "icon", "icon.png"));
        assert!(registry.ensure(&mut overlay, "icon", "icon.png"));
        assert_eq!(overlay.load_calls.len(), 1, "load_image called once per id");

        let mut failing = CountingOverlay::default();
        assert!(!registry.ensure(&mut failing, "broken", "missing.png"));
        assert!(!registry.ensure(&mut failing, "broken", "missing.png"));
        assert_eq!(failing.load_calls.len(), 1, "failures are cached too");
    }

    #[test]
    fn test_disable_releases_held_keys() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        engine.held.insert(KeyRequest::PrimaryPointer);

        let mut input = NullInput;
        engine.set_enabled(false, &mut input);
        assert!(engine.held.is_empty());
        assert!(!engine.is_enabled());
    }

    #[test]
    fn test_cooldown_clock_gates_presses() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        let t0 = Instant::now();
        assert!(engine.can_press_key(t0), "never pressed means free");

        engine.last_key_press = Some(t0);
        let within = t0 + std::time::Duration::from_millis(100);
        let after = t0 + std::time::Duration::from_millis(300);
        assert!(!engine.can_press_key(within));
        assert!(engine.can_press_key(after));
    }

    #[test]
    fn test_is_active_tracks_pending_and_recent_press() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        let t0 = Instant::now();
        assert!(!engine.is_active(t0));

        engine.last_key_press = Some(t0);
        assert!(engine.is_active(t0 + std::time::Duration::from_millis(100)));
        assert!(!engine.is_active(t0 + std::time::Duration::from_millis(400)));
    }
}
