//! Per-tick frame state
//!
//! The mutable scratch surface that effect application writes into and the
//! realization step reads from. Rebuilt from scratch every tick the engine
//! runs; nothing here survives a tick boundary.

use crate::bridge::BridgeValue;
use crate::core::types::{Color, KeyRequest, Rect, Vec2};
use crate::snapshot::{PanelVisibility, Snapshot};

/// A queued text draw
#[derive(Debug, Clone, PartialEq)]
pub struct TextDraw {
    pub text: String,
    pub pos: Vec2,
    pub color: Color,
}

/// A queued image draw; the engine loads `path` under `image_id` once
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicDraw {
    pub image_id: String,
    pub path: String,
    pub rect: Rect,
    pub tint: Color,
}

/// A queued progress-bar draw (background box + proportional fill)
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressBarDraw {
    pub rect: Rect,
    /// Clamped to 0.0..=1.0 at apply time
    pub fraction: f32,
    pub fill: Color,
    pub background: Color,
    pub label: Option<String>,
}

/// A queued coordination-bridge invocation, dispatched after application
#[derive(Debug, Clone)]
pub struct BridgeInvocation {
    pub method: String,
    pub args: Vec<BridgeValue>,
}

/// The per-tick output surface
///
/// Effects are the only writers during application; rules see it read-only.
#[derive(Debug, Default)]
pub struct FrameState {
    /// At most one physical key press per tick; first claim wins
    pub key_to_press: Option<KeyRequest>,
    pub holds: Vec<KeyRequest>,
    pub releases: Vec<KeyRequest>,
    pub pointer_move: Option<Vec2>,
    pub texts: Vec<TextDraw>,
    pub graphics: Vec<GraphicDraw>,
    pub progress_bars: Vec<ProgressBarDraw>,
    pub bridge_calls: Vec<BridgeInvocation>,

    // Derived read-only facts, captured at rebuild
    /// Whether the shared cooldown allows a press this tick
    pub can_press_key: bool,
    pub panels: PanelVisibility,
}

impl FrameState {
    /// Build a fresh frame for this tick from the snapshot and the
    /// engine's cooldown verdict
    pub fn rebuild(snapshot: &Snapshot, can_press_key: bool) -> Self {
        Self {
            can_press_key,
            panels: snapshot.panels,
            ..Self::default()
        }
    }
}
