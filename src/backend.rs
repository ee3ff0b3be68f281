//! Capability traits for the input and overlay backends
//!
//! The engine never implements physical input or drawing; it aggregates
//! instructions into the frame state and realizes them through these
//! traits at the end of each tick. Hosts provide the real implementations;
//! tests use recording doubles.

use crate::core::types::{Color, KeyCode, Rect, Vec2};

/// Physical input primitives consumed by the realization step
pub trait InputBackend {
    /// Press and release a key as one gesture
    fn key_press(&mut self, key: KeyCode);

    fn key_down(&mut self, key: KeyCode);

    fn key_up(&mut self, key: KeyCode);

    fn pointer_down(&mut self);

    fn pointer_up(&mut self);

    /// Move the pointer to an absolute screen position
    fn pointer_move(&mut self, pos: Vec2);
}

/// Overlay drawing primitives consumed by the realization step
pub trait OverlayBackend {
    /// Pixel size the backend would render `text` at
    fn measure_text(&mut self, text: &str) -> Vec2;

    fn draw_box(&mut self, rect: Rect, color: Color);

    fn draw_text(&mut self, text: &str, pos: Vec2, color: Color);

    fn draw_image(&mut self, id: &str, rect: Rect, tint: Color);

    /// Load an image for later `draw_image` calls; idempotent per id.
    ///
    /// Returns false when the image cannot be loaded. The engine caches
    /// the answer and will not retry a failed id.
    fn load_image(&mut self, id: &str, path: &str) -> bool;
}
