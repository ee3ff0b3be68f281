//! Shared recording backends for integration tests

use reflex::backend::{InputBackend, OverlayBackend};
use reflex::core::types::{Color, KeyCode, Rect, Vec2};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Press(KeyCode),
    Down(KeyCode),
    Up(KeyCode),
    PointerDown,
    PointerUp,
    PointerMove(Vec2),
}

/// Input double that records every primitive call in order
#[derive(Default)]
pub struct RecordingInput {
    pub events: Vec<InputEvent>,
}

impl RecordingInput {
    pub fn key_presses(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, InputEvent::Press(_)))
            .count()
    }

    pub fn pointer_moves(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, InputEvent::PointerMove(_)))
            .count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl InputBackend for RecordingInput {
    fn key_press(&mut self, key: KeyCode) {
        self.events.push(InputEvent::Press(key));
    }
    fn key_down(&mut self, key: KeyCode) {
        self.events.push(InputEvent::Down(key));
    }
    fn key_up(&mut self, key: KeyCode) {
        self.events.push(InputEvent::Up(key));
    }
    fn pointer_down(&mut self) {
        self.events.push(InputEvent::PointerDown);
    }
    fn pointer_up(&mut self) {
        self.events.push(InputEvent::PointerUp);
    }
    fn pointer_move(&mut self, pos: Vec2) {
        self.events.push(InputEvent::PointerMove(pos));
    }
}

/// Overlay double that records draw calls and can be told to fail loads
#[derive(Default)]
pub struct RecordingOverlay {
    pub boxes: Vec<Rect>,
    pub texts: Vec<String>,
    pub images: Vec<String>,
    pub loads: Vec<String>,
    pub fail_loads: bool,
}

impl OverlayBackend for RecordingOverlay {
    fn measure_text(&mut self, text: &str) -> Vec2 {
        Vec2::new(text.len() as f32 * 7.0, 12.0)
    }
    fn draw_box(&mut self, rect: Rect, _color: Color) {
        self.boxes.push(rect);
    }
    fn draw_text(&mut self, text: &str, _pos: Vec2, _color: Color) {
        self.texts.push(text.to_owned());
    }
    fn draw_image(&mut self, id: &str, _rect: Rect, _tint: Color) {
        self.images.push(id.to_owned());
    }
    fn load_image(&mut self, id: &str, _path: &str) -> bool {
        self.loads.push(id.to_owned());
        !self.fail_loads
    }
}
