//! Overlay display effects
//!
//! Draw requests complete the moment they are queued on the frame; the
//! actual drawing happens during realization. They are re-produced by
//! rules every tick they should stay visible, so each application is a
//! fresh, unique action.

use crate::core::types::{Color, Rect, Vec2};
use crate::effect::{ApplyCtx, ApplyOutcome};
use crate::frame::{GraphicDraw, ProgressBarDraw, TextDraw};

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayText {
    pub text: String,
    pub pos: Vec2,
    pub color: Color,
}

impl DisplayText {
    pub fn new(text: impl Into<String>, pos: Vec2, color: Color) -> Self {
        Self {
            text: text.into(),
            pos,
            color,
        }
    }

    pub fn apply(&mut self, ctx: &mut ApplyCtx<'_>) -> ApplyOutcome {
        ctx.frame.texts.push(TextDraw {
            text: self.text.clone(),
            pos: self.pos,
            color: self.color,
        });
        ApplyOutcome::AppliedUnique
    }

    pub fn describe(&self) -> String {
        format!("displayed text '{}'", self.text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayGraphic {
    pub image_id: String,
    pub path: String,
    pub rect: Rect,
    pub tint: Color,
}

impl DisplayGraphic {
    pub fn new(
        image_id: impl Into<String>,
        path: impl Into<String>,
        rect: Rect,
        tint: Color,
    ) -> Self {
        Self {
            image_id: image_id.into(),
            path: path.into(),
            rect,
            tint,
        }
    }

    pub fn apply(&mut self, ctx: &mut ApplyCtx<'_>) -> ApplyOutcome {
        ctx.frame.graphics.push(GraphicDraw {
            image_id: self.image_id.clone(),
            path: self.path.clone(),
            rect: self.rect,
            tint: self.tint,
        });
        ApplyOutcome::AppliedUnique
    }

    pub fn describe(&self) -> String {
        format!("displayed graphic '{}'", self.image_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayProgressBar {
    pub rect: Rect,
    pub fraction: f32,
    pub fill: Color,
    pub background: Color,
    pub label: Option<String>,
}

impl DisplayProgressBar {
    pub fn new(rect: Rect, fraction: f32, fill: Color, background: Color) -> Self {
        Self {
            rect,
            fraction,
            fill,
            background,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn apply(&mut self, ctx: &mut ApplyCtx<'_>) -> ApplyOutcome {
        ctx.frame.progress_bars.push(ProgressBarDraw {
            rect: self.rect,
            fraction: self.fraction.clamp(0.0, 1.0),
            fill: self.fill,
            background: self.background,
            label: self.label.clone(),
        });
        ApplyOutcome::AppliedUnique
    }

    pub fn describe(&self) -> String {
        format!("displayed progress bar at {:.0}%", self.fraction * 100.0)
    }
}
