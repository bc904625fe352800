use eframe::egui;

use crate::error::EditorError;

/// Viewport assumed until the canvas has been laid out.
pub const FALLBACK_VIEWPORT: egui::Vec2 = egui::vec2(800.0, 600.0);

/// Maps the unscaled image onto the viewport: uniform scale, then offset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub scale: f32,
    pub offset: egui::Vec2,
    pub display_size: egui::Vec2,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: egui::Vec2::ZERO,
            display_size: FALLBACK_VIEWPORT,
        }
    }
}

impl Transform {
    /// Fits `original` inside `viewport` shrunk by `padding`, preserving the
    /// aspect ratio and centering the result.
    pub fn fit(
        original: egui::Vec2,
        viewport: egui::Vec2,
        padding: f32,
    ) -> Result<Self, EditorError> {
        if !(original.x > 0.0 && original.y > 0.0) {
            return Err(EditorError::EmptyImage {
                width: original.x.max(0.0) as u32,
                height: original.y.max(0.0) as u32,
            });
        }
        let viewport = effective_viewport(viewport);
        let available = egui::vec2(
            (viewport.x - padding).max(1.0),
            (viewport.y - padding).max(1.0),
        );
        let scale = (available.x / original.x).min(available.y / original.y);
        let display_size = original * scale;
        let offset = (viewport - display_size) * 0.5;
        Ok(Self {
            scale,
            offset,
            display_size,
        })
    }

    pub fn display_rect(&self) -> egui::Rect {
        egui::Rect::from_min_size(self.offset.to_pos2(), self.display_size)
    }
}

/// A viewport with a zero dimension has not been measured yet.
pub fn is_measured(viewport: egui::Vec2) -> bool {
    viewport.x > 0.0 && viewport.y > 0.0
}

pub fn effective_viewport(viewport: egui::Vec2) -> egui::Vec2 {
    if is_measured(viewport) {
        viewport
    } else {
        FALLBACK_VIEWPORT
    }
}
