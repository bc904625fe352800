//! Read-only rendition of a saved exercise, laid out for whatever canvas
//! size the student has.

use eframe::egui;
use tracing::debug;

use crate::editor::{Imported, Transform, import_questions};
use crate::error::ImportError;
use crate::model::{self, ImageInfo, TestPayload};

pub struct PlaybackDiagram {
    payload: TestPayload,
    image: ImageInfo,
    padding: f32,
    transform: Transform,
    content: Imported,
}

impl PlaybackDiagram {
    pub fn new(payload: TestPayload, viewport: egui::Vec2, padding: f32) -> Result<Self, ImportError> {
        let image = payload.image_info().ok_or(ImportError::MissingImageSize)?;
        let transform = Transform::fit(image.size(), viewport, padding)?;
        let content = layout(&payload, &image, &transform);
        Ok(Self {
            payload,
            image,
            padding,
            transform,
            content,
        })
    }

    pub fn image(&self) -> &ImageInfo {
        &self.image
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Lays the exercise out again for a new canvas size. Returns false when
    /// nothing moved.
    pub fn relayout(&mut self, viewport: egui::Vec2) -> bool {
        let Ok(transform) = Transform::fit(self.image.size(), viewport, self.padding) else {
            return false;
        };
        if transform == self.transform {
            return false;
        }
        debug!(w = viewport.x, h = viewport.y, "playback relayout");
        self.content = layout(&self.payload, &self.image, &transform);
        self.transform = transform;
        true
    }

    pub fn shapes(&self) -> impl Iterator<Item = model::Shape<'_>> {
        let blocks = self.content.blocks.blocks().iter().map(|block| model::Shape::Block {
            block,
            word: self.content.words.get(block.id).unwrap_or_default(),
        });
        let arrows = self.content.arrows.arrows().iter().map(model::Shape::Arrow);
        blocks.chain(arrows)
    }

    /// Every word of the exercise, alphabetised so the order gives nothing
    /// away.
    pub fn word_bank(&self) -> Vec<&str> {
        let mut words: Vec<&str> = self.content.words.iter().map(|(_, w)| w).collect();
        words.sort_unstable_by_key(|w| w.to_lowercase());
        words
    }

    pub fn block_count(&self) -> usize {
        self.content.blocks.len()
    }
}

fn layout(payload: &TestPayload, image: &ImageInfo, transform: &Transform) -> Imported {
    // Playback never resizes, so saved blocks are kept at any size.
    import_questions(&payload.questions, transform, image.size(), 0.0)
}
