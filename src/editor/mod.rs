//! Authoring model for matching exercises: blocks with words over a
//! background image, plus arrows anchored to blocks.
//!
//! Everything in here works in display space (pixels relative to the canvas
//! viewport). The [`Converter`] built from the current [`Transform`] is the
//! only way in and out of original-image and relative space.

use eframe::egui;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::EditorError;
use crate::model::{self, ArrowStyle, ImageInfo};

pub mod arrows;
pub mod blocks;
pub mod controller;
pub mod coords;
pub mod history;
pub mod scaler;
pub mod serialize;
pub mod words;

pub use arrows::ArrowManager;
pub use blocks::{BlockManager, ResizeHandle};
pub use controller::{Affordance, Interaction, Mode, Outcome, PointerEvent, PointerFrame, Selection};
pub use coords::Converter;
pub use history::{History, Snapshot};
pub use scaler::Transform;
pub use serialize::{Imported, import_questions};
pub use words::WordStore;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EditorConfig {
    /// Space kept free around the fitted image, summed over both sides.
    pub padding: f32,
    pub min_block_size: f32,
    pub default_block_width: f32,
    pub default_block_height: f32,
    /// Distance from a block side that still grabs a resize handle.
    pub edge_tolerance: f32,
    pub snap_radius: f32,
    pub hit_tolerance: f32,
    /// Pointer travel below which a press-release counts as a click.
    pub click_threshold: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            padding: 40.0,
            min_block_size: 20.0,
            default_block_width: 120.0,
            default_block_height: 48.0,
            edge_tolerance: 8.0,
            snap_radius: 60.0,
            hit_tolerance: 6.0,
            click_threshold: 4.0,
        }
    }
}

impl EditorConfig {
    pub fn default_block_size(&self) -> egui::Vec2 {
        egui::vec2(self.default_block_width, self.default_block_height)
    }
}

pub struct EditorState {
    pub config: EditorConfig,
    pub arrow_style: ArrowStyle,
    image: Option<ImageInfo>,
    viewport: egui::Vec2,
    transform: Transform,
    blocks: BlockManager,
    words: WordStore,
    arrows: ArrowManager,
    mode: Mode,
    selection: Option<Selection>,
    interaction: Interaction,
    history: History,
}

impl EditorState {
    pub fn new(config: EditorConfig, arrow_style: ArrowStyle) -> Self {
        Self {
            config,
            arrow_style,
            image: None,
            viewport: egui::Vec2::ZERO,
            transform: Transform::default(),
            blocks: BlockManager::new(config.min_block_size),
            words: WordStore::default(),
            arrows: ArrowManager::default(),
            mode: Mode::default(),
            selection: None,
            interaction: Interaction::Idle,
            history: History::default(),
        }
    }

    pub fn image(&self) -> Option<&ImageInfo> {
        self.image.as_ref()
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn viewport(&self) -> egui::Vec2 {
        scaler::effective_viewport(self.viewport)
    }

    pub fn converter(&self) -> Option<Converter> {
        self.image
            .as_ref()
            .map(|image| Converter::new(self.transform, image.size()))
    }

    pub fn blocks(&self) -> &BlockManager {
        &self.blocks
    }

    pub fn words(&self) -> &WordStore {
        &self.words
    }

    pub fn arrows(&self) -> &ArrowManager {
        &self.arrows
    }

    pub fn set_word(&mut self, block_id: u32, text: impl Into<String>) -> Result<(), EditorError> {
        if self.words.set(block_id, text) {
            Ok(())
        } else {
            Err(EditorError::UnknownBlock(block_id))
        }
    }

    /// Blocks in creation order followed by arrows.
    pub fn shapes(&self) -> impl Iterator<Item = model::Shape<'_>> {
        let blocks = self.blocks.blocks().iter().map(|block| model::Shape::Block {
            block,
            word: self.words.get(block.id).unwrap_or_default(),
        });
        let arrows = self.arrows.arrows().iter().map(model::Shape::Arrow);
        blocks.chain(arrows)
    }

    /// Installs a new background image. Existing content keeps its relative
    /// placement on the image.
    pub fn set_image(&mut self, image: ImageInfo) -> Result<(), EditorError> {
        let transform = Transform::fit(image.size(), self.viewport, self.config.padding)?;
        info!(
            url = %image.url,
            width = image.original_width,
            height = image.original_height,
            scale = transform.scale,
            "background image set"
        );
        let old = self.converter();
        let new = Converter::new(transform, image.size());
        self.image = Some(image);
        self.transform = transform;
        if let Some(old) = old {
            self.carry_content(&old, &new);
        }
        Ok(())
    }

    /// Records the measured canvas size. Returns true when the transform
    /// changed. Repeating a call with the same size is a no-op.
    pub fn set_viewport(&mut self, viewport: egui::Vec2) -> bool {
        self.viewport = viewport;
        let Some(old) = self.converter() else {
            return false;
        };
        let transform = match Transform::fit(old.original, viewport, self.config.padding) {
            Ok(t) => t,
            Err(_) => return false,
        };
        if transform == self.transform {
            return false;
        }
        debug!(w = viewport.x, h = viewport.y, scale = transform.scale, "viewport changed");
        let new = Converter::new(transform, old.original);
        self.transform = transform;
        self.carry_content(&old, &new);
        true
    }

    fn carry_content(&mut self, old: &Converter, new: &Converter) {
        if old == new {
            return;
        }
        self.blocks.remap(|r| old.carry_rect(r, new));
        self.arrows.remap(|p| old.carry(p, new));
        self.arrows.follow_blocks(self.blocks.blocks());
        self.interaction = Interaction::Idle;
    }

    /// Adds a block and its blank word.
    pub fn create_block(&mut self, center: egui::Pos2, size: egui::Vec2) -> u32 {
        let id = self.blocks.create(center, size);
        self.words.register(id);
        info!(block_id = id, "block created");
        id
    }

    pub(crate) fn insert_block_rect(&mut self, rect: egui::Rect) -> u32 {
        let id = self.blocks.insert_rect(rect);
        self.words.register(id);
        info!(block_id = id, "block created");
        id
    }

    /// Removes a block, its word, and every arrow associated with it.
    pub fn delete_block(&mut self, id: u32) -> Result<Vec<u32>, EditorError> {
        self.blocks.remove(id).ok_or(EditorError::UnknownBlock(id))?;
        self.words.remove(id);
        let removed_arrows = self.arrows.remove_for_block(id);
        let selection_gone = match self.selection {
            Some(Selection::Block(sel)) => sel == id,
            Some(Selection::Arrow(sel)) => removed_arrows.contains(&sel),
            None => false,
        };
        if selection_gone {
            self.selection = None;
        }
        info!(block_id = id, arrows = ?removed_arrows, "block deleted");
        Ok(removed_arrows)
    }

    pub fn delete_arrow(&mut self, id: u32) -> Result<(), EditorError> {
        self.arrows.delete(id).ok_or(EditorError::UnknownArrow(id))?;
        if self.selection == Some(Selection::Arrow(id)) {
            self.selection = None;
        }
        info!(arrow_id = id, "arrow deleted");
        Ok(())
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            blocks: self.blocks.clone(),
            words: self.words.clone(),
            arrows: self.arrows.clone(),
            selection: self.selection,
            converter: self.converter(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.blocks = snapshot.blocks;
        self.words = snapshot.words;
        self.arrows = snapshot.arrows;
        self.selection = snapshot.selection;
        self.interaction = Interaction::Idle;
        if let (Some(old), Some(new)) = (snapshot.converter, self.converter()) {
            self.carry_content(&old, &new);
        }
        self.arrows.follow_blocks(self.blocks.blocks());
    }

    pub fn push_undo(&mut self) {
        let snapshot = self.snapshot();
        self.history.record(snapshot);
    }

    pub fn undo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.undo(current) {
            Some(prev) => {
                self.restore(prev);
                debug!("undo");
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.redo(current) {
            Some(next) => {
                self.restore(next);
                debug!("redo");
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Drops all content and history, keeping image and viewport.
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.words.clear();
        self.arrows.clear();
        self.selection = None;
        self.interaction = Interaction::Idle;
        self.history.clear();
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// The 1600x1200 image in an 800x600 viewport with 40px padding.
    pub fn worked_state() -> EditorState {
        let mut state = EditorState::new(EditorConfig::default(), ArrowStyle::default());
        state.set_viewport(egui::vec2(800.0, 600.0));
        state
            .set_image(ImageInfo {
                url: "diagram.png".to_string(),
                original_width: 1600,
                original_height: 1200,
            })
            .unwrap();
        state
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::worked_state;
    use super::*;

    #[test]
    fn creating_a_block_registers_a_blank_word() {
        let mut state = worked_state();
        let id = state.create_block(egui::pos2(200.0, 200.0), state.config.default_block_size());
        assert_eq!(state.words().get(id), Some(""));
        assert_eq!(state.words().len(), state.blocks().len());
    }

    #[test]
    fn deleting_a_block_cascades_to_word_and_arrows() {
        let mut state = worked_state();
        let a = state.create_block(egui::pos2(200.0, 200.0), egui::vec2(60.0, 40.0));
        let b = state.create_block(egui::pos2(500.0, 200.0), egui::vec2(60.0, 40.0));
        let style = state.arrow_style;
        let arrow = state
            .arrows
            .create(state.blocks.blocks(), egui::pos2(200.0, 200.0), egui::pos2(300.0, 400.0), 60.0, 6.0, style)
            .unwrap();
        state
            .arrows
            .create(state.blocks.blocks(), egui::pos2(500.0, 200.0), egui::pos2(300.0, 400.0), 60.0, 6.0, style)
            .unwrap();
        state.selection = Some(Selection::Arrow(arrow));

        let removed = state.delete_block(a).unwrap();
        assert_eq!(removed, vec![arrow]);
        assert!(state.words().get(a).is_none());
        assert!(state.arrows().arrows().iter().all(|x| x.associated_block_id != a));
        assert_eq!(state.arrows().len(), 1);
        assert_eq!(state.selection, None);
        assert!(state.blocks().contains(b));
        assert_eq!(state.delete_block(a), Err(EditorError::UnknownBlock(a)));
    }

    #[test]
    fn id_reuse_after_delete() {
        let mut state = worked_state();
        let size = state.config.default_block_size();
        let a = state.create_block(egui::pos2(100.0, 100.0), size);
        let b = state.create_block(egui::pos2(300.0, 100.0), size);
        assert_eq!((a, b), (1, 2));
        state.delete_block(a).unwrap();
        let c = state.create_block(egui::pos2(500.0, 100.0), size);
        assert_eq!(c, 1);
    }

    #[test]
    fn viewport_change_preserves_relative_placement_and_is_idempotent() {
        let mut state = worked_state();
        let id = state.create_block(egui::pos2(300.0, 250.0), egui::vec2(100.0, 50.0));
        let conv = state.converter().unwrap();
        let rel_before = conv.display_to_relative(state.blocks().get(id).unwrap().rect().min);

        assert!(state.set_viewport(egui::vec2(1200.0, 900.0)));
        let once = *state.blocks().get(id).unwrap();
        assert!(!state.set_viewport(egui::vec2(1200.0, 900.0)));
        assert_eq!(*state.blocks().get(id).unwrap(), once);

        let conv = state.converter().unwrap();
        let rel_after = conv.display_to_relative(once.rect().min);
        assert!((rel_before - rel_after).length() < 1e-3);
        assert!(once.width > 100.0);
    }

    #[test]
    fn image_set_before_layout_moves_once_the_canvas_is_measured() {
        let mut state = EditorState::new(EditorConfig::default(), ArrowStyle::default());
        state
            .set_image(ImageInfo {
                url: "diagram.png".to_string(),
                original_width: 1600,
                original_height: 1200,
            })
            .unwrap();
        assert!((state.transform().scale - 560.0 / 1200.0).abs() < 1e-4);
        let id = state.create_block(egui::pos2(400.0, 300.0), egui::vec2(100.0, 50.0));

        assert!(state.set_viewport(egui::vec2(1600.0, 1200.0)));
        assert!((state.transform().scale - 1160.0 / 1200.0).abs() < 1e-4);
        let block = *state.blocks().get(id).unwrap();
        assert!((block.center() - egui::pos2(800.0, 600.0)).length() < 1e-2);
        assert!(block.width > 200.0);
        assert!(!state.set_viewport(egui::vec2(1600.0, 1200.0)));
    }

    #[test]
    fn words_only_exist_for_live_blocks() {
        let mut state = worked_state();
        assert_eq!(state.set_word(4, "ghost"), Err(EditorError::UnknownBlock(4)));
        let id = state.create_block(egui::pos2(200.0, 200.0), egui::vec2(60.0, 40.0));
        assert_eq!(state.set_word(id, "owl"), Ok(()));
        state.delete_block(id).unwrap();
        assert_eq!(state.set_word(id, "owl"), Err(EditorError::UnknownBlock(id)));
    }

    #[test]
    fn arrows_stay_seated_after_viewport_change() {
        let mut state = worked_state();
        state.create_block(egui::pos2(300.0, 250.0), egui::vec2(100.0, 50.0));
        let style = state.arrow_style;
        state
            .arrows
            .create(state.blocks.blocks(), egui::pos2(300.0, 250.0), egui::pos2(500.0, 400.0), 60.0, 6.0, style)
            .unwrap();
        state.set_viewport(egui::vec2(640.0, 480.0));
        let block = state.blocks().blocks()[0];
        let arrow = state.arrows().arrows()[0];
        assert_eq!(arrow.start.to_pos2(), block.center());
    }

    #[test]
    fn undo_restores_deleted_block_and_redo_removes_it_again() {
        let mut state = worked_state();
        let id = state.create_block(egui::pos2(300.0, 250.0), egui::vec2(100.0, 50.0));
        state.set_word(id, "river").unwrap();
        state.push_undo();
        state.delete_block(id).unwrap();
        assert!(state.undo());
        assert_eq!(state.words().get(id), Some("river"));
        assert!(state.redo());
        assert!(!state.blocks().contains(id));
        assert!(!state.redo());
    }

    #[test]
    fn undo_after_resize_of_viewport_maps_into_current_view() {
        let mut state = worked_state();
        let id = state.create_block(egui::pos2(300.0, 250.0), egui::vec2(100.0, 50.0));
        let old_scale = state.transform().scale;
        state.push_undo();
        state.delete_block(id).unwrap();
        state.set_viewport(egui::vec2(1600.0, 1200.0));
        let new_scale = state.transform().scale;
        assert!(state.undo());
        let block = state.blocks().get(id).unwrap();
        assert!((block.width - 100.0 * new_scale / old_scale).abs() < 0.01);
    }

    #[test]
    fn shapes_list_blocks_then_arrows() {
        let mut state = worked_state();
        let id = state.create_block(egui::pos2(300.0, 250.0), egui::vec2(100.0, 50.0));
        state.set_word(id, "owl").unwrap();
        let style = state.arrow_style;
        state
            .arrows
            .create(state.blocks.blocks(), egui::pos2(300.0, 250.0), egui::pos2(500.0, 400.0), 60.0, 6.0, style)
            .unwrap();
        let shapes: Vec<_> = state.shapes().collect();
        assert_eq!(shapes.len(), 2);
        assert!(matches!(shapes[0], model::Shape::Block { word: "owl", .. }));
        assert!(matches!(shapes[1], model::Shape::Arrow(_)));
    }
}
