use eframe::egui;
use tracing::{debug, info};

use crate::error::PlacementError;
use crate::model::{self, Arrow, ArrowStyle, AssociationKind, Block};

/// Nearest block whose center lies within `radius` of `point`. On equal
/// distance the block seen first wins.
///
/// This center-distance test is the only "near a block" predicate: arrow
/// validation and magnetic snapping both go through it.
pub fn snap_to_nearest_block(blocks: &[Block], point: egui::Pos2, radius: f32) -> Option<&Block> {
    let mut best: Option<(&Block, f32)> = None;
    for block in blocks {
        let d = block.center().distance(point);
        if d > radius {
            continue;
        }
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((block, d));
        }
    }
    best.map(|(block, _)| block)
}

pub fn validate_placement(blocks: &[Block], start: egui::Pos2, radius: f32) -> bool {
    snap_to_nearest_block(blocks, start, radius).is_some()
}

#[derive(Clone, Debug)]
pub struct ArrowManager {
    arrows: Vec<Arrow>,
    next_id: u32,
}

impl Default for ArrowManager {
    fn default() -> Self {
        Self {
            arrows: Vec::new(),
            next_id: 1,
        }
    }
}

impl ArrowManager {
    pub fn arrows(&self) -> &[Arrow] {
        &self.arrows
    }

    pub fn len(&self) -> usize {
        self.arrows.len()
    }

    pub fn get(&self, id: u32) -> Option<&Arrow> {
        self.arrows.iter().find(|a| a.id == id)
    }

    pub fn for_block(&self, block_id: u32) -> Option<&Arrow> {
        self.arrows.iter().find(|a| a.associated_block_id == block_id)
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Snaps `start` onto the nearest block center and records the
    /// association. `end` is kept as drawn. A block keeps at most one arrow;
    /// the previous one is replaced.
    pub fn create(
        &mut self,
        blocks: &[Block],
        start: egui::Pos2,
        end: egui::Pos2,
        radius: f32,
        min_length: f32,
        style: ArrowStyle,
    ) -> Result<u32, PlacementError> {
        let Some(block) = snap_to_nearest_block(blocks, start, radius) else {
            debug!(x = start.x, y = start.y, radius, "arrow start not near any block");
            return Err(PlacementError::NoBlockInRange { radius });
        };
        let snapped = block.center();
        if snapped.distance(end) < min_length {
            return Err(PlacementError::TooShort);
        }
        let block_id = block.id;
        let replaced = self.remove_for_block(block_id);
        if !replaced.is_empty() {
            info!(block_id, ?replaced, "replacing existing arrow");
        }
        let id = self.allocate_id();
        self.arrows.push(Arrow {
            id,
            start: model::Point::from_pos2(snapped),
            end: model::Point::from_pos2(end),
            associated_block_id: block_id,
            association: AssociationKind::Start,
            style,
        });
        info!(arrow_id = id, block_id, "arrow created");
        Ok(id)
    }

    /// Adds an arrow reconstructed from saved data under a fresh id.
    pub fn insert(&mut self, mut arrow: Arrow) -> u32 {
        arrow.id = self.allocate_id();
        self.arrows.push(arrow);
        arrow.id
    }

    pub fn delete(&mut self, id: u32) -> Option<Arrow> {
        let idx = self.arrows.iter().position(|a| a.id == id)?;
        Some(self.arrows.remove(idx))
    }

    pub fn remove_for_block(&mut self, block_id: u32) -> Vec<u32> {
        let removed: Vec<u32> = self
            .arrows
            .iter()
            .filter(|a| a.associated_block_id == block_id)
            .map(|a| a.id)
            .collect();
        self.arrows.retain(|a| a.associated_block_id != block_id);
        removed
    }

    pub fn hit_test(&self, p: egui::Pos2, tolerance: f32) -> Option<u32> {
        self.arrows
            .iter()
            .rev()
            .find(|a| {
                model::distance_to_segment(p, a.start.to_pos2(), a.end.to_pos2())
                    <= tolerance + a.style.stroke_width * 0.5
            })
            .map(|a| a.id)
    }

    /// Re-seats every anchored endpoint on its block's current center.
    pub fn follow_blocks(&mut self, blocks: &[Block]) {
        for arrow in &mut self.arrows {
            if let Some(block) = blocks.iter().find(|b| b.id == arrow.associated_block_id) {
                arrow.seat_on(block.center());
            }
        }
    }

    pub fn remap(&mut self, mut f: impl FnMut(egui::Pos2) -> egui::Pos2) {
        for arrow in &mut self.arrows {
            arrow.start = model::Point::from_pos2(f(arrow.start.to_pos2()));
            arrow.end = model::Point::from_pos2(f(arrow.end.to_pos2()));
        }
    }

    pub fn clear(&mut self) {
        self.arrows.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(id: u32, cx: f32, cy: f32) -> Block {
        Block {
            id,
            x: cx - 20.0,
            y: cy - 10.0,
            width: 40.0,
            height: 20.0,
        }
    }

    #[test]
    fn snap_boundary_is_inclusive() {
        let blocks = [block(1, 100.0, 100.0)];
        assert!(snap_to_nearest_block(&blocks, egui::pos2(160.0, 100.0), 60.0).is_some());
        assert!(snap_to_nearest_block(&blocks, egui::pos2(160.01, 100.0), 60.0).is_none());
        assert!(validate_placement(&blocks, egui::pos2(100.0, 40.0), 60.0));
        assert!(!validate_placement(&blocks, egui::pos2(100.0, 39.9), 60.0));
    }

    #[test]
    fn nearest_block_wins_and_ties_go_to_the_first() {
        let blocks = [block(1, 0.0, 0.0), block(2, 100.0, 0.0), block(3, 60.0, 0.0)];
        let hit = snap_to_nearest_block(&blocks, egui::pos2(70.0, 0.0), 80.0).unwrap();
        assert_eq!(hit.id, 3);
        let tied = [block(1, 0.0, 0.0), block(2, 100.0, 0.0)];
        let hit = snap_to_nearest_block(&tied, egui::pos2(50.0, 0.0), 80.0).unwrap();
        assert_eq!(hit.id, 1);
    }

    #[test]
    fn create_snaps_start_but_not_end() {
        let blocks = [block(1, 100.0, 100.0), block(2, 400.0, 100.0)];
        let mut arrows = ArrowManager::default();
        let id = arrows
            .create(&blocks, egui::pos2(390.0, 130.0), egui::pos2(600.0, 300.0), 60.0, 6.0, ArrowStyle::default())
            .unwrap();
        let arrow = arrows.get(id).unwrap();
        assert_eq!(arrow.associated_block_id, 2);
        assert_eq!(arrow.start.to_pos2(), egui::pos2(400.0, 100.0));
        assert_eq!(arrow.end.to_pos2(), egui::pos2(600.0, 300.0));
        assert_eq!(arrow.association, AssociationKind::Start);
    }

    #[test]
    fn create_far_from_blocks_is_rejected_without_mutation() {
        let blocks = [block(1, 100.0, 100.0)];
        let mut arrows = ArrowManager::default();
        let err = arrows
            .create(&blocks, egui::pos2(700.0, 700.0), egui::pos2(800.0, 800.0), 60.0, 6.0, ArrowStyle::default())
            .unwrap_err();
        assert_eq!(err, PlacementError::NoBlockInRange { radius: 60.0 });
        assert_eq!(arrows.len(), 0);
    }

    #[test]
    fn arrow_ending_on_its_own_center_is_too_short() {
        let blocks = [block(1, 100.0, 100.0)];
        let mut arrows = ArrowManager::default();
        let err = arrows
            .create(&blocks, egui::pos2(110.0, 100.0), egui::pos2(102.0, 101.0), 60.0, 6.0, ArrowStyle::default())
            .unwrap_err();
        assert_eq!(err, PlacementError::TooShort);
    }

    #[test]
    fn second_arrow_from_a_block_replaces_the_first() {
        let blocks = [block(1, 100.0, 100.0)];
        let mut arrows = ArrowManager::default();
        let style = ArrowStyle::default();
        let first = arrows
            .create(&blocks, egui::pos2(100.0, 100.0), egui::pos2(300.0, 100.0), 60.0, 6.0, style)
            .unwrap();
        let second = arrows
            .create(&blocks, egui::pos2(100.0, 100.0), egui::pos2(100.0, 300.0), 60.0, 6.0, style)
            .unwrap();
        assert_ne!(first, second);
        assert_eq!(arrows.len(), 1);
        assert_eq!(arrows.for_block(1).unwrap().id, second);
    }

    #[test]
    fn anchored_end_follows_its_block() {
        let mut blocks = vec![block(1, 100.0, 100.0), block(2, 300.0, 100.0)];
        let mut arrows = ArrowManager::default();
        let style = ArrowStyle::default();
        arrows.create(&blocks, egui::pos2(100.0, 100.0), egui::pos2(100.0, 300.0), 60.0, 6.0, style).unwrap();
        arrows.create(&blocks, egui::pos2(300.0, 100.0), egui::pos2(300.0, 300.0), 60.0, 6.0, style).unwrap();
        blocks[0].x += 50.0;
        arrows.follow_blocks(&blocks);
        assert_eq!(arrows.for_block(1).unwrap().start.to_pos2(), egui::pos2(150.0, 100.0));
        assert_eq!(arrows.for_block(1).unwrap().end.to_pos2(), egui::pos2(100.0, 300.0));
        assert_eq!(arrows.for_block(2).unwrap().start.to_pos2(), egui::pos2(300.0, 100.0));
    }

    #[test]
    fn hit_test_uses_segment_distance() {
        let blocks = [block(1, 100.0, 100.0)];
        let mut arrows = ArrowManager::default();
        let id = arrows
            .create(&blocks, egui::pos2(100.0, 100.0), egui::pos2(300.0, 100.0), 60.0, 6.0, ArrowStyle::default())
            .unwrap();
        assert_eq!(arrows.hit_test(egui::pos2(200.0, 105.0), 6.0), Some(id));
        assert_eq!(arrows.hit_test(egui::pos2(200.0, 120.0), 6.0), None);
    }
}
