use eframe::egui;

use crate::model::Block;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResizeHandle {
    NW,
    N,
    NE,
    W,
    E,
    SW,
    S,
    SE,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::NW,
        ResizeHandle::N,
        ResizeHandle::NE,
        ResizeHandle::W,
        ResizeHandle::E,
        ResizeHandle::SW,
        ResizeHandle::S,
        ResizeHandle::SE,
    ];

    fn from_sides(left: bool, right: bool, top: bool, bottom: bool) -> Option<Self> {
        match (left, right, top, bottom) {
            (true, _, true, _) => Some(Self::NW),
            (_, true, true, _) => Some(Self::NE),
            (true, _, _, true) => Some(Self::SW),
            (_, true, _, true) => Some(Self::SE),
            (true, _, _, _) => Some(Self::W),
            (_, true, _, _) => Some(Self::E),
            (_, _, true, _) => Some(Self::N),
            (_, _, _, true) => Some(Self::S),
            _ => None,
        }
    }

    /// Position of the handle on `rect`.
    pub fn anchor(self, rect: egui::Rect) -> egui::Pos2 {
        let c = rect.center();
        match self {
            Self::NW => rect.left_top(),
            Self::N => egui::pos2(c.x, rect.top()),
            Self::NE => rect.right_top(),
            Self::W => egui::pos2(rect.left(), c.y),
            Self::E => egui::pos2(rect.right(), c.y),
            Self::SW => rect.left_bottom(),
            Self::S => egui::pos2(c.x, rect.bottom()),
            Self::SE => rect.right_bottom(),
        }
    }
}

/// Owns every block in creation order. Later blocks sit on top.
#[derive(Clone, Debug)]
pub struct BlockManager {
    blocks: Vec<Block>,
    min_size: f32,
}

impl BlockManager {
    pub fn new(min_size: f32) -> Self {
        Self {
            blocks: Vec::new(),
            min_size,
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.get(id).is_some()
    }

    /// Smallest positive id not held by a live block.
    pub fn next_free_id(&self) -> u32 {
        let mut used: Vec<u32> = self.blocks.iter().map(|b| b.id).collect();
        used.sort_unstable();
        let mut candidate = 1;
        for id in used {
            if id == candidate {
                candidate += 1;
            } else if id > candidate {
                break;
            }
        }
        candidate
    }

    /// Places a block of `size` centered on `center`; each side is at least
    /// the minimum size.
    pub fn create(&mut self, center: egui::Pos2, size: egui::Vec2) -> u32 {
        let size = size.max(egui::Vec2::splat(self.min_size));
        self.insert_rect(egui::Rect::from_center_size(center, size))
    }

    pub fn insert_rect(&mut self, rect: egui::Rect) -> u32 {
        let id = self.next_free_id();
        let size = rect.size().max(egui::Vec2::splat(self.min_size));
        let rect = egui::Rect::from_min_size(rect.min, size);
        self.blocks.push(Block::from_rect(id, rect));
        id
    }

    /// Inserts a block that already carries an id. Returns false if the id is
    /// taken or the geometry is unusable.
    pub fn restore(&mut self, block: Block) -> bool {
        let finite = [block.x, block.y, block.width, block.height]
            .iter()
            .all(|v| v.is_finite());
        if block.id == 0 || !finite || block.width <= 0.0 || block.height <= 0.0 {
            return false;
        }
        if self.contains(block.id) {
            return false;
        }
        self.blocks.push(block);
        true
    }

    pub fn hit_test(&self, p: egui::Pos2) -> Option<u32> {
        self.blocks.iter().rev().find(|b| b.contains(p)).map(|b| b.id)
    }

    /// Handle under `p` when it lies within `tolerance` of one or two sides.
    ///
    /// On an axis where the block is too thin to leave a draggable interior,
    /// that axis' edges are only reachable from outside the block.
    pub fn handle_at(&self, id: u32, p: egui::Pos2, tolerance: f32) -> Option<ResizeHandle> {
        let rect = self.get(id)?.rect();
        if !rect.expand(tolerance).contains(p) {
            return None;
        }
        let inner = rect.shrink(tolerance);
        let x_edges = !(inner.width() < tolerance && (rect.left()..=rect.right()).contains(&p.x));
        let y_edges = !(inner.height() < tolerance && (rect.top()..=rect.bottom()).contains(&p.y));
        let dl = (p.x - rect.left()).abs();
        let dr = (p.x - rect.right()).abs();
        let dt = (p.y - rect.top()).abs();
        let db = (p.y - rect.bottom()).abs();
        let left = x_edges && dl <= tolerance && dl <= dr;
        let right = x_edges && dr <= tolerance && dr < dl;
        let top = y_edges && dt <= tolerance && dt <= db;
        let bottom = y_edges && db <= tolerance && db < dt;
        ResizeHandle::from_sides(left, right, top, bottom)
    }

    /// Moves the edge(s) named by `handle` to `pointer`. An update that
    /// would leave either side below the minimum is dropped whole.
    pub fn resize(&mut self, id: u32, handle: ResizeHandle, pointer: egui::Pos2) -> bool {
        let min_size = self.min_size;
        let Some(block) = self.blocks.iter_mut().find(|b| b.id == id) else {
            return false;
        };
        let rect = block.rect();
        let (mut min, mut max) = (rect.min, rect.max);
        match handle {
            ResizeHandle::NW => {
                min.x = pointer.x;
                min.y = pointer.y;
            }
            ResizeHandle::N => min.y = pointer.y,
            ResizeHandle::NE => {
                max.x = pointer.x;
                min.y = pointer.y;
            }
            ResizeHandle::W => min.x = pointer.x,
            ResizeHandle::E => max.x = pointer.x,
            ResizeHandle::SW => {
                min.x = pointer.x;
                max.y = pointer.y;
            }
            ResizeHandle::S => max.y = pointer.y,
            ResizeHandle::SE => {
                max.x = pointer.x;
                max.y = pointer.y;
            }
        }
        if max.x - min.x < min_size || max.y - min.y < min_size {
            return false;
        }
        *block = Block::from_rect(id, egui::Rect::from_min_max(min, max));
        true
    }

    pub fn drag(&mut self, id: u32, top_left: egui::Pos2) -> bool {
        let Some(block) = self.blocks.iter_mut().find(|b| b.id == id) else {
            return false;
        };
        block.x = top_left.x;
        block.y = top_left.y;
        true
    }

    pub fn remove(&mut self, id: u32) -> Option<Block> {
        let idx = self.blocks.iter().position(|b| b.id == id)?;
        Some(self.blocks.remove(idx))
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    pub fn remap(&mut self, mut f: impl FnMut(egui::Rect) -> egui::Rect) {
        for block in &mut self.blocks {
            *block = Block::from_rect(block.id, f(block.rect()));
        }
    }
}
