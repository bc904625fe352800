use eframe::egui;
use tracing::{debug, warn};

use super::EditorState;
use super::blocks::ResizeHandle;
use crate::error::{EditorError, PlacementError};
use crate::model::Block;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Create,
    Edit,
    Arrow,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Create, Mode::Edit, Mode::Arrow];

    pub fn label(self) -> &'static str {
        match self {
            Mode::Create => "Create",
            Mode::Edit => "Edit",
            Mode::Arrow => "Arrow",
        }
    }

    pub fn handlers(self) -> &'static ModeHandlers {
        match self {
            Mode::Create => &CREATE,
            Mode::Edit => &EDIT,
            Mode::Arrow => &ARROW,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection {
    Block(u32),
    Arrow(u32),
}

/// Contextual delete action offered for the current selection. At most one
/// is ever available.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Affordance {
    DeleteBlock(u32),
    DeleteArrow(u32),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Down(egui::Pos2),
    Move(egui::Pos2),
    /// `None` when the pointer was released outside the canvas.
    Up(Option<egui::Pos2>),
}

/// Primary-button state sampled once per frame, in display space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerFrame {
    /// Pressed this frame while over the canvas.
    pub pressed: bool,
    pub released: bool,
    pub pos: Option<egui::Pos2>,
    /// Whether `pos` lies inside the canvas.
    pub inside: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Interaction {
    #[default]
    Idle,
    Previewing {
        start: egui::Pos2,
        current: egui::Pos2,
    },
    Dragging {
        id: u32,
        grab: egui::Vec2,
        recorded: bool,
    },
    Resizing {
        id: u32,
        handle: ResizeHandle,
        recorded: bool,
    },
    DrawingPreview {
        start: egui::Pos2,
        current: egui::Pos2,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Ignored,
    Changed,
    BlockCreated(u32),
    ArrowCreated(u32),
    Rejected(PlacementError),
    Abandoned,
}

type DownFn = fn(&mut EditorState, egui::Pos2) -> Outcome;
type MoveFn = fn(&mut EditorState, egui::Pos2) -> Outcome;
type UpFn = fn(&mut EditorState, Option<egui::Pos2>) -> Outcome;

pub struct ModeHandlers {
    pub down: DownFn,
    pub moved: MoveFn,
    pub up: UpFn,
}

static CREATE: ModeHandlers = ModeHandlers {
    down: create_down,
    moved: track_pointer,
    up: finish,
};

static EDIT: ModeHandlers = ModeHandlers {
    down: edit_down,
    moved: track_pointer,
    up: finish,
};

static ARROW: ModeHandlers = ModeHandlers {
    down: arrow_down,
    moved: track_pointer,
    up: finish,
};

impl EditorState {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            debug!(mode = mode.label(), "mode changed");
            self.interaction = Interaction::Idle;
            self.mode = mode;
        }
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn interaction(&self) -> Interaction {
        self.interaction
    }

    pub fn select(&mut self, selection: Selection) -> Result<(), EditorError> {
        match selection {
            Selection::Block(id) if !self.blocks.contains(id) => {
                return Err(EditorError::UnknownBlock(id));
            }
            Selection::Arrow(id) if self.arrows.get(id).is_none() => {
                return Err(EditorError::UnknownArrow(id));
            }
            _ => {}
        }
        self.selection = Some(selection);
        Ok(())
    }

    pub fn deselect(&mut self) {
        self.selection = None;
    }

    pub fn selected_block(&self) -> Option<&Block> {
        match self.selection? {
            Selection::Block(id) => self.blocks.get(id),
            Selection::Arrow(_) => None,
        }
    }

    pub fn affordance(&self) -> Option<Affordance> {
        match self.selection? {
            Selection::Block(id) => Some(Affordance::DeleteBlock(id)),
            Selection::Arrow(id) => Some(Affordance::DeleteArrow(id)),
        }
    }

    pub fn apply_affordance(&mut self, affordance: Affordance) -> Result<(), EditorError> {
        let before = self.snapshot();
        match affordance {
            Affordance::DeleteBlock(id) => self.delete_block(id).map(|_| ())?,
            Affordance::DeleteArrow(id) => self.delete_arrow(id)?,
        }
        self.history.record(before);
        Ok(())
    }

    /// Deletes whatever is selected. Returns false when nothing was.
    pub fn delete_selected(&mut self) -> Result<bool, EditorError> {
        let Some(affordance) = self.affordance() else {
            return Ok(false);
        };
        self.apply_affordance(affordance)?;
        Ok(true)
    }

    /// Drops the active interaction and the selection.
    pub fn cancel(&mut self) {
        self.interaction = Interaction::Idle;
        self.selection = None;
    }

    /// Block the in-progress arrow would attach to if released now.
    pub fn snap_candidate(&self) -> Option<&Block> {
        match self.interaction {
            Interaction::DrawingPreview { start, .. } => {
                super::arrows::snap_to_nearest_block(self.blocks.blocks(), start, self.config.snap_radius)
            }
            _ => None,
        }
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) -> Outcome {
        let handlers = self.mode.handlers();
        match event {
            PointerEvent::Down(p) => (handlers.down)(self, p),
            PointerEvent::Move(p) => (handlers.moved)(self, p),
            PointerEvent::Up(p) => (handlers.up)(self, p),
        }
    }

    /// Feeds one frame of pointer state through the mode handlers. A press
    /// and release in the same frame produce both a `Down` and an `Up`.
    pub fn handle_frame(&mut self, frame: PointerFrame) -> Vec<Outcome> {
        let mut outcomes = Vec::new();
        if frame.pressed
            && let Some(p) = frame.pos
        {
            outcomes.push(self.handle_pointer(PointerEvent::Down(p)));
        } else if !frame.released
            && self.interaction != Interaction::Idle
            && let Some(p) = frame.pos
        {
            outcomes.push(self.handle_pointer(PointerEvent::Move(p)));
        }
        if frame.released && self.interaction != Interaction::Idle {
            let at = frame.pos.filter(|_| frame.inside);
            outcomes.push(self.handle_pointer(PointerEvent::Up(at)));
        }
        outcomes
    }
}

/// Press on something that already exists: a handle of the selected block,
/// a block, or an arrow.
fn grab_existing(state: &mut EditorState, p: egui::Pos2) -> Option<Outcome> {
    if let Some(Selection::Block(id)) = state.selection
        && let Some(handle) = state.blocks.handle_at(id, p, state.config.edge_tolerance)
    {
        state.interaction = Interaction::Resizing {
            id,
            handle,
            recorded: false,
        };
        return Some(Outcome::Changed);
    }
    if let Some(id) = state.blocks.hit_test(p) {
        let top_left = state.blocks.get(id)?.rect().min;
        state.selection = Some(Selection::Block(id));
        state.interaction = Interaction::Dragging {
            id,
            grab: p - top_left,
            recorded: false,
        };
        return Some(Outcome::Changed);
    }
    if let Some(id) = state.arrows.hit_test(p, state.config.hit_tolerance) {
        state.selection = Some(Selection::Arrow(id));
        state.interaction = Interaction::Idle;
        return Some(Outcome::Changed);
    }
    None
}

fn create_down(state: &mut EditorState, p: egui::Pos2) -> Outcome {
    if let Some(outcome) = grab_existing(state, p) {
        return outcome;
    }
    if !state.has_image() {
        return Outcome::Rejected(PlacementError::NoImage);
    }
    state.deselect();
    state.interaction = Interaction::Previewing { start: p, current: p };
    Outcome::Changed
}

fn edit_down(state: &mut EditorState, p: egui::Pos2) -> Outcome {
    if let Some(outcome) = grab_existing(state, p) {
        return outcome;
    }
    state.interaction = Interaction::Idle;
    match state.selection.take() {
        Some(_) => Outcome::Changed,
        None => Outcome::Ignored,
    }
}

fn arrow_down(state: &mut EditorState, p: egui::Pos2) -> Outcome {
    // A press close enough to anchor always draws, even on top of a block.
    let anchorable = state.has_image()
        && super::arrows::snap_to_nearest_block(state.blocks.blocks(), p, state.config.snap_radius).is_some();
    if anchorable {
        state.deselect();
        state.interaction = Interaction::DrawingPreview { start: p, current: p };
        return Outcome::Changed;
    }
    if let Some(id) = state.blocks.hit_test(p) {
        state.selection = Some(Selection::Block(id));
        state.interaction = Interaction::Idle;
        return Outcome::Changed;
    }
    if let Some(id) = state.arrows.hit_test(p, state.config.hit_tolerance) {
        state.selection = Some(Selection::Arrow(id));
        state.interaction = Interaction::Idle;
        return Outcome::Changed;
    }
    if !state.has_image() {
        return Outcome::Rejected(PlacementError::NoImage);
    }
    state.deselect();
    state.interaction = Interaction::DrawingPreview { start: p, current: p };
    Outcome::Changed
}

fn track_pointer(state: &mut EditorState, p: egui::Pos2) -> Outcome {
    match state.interaction {
        Interaction::Idle => Outcome::Ignored,
        Interaction::Previewing { start, .. } => {
            state.interaction = Interaction::Previewing { start, current: p };
            Outcome::Changed
        }
        Interaction::DrawingPreview { start, .. } => {
            state.interaction = Interaction::DrawingPreview { start, current: p };
            Outcome::Changed
        }
        Interaction::Dragging { id, grab, recorded } => {
            let before = (!recorded).then(|| state.snapshot());
            if !state.blocks.drag(id, p - grab) {
                state.interaction = Interaction::Idle;
                return Outcome::Ignored;
            }
            if let Some(before) = before {
                state.history.record(before);
            }
            state.arrows.follow_blocks(state.blocks.blocks());
            state.interaction = Interaction::Dragging {
                id,
                grab,
                recorded: true,
            };
            Outcome::Changed
        }
        Interaction::Resizing {
            id,
            handle,
            recorded,
        } => {
            let before = (!recorded).then(|| state.snapshot());
            if !state.blocks.resize(id, handle, p) {
                return Outcome::Ignored;
            }
            if let Some(before) = before {
                state.history.record(before);
            }
            state.arrows.follow_blocks(state.blocks.blocks());
            state.interaction = Interaction::Resizing {
                id,
                handle,
                recorded: true,
            };
            Outcome::Changed
        }
    }
}

fn finish(state: &mut EditorState, released: Option<egui::Pos2>) -> Outcome {
    match std::mem::take(&mut state.interaction) {
        Interaction::Idle => Outcome::Ignored,
        Interaction::Previewing { start, .. } => {
            let Some(end) = released else {
                debug!("block preview abandoned");
                return Outcome::Abandoned;
            };
            state.push_undo();
            let id = if start.distance(end) <= state.config.click_threshold {
                let size = state.config.default_block_size();
                state.create_block(start, size)
            } else {
                state.insert_block_rect(egui::Rect::from_two_pos(start, end))
            };
            state.selection = Some(Selection::Block(id));
            Outcome::BlockCreated(id)
        }
        Interaction::DrawingPreview { start, .. } => {
            let Some(end) = released else {
                debug!("arrow preview abandoned");
                return Outcome::Abandoned;
            };
            let before = state.snapshot();
            let style = state.arrow_style;
            match state.arrows.create(
                state.blocks.blocks(),
                start,
                end,
                state.config.snap_radius,
                state.config.hit_tolerance,
                style,
            ) {
                Ok(id) => {
                    state.history.record(before);
                    state.selection = Some(Selection::Arrow(id));
                    Outcome::ArrowCreated(id)
                }
                Err(err) => {
                    warn!(%err, x = start.x, y = start.y, "arrow rejected");
                    Outcome::Rejected(err)
                }
            }
        }
        Interaction::Dragging { recorded, .. } | Interaction::Resizing { recorded, .. } => {
            if recorded {
                Outcome::Changed
            } else {
                Outcome::Ignored
            }
        }
    }
}
