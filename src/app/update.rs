use eframe::egui;
use tracing::warn;

use super::render::{draw_background, draw_handles, draw_image, draw_interaction, draw_shapes};
use super::{EditorApp, ViewMode};
use crate::editor::{Affordance, Mode, PointerFrame, Selection};

impl eframe::App for EditorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_image(ctx);
        self.expire_toast(ctx);
        self.handle_keys(ctx);

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Image... (⌘O)").clicked() {
                        self.open_image_dialog(ctx);
                        ui.close();
                    }
                    ui.menu_button("Open Test", |ui| {
                        if self.saved_tests.is_empty() {
                            ui.label("No saved tests");
                        }
                        let ids = self.saved_tests.clone();
                        for id in ids {
                            if ui.button(format!("Test #{id}")).clicked() {
                                self.open_test(ctx, id);
                                ui.close();
                            }
                        }
                        ui.separator();
                        if ui.button("Refresh").clicked() {
                            self.refresh_tests();
                        }
                    });
                    ui.separator();
                    if ui.button("Save Test (⌘S)").clicked() {
                        self.save_test(ctx, false);
                        ui.close();
                    }
                    if ui.button("Save as New Test (⌘⇧S)").clicked() {
                        self.save_test(ctx, true);
                        ui.close();
                    }
                });
                ui.menu_button("Edit", |ui| {
                    if ui.add_enabled(self.editor.can_undo(), egui::Button::new("Undo (⌘Z)")).clicked() {
                        self.undo();
                        ui.close();
                    }
                    if ui.add_enabled(self.editor.can_redo(), egui::Button::new("Redo (⌘⇧Z)")).clicked() {
                        self.redo();
                        ui.close();
                    }
                    ui.separator();
                    let has_selection = self.editor.selection().is_some();
                    if ui.add_enabled(has_selection, egui::Button::new("Delete (Del)")).clicked() {
                        self.delete_selected(ctx);
                        ui.close();
                    }
                    if ui.add_enabled(has_selection, egui::Button::new("Deselect (Esc)")).clicked() {
                        self.editor.cancel();
                        ui.close();
                    }
                });
                ui.menu_button("Mode", |ui| {
                    for mode in Mode::ALL {
                        if ui.selectable_label(self.editor.mode() == mode, mode_label(mode)).clicked() {
                            self.editor.set_mode(mode);
                            ui.close();
                        }
                    }
                });
                ui.menu_button("View", |ui| {
                    if ui.selectable_label(self.view_mode == ViewMode::Author, "Author").clicked() {
                        self.view_mode = ViewMode::Author;
                        ui.close();
                    }
                    if ui.selectable_label(self.view_mode == ViewMode::Playback, "Playback").clicked() {
                        self.enter_playback(ctx);
                        ui.close();
                    }
                });
                if ui.button("Help (F1)").clicked() {
                    self.show_help = true;
                }
            });
        });

        egui::SidePanel::right("right_panel")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| match self.view_mode {
                    ViewMode::Author => self.author_panel(ui, ctx),
                    ViewMode::Playback => self.playback_panel(ui),
                });
            });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(status) = &self.status {
                    ui.label(status);
                } else if let Some(pending) = &self.pending_image {
                    ui.label(format!("Loading {}...", pending.label));
                } else {
                    ui.label("Ready");
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(format!("Scale: {:.0}%", self.editor.transform().scale * 100.0));
                    ui.separator();
                    ui.label(format!("Arrows: {}", self.editor.arrows().len()));
                    ui.separator();
                    ui.label(format!("Blocks: {}", self.editor.blocks().len()));
                    ui.separator();
                    ui.label(format!("Mode: {}", self.editor.mode().label()));
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let (rect, response) =
                ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
            let origin = rect.min;
            let painter = ui.painter_at(rect);
            draw_background(&painter, rect);

            match self.view_mode {
                ViewMode::Author => {
                    self.editor.set_viewport(rect.size());
                    self.canvas_input(ctx, rect, response.hovered());
                    self.draw_author(&painter, origin);
                }
                ViewMode::Playback => {
                    if let Some(diagram) = &mut self.playback {
                        diagram.relayout(rect.size());
                        draw_image(
                            &painter,
                            origin,
                            diagram.transform().display_rect(),
                            self.background.as_ref(),
                            &diagram.image().url,
                        );
                        draw_shapes(&painter, origin, diagram.shapes(), None, false);
                    }
                }
            }
        });

        super::help::draw_help_window(ctx, &mut self.show_help);
    }
}

#[derive(Default)]
struct Keys {
    help: bool,
    save: bool,
    save_new: bool,
    open: bool,
    undo: bool,
    redo: bool,
    cancel: bool,
    delete: bool,
    mode: Option<Mode>,
}

fn mode_label(mode: Mode) -> &'static str {
    match mode {
        Mode::Create => "Create (C)",
        Mode::Edit => "Edit (E)",
        Mode::Arrow => "Arrow (A)",
    }
}

impl EditorApp {
    fn handle_keys(&mut self, ctx: &egui::Context) {
        let authoring = !ctx.wants_keyboard_input() && self.view_mode == ViewMode::Author;
        let mut keys = Keys::default();
        ctx.input_mut(|i| {
            keys.help = i.consume_key(egui::Modifiers::NONE, egui::Key::F1);
            keys.save_new = i.consume_key(egui::Modifiers::COMMAND | egui::Modifiers::SHIFT, egui::Key::S);
            keys.save = i.consume_key(egui::Modifiers::COMMAND, egui::Key::S);
            keys.open = i.consume_key(egui::Modifiers::COMMAND, egui::Key::O);
            if !authoring {
                return;
            }
            keys.redo = i.consume_key(egui::Modifiers::COMMAND | egui::Modifiers::SHIFT, egui::Key::Z)
                || i.consume_key(egui::Modifiers::COMMAND, egui::Key::Y);
            keys.undo = !keys.redo && i.consume_key(egui::Modifiers::COMMAND, egui::Key::Z);
            keys.cancel = i.consume_key(egui::Modifiers::NONE, egui::Key::Escape);
            keys.delete = i.consume_key(egui::Modifiers::NONE, egui::Key::Delete)
                || i.consume_key(egui::Modifiers::NONE, egui::Key::Backspace);
            keys.mode = if i.consume_key(egui::Modifiers::NONE, egui::Key::C) {
                Some(Mode::Create)
            } else if i.consume_key(egui::Modifiers::NONE, egui::Key::E) {
                Some(Mode::Edit)
            } else if i.consume_key(egui::Modifiers::NONE, egui::Key::A) {
                Some(Mode::Arrow)
            } else {
                None
            };
        });

        if keys.help {
            self.show_help = true;
        }
        if keys.save_new {
            self.save_test(ctx, true);
        } else if keys.save {
            self.save_test(ctx, false);
        }
        if keys.open {
            self.open_image_dialog(ctx);
        }
        if keys.redo {
            self.redo();
        }
        if keys.undo {
            self.undo();
        }
        if keys.cancel {
            self.editor.cancel();
        }
        if keys.delete {
            self.delete_selected(ctx);
        }
        if let Some(mode) = keys.mode {
            self.editor.set_mode(mode);
        }
    }

    /// Turns raw pointer state into editor events in canvas-local space.
    fn canvas_input(&mut self, ctx: &egui::Context, rect: egui::Rect, over_canvas: bool) {
        let (pressed, released, pos) = ctx.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.latest_pos(),
            )
        });
        let outcomes = self.editor.handle_frame(PointerFrame {
            pressed: pressed && over_canvas,
            released,
            pos: pos.map(|p| p - rect.min.to_vec2()),
            inside: pos.is_some_and(|p| rect.contains(p)),
        });
        for outcome in outcomes {
            self.handle_outcome(ctx, outcome);
        }
    }

    fn draw_author(&self, painter: &egui::Painter, origin: egui::Pos2) {
        let placeholder = if self.pending_image.is_some() {
            "Loading image..."
        } else if self.editor.has_image() {
            "Image file unavailable"
        } else {
            "Open a background image (⌘O)"
        };
        draw_image(
            painter,
            origin,
            self.editor.transform().display_rect(),
            self.background.as_ref(),
            placeholder,
        );
        draw_shapes(painter, origin, self.editor.shapes(), self.editor.selection(), true);
        if let Some(block) = self.editor.selected_block() {
            draw_handles(painter, origin, block);
        }
        draw_interaction(painter, origin, &self.editor);
    }

    fn author_panel(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.heading("Mode");
        ui.horizontal(|ui| {
            for mode in Mode::ALL {
                if ui.selectable_label(self.editor.mode() == mode, mode.label()).clicked() {
                    self.editor.set_mode(mode);
                }
            }
        });

        ui.separator();
        match self.editor.affordance() {
            Some(affordance @ Affordance::DeleteBlock(id)) => {
                if ui.button(format!("Delete block #{id}")).clicked() {
                    self.apply_affordance(ctx, affordance);
                }
            }
            Some(affordance @ Affordance::DeleteArrow(id)) => {
                if ui.button(format!("Delete arrow #{id}")).clicked() {
                    self.apply_affordance(ctx, affordance);
                }
            }
            None => {
                ui.weak("Nothing selected");
            }
        }

        ui.separator();
        ui.heading("Words");
        let missing = self.editor.words().missing();
        let mut ids: Vec<u32> = self.editor.blocks().blocks().iter().map(|b| b.id).collect();
        ids.sort_unstable();
        if ids.is_empty() {
            ui.weak("Click the image to add a block.");
        }
        for id in ids {
            ui.horizontal(|ui| {
                let selected = self.editor.selection() == Some(Selection::Block(id));
                if ui.selectable_label(selected, format!("#{id}")).clicked() {
                    if let Err(err) = self.editor.select(Selection::Block(id)) {
                        warn!(%err, block_id = id, "could not select block from word list");
                    }
                }
                let Some(word) = self.editor.words().get(id) else {
                    return;
                };
                let mut text = word.to_string();
                let response = ui.text_edit_singleline(&mut text);
                if self.focus_word == Some(id) {
                    response.request_focus();
                    self.focus_word = None;
                }
                if response.changed() {
                    // One undo step per editing session of a word.
                    if self.word_undo != Some(id) {
                        self.editor.push_undo();
                        self.word_undo = Some(id);
                    }
                    if let Err(err) = self.editor.set_word(id, text) {
                        warn!(%err, block_id = id, "word edit dropped");
                    }
                }
                if response.lost_focus() && self.word_undo == Some(id) {
                    self.word_undo = None;
                }
                if missing.contains(&id) {
                    ui.colored_label(ui.visuals().warn_fg_color, "!");
                }
            });
        }
        if !missing.is_empty() {
            ui.colored_label(
                ui.visuals().warn_fg_color,
                format!("{} block(s) still need a word", missing.len()),
            );
        }

        ui.separator();
        ui.heading("Arrow");
        let mut changed = false;
        let style = &mut self.editor.arrow_style;
        let mut color = [style.color.r, style.color.g, style.color.b, style.color.a];
        ui.horizontal(|ui| {
            ui.label("Color");
            if ui.color_edit_button_srgba_unmultiplied(&mut color).changed() {
                changed = true;
            }
        });
        style.color = crate::model::Rgba {
            r: color[0],
            g: color[1],
            b: color[2],
            a: color[3],
        };
        changed |= ui
            .add(egui::Slider::new(&mut style.stroke_width, 1.0..=10.0).text("Width"))
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut style.pointer_length, 4.0..=30.0).text("Head length"))
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut style.pointer_width, 4.0..=30.0).text("Head width"))
            .changed();

        ui.separator();
        ui.heading("Snapping");
        changed |= ui
            .add(egui::Slider::new(&mut self.editor.config.snap_radius, 10.0..=200.0).text("Snap radius"))
            .changed();
        if changed {
            self.persist_settings(ctx);
        }

        ui.separator();
        match self.current_test {
            Some(id) => ui.label(format!("Editing test #{id}")),
            None => ui.weak("Unsaved test"),
        };
    }

    fn playback_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Word bank");
        let Some(diagram) = &self.playback else {
            ui.weak("Nothing to play back.");
            return;
        };
        for word in diagram.word_bank() {
            ui.label(word);
        }
        ui.separator();
        ui.weak(format!("{} blocks to match", diagram.block_count()));
        if ui.button("Back to authoring").clicked() {
            self.view_mode = ViewMode::Author;
        }
    }
}
