use eframe::egui;
use tracing::{info, warn};

use super::image_load::{ImageJob, PendingImage};
use super::{EditorApp, ViewMode, settings};
use crate::editor::{Affordance, Outcome};
use crate::model::ImageInfo;
use crate::playback::PlaybackDiagram;

impl EditorApp {
    pub(super) fn open_image_dialog(&mut self, ctx: &egui::Context) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg"])
            .pick_file()
        {
            info!(path = %path.display(), "loading background image");
            self.pending_image = Some(PendingImage::spawn(
                ImageJob::Upload(path),
                self.uploader.clone(),
                ctx.clone(),
            ));
        }
    }

    fn load_background(&mut self, ctx: &egui::Context, info: ImageInfo) {
        self.background = None;
        self.pending_image = Some(PendingImage::spawn(
            ImageJob::Display(info),
            self.uploader.clone(),
            ctx.clone(),
        ));
    }

    pub(super) fn poll_image(&mut self, ctx: &egui::Context) {
        let Some(pending) = &self.pending_image else {
            return;
        };
        let Some(result) = pending.poll() else {
            return;
        };
        let label = pending.label.clone();
        self.pending_image = None;
        match result {
            Ok(loaded) => {
                if loaded.uploaded {
                    if let Err(err) = self.editor.set_image(loaded.info.clone()) {
                        warn!(%err, "image rejected");
                        self.toast(ctx, format!("Image rejected: {err}"));
                        return;
                    }
                    self.playback = None;
                    self.toast(ctx, format!("Loaded {}", loaded.info.url));
                }
                self.background = Some(ctx.load_texture(
                    "background",
                    loaded.pixels,
                    egui::TextureOptions::LINEAR,
                ));
            }
            Err(err) => {
                warn!(error = %format!("{err:#}"), image = %label, "image load failed");
                self.toast(ctx, format!("Could not load {label}: {err:#}"));
            }
        }
    }

    pub(super) fn save_test(&mut self, ctx: &egui::Context, as_new: bool) {
        let payload = match self.editor.payload() {
            Ok(p) => p,
            Err(err) => {
                self.toast(ctx, format!("Cannot save: {err}"));
                return;
            }
        };
        let target = if as_new { None } else { self.current_test };
        match self.store.save(&payload, target) {
            Ok(response) => {
                self.current_test = Some(response.test_id);
                self.refresh_tests();
                self.toast(ctx, format!("Saved test #{}", response.test_id));
            }
            Err(err) => {
                warn!(%err, "save failed");
                self.toast(ctx, format!("Save failed: {err}"));
            }
        }
    }

    pub(super) fn open_test(&mut self, ctx: &egui::Context, test_id: u64) {
        let payload = match self.store.load(test_id) {
            Ok(p) => p,
            Err(err) => {
                warn!(%err, test_id, "open failed");
                self.toast(ctx, format!("Could not open test #{test_id}: {err}"));
                return;
            }
        };
        match self.editor.load_payload(&payload) {
            Ok(stats) => {
                self.current_test = Some(test_id);
                self.view_mode = ViewMode::Author;
                self.playback = None;
                if let Some(image) = self.editor.image().cloned() {
                    self.load_background(ctx, image);
                }
                if stats.skipped.is_empty() && stats.pruned == 0 {
                    self.toast(ctx, format!("Opened test #{test_id}"));
                } else {
                    self.toast(
                        ctx,
                        format!(
                            "Opened test #{test_id}; dropped {} question(s) and {} arrow(s)",
                            stats.skipped.len(),
                            stats.pruned
                        ),
                    );
                }
            }
            Err(err) => {
                warn!(%err, test_id, "import failed");
                self.toast(ctx, format!("Could not open test #{test_id}: {err}"));
            }
        }
    }

    pub(super) fn refresh_tests(&mut self) {
        match self.store.list() {
            Ok(ids) => self.saved_tests = ids,
            Err(err) => warn!(%err, "could not list saved tests"),
        }
    }

    pub(super) fn enter_playback(&mut self, ctx: &egui::Context) {
        let payload = match self.editor.payload() {
            Ok(p) => p,
            Err(err) => {
                self.toast(ctx, format!("Nothing to play back: {err}"));
                return;
            }
        };
        match PlaybackDiagram::new(payload, self.editor.viewport(), self.editor.config.padding) {
            Ok(diagram) => {
                self.playback = Some(diagram);
                self.view_mode = ViewMode::Playback;
            }
            Err(err) => self.toast(ctx, format!("Playback unavailable: {err}")),
        }
    }

    pub(super) fn undo(&mut self) {
        if self.editor.undo() {
            self.focus_word = None;
        }
    }

    pub(super) fn redo(&mut self) {
        if self.editor.redo() {
            self.focus_word = None;
        }
    }

    pub(super) fn apply_affordance(&mut self, ctx: &egui::Context, affordance: Affordance) {
        if let Err(err) = self.editor.apply_affordance(affordance) {
            self.toast(ctx, err.to_string());
        }
    }

    pub(super) fn delete_selected(&mut self, ctx: &egui::Context) {
        if let Err(err) = self.editor.delete_selected() {
            self.toast(ctx, err.to_string());
        }
    }

    pub(super) fn handle_outcome(&mut self, ctx: &egui::Context, outcome: Outcome) {
        match outcome {
            Outcome::BlockCreated(id) => self.focus_word = Some(id),
            Outcome::ArrowCreated(id) => self.toast(ctx, format!("Arrow #{id} attached")),
            Outcome::Rejected(err) => self.toast(ctx, err.to_string()),
            Outcome::Ignored | Outcome::Changed | Outcome::Abandoned => {}
        }
    }

    pub(super) fn persist_settings(&mut self, ctx: &egui::Context) {
        self.settings.editor = self.editor.config;
        self.settings.arrow_style = self.editor.arrow_style;
        if let Err(err) = settings::save_settings(&self.settings_path, &self.settings) {
            warn!(error = %err, path = %self.settings_path, "could not save settings");
            self.toast(ctx, format!("Could not save settings: {err}"));
        }
    }
}
