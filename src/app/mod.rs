use std::sync::Arc;

use eframe::egui;
use tracing::warn;

use crate::collab::{ImageUploader, JsonFileStore, LocalUploader, TestStore};
use crate::editor::EditorState;
use crate::playback::PlaybackDiagram;

mod actions;
mod help;
mod image_load;
mod render;
mod settings;
mod update;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ViewMode {
    Author,
    Playback,
}

pub struct EditorApp {
    editor: EditorState,
    view_mode: ViewMode,
    playback: Option<PlaybackDiagram>,
    background: Option<egui::TextureHandle>,
    pending_image: Option<image_load::PendingImage>,
    uploader: Arc<dyn ImageUploader + Send + Sync>,
    store: Box<dyn TestStore>,
    current_test: Option<u64>,
    saved_tests: Vec<u64>,
    settings: settings::AppSettings,
    settings_path: String,
    status: Option<String>,
    status_until: f64,
    focus_word: Option<u32>,
    word_undo: Option<u32>,
    show_help: bool,
}

impl EditorApp {
    fn config_path() -> Option<String> {
        if let Some(home) = std::env::var_os("HOME") {
            let path = std::path::PathBuf::from(home).join(".config").join("matchdraw.toml");
            if path.exists() {
                return Some(path.display().to_string());
            }
        }
        if std::path::Path::new("settings.toml").exists() {
            return Some("settings.toml".to_string());
        }
        None
    }

    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let settings_path = Self::config_path().unwrap_or_else(|| "settings.toml".to_string());
        let settings = settings::load_settings(&settings_path)
            .or_else(|| settings::load_settings("settings.json"))
            .unwrap_or_default();

        let store = JsonFileStore::new(&settings.store_dir);
        let saved_tests = store.list().unwrap_or_else(|err| {
            warn!(%err, dir = %settings.store_dir, "could not list saved tests");
            Vec::new()
        });

        Self {
            editor: EditorState::new(settings.editor, settings.arrow_style),
            view_mode: ViewMode::Author,
            playback: None,
            background: None,
            pending_image: None,
            uploader: Arc::new(LocalUploader::new(&settings.assets_dir)),
            store: Box::new(store),
            current_test: None,
            saved_tests,
            settings,
            settings_path,
            status: None,
            status_until: 0.0,
            focus_word: None,
            word_undo: None,
            show_help: false,
        }
    }

    /// Shows `text` in the status bar for the configured toast duration.
    fn toast(&mut self, ctx: &egui::Context, text: impl Into<String>) {
        let now = ctx.input(|i| i.time);
        self.status = Some(text.into());
        self.status_until = now + self.settings.toast_seconds;
        ctx.request_repaint_after(std::time::Duration::from_secs_f64(self.settings.toast_seconds));
    }

    fn expire_toast(&mut self, ctx: &egui::Context) {
        if self.status.is_some() && ctx.input(|i| i.time) >= self.status_until {
            self.status = None;
        }
    }
}
