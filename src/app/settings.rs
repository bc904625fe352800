use crate::editor::EditorConfig;
use crate::model;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub(super) struct AppSettings {
    /// Where saved tests live.
    pub store_dir: String,
    /// Where uploaded background images are copied.
    pub assets_dir: String,
    pub toast_seconds: f64,
    pub editor: EditorConfig,
    pub arrow_style: model::ArrowStyle,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            store_dir: "tests".to_string(),
            assets_dir: "assets".to_string(),
            toast_seconds: 4.0,
            editor: EditorConfig::default(),
            arrow_style: model::ArrowStyle::default(),
        }
    }
}

pub(super) fn load_settings(path: &str) -> Option<AppSettings> {
    let s = std::fs::read_to_string(path).ok()?;
    if path.ends_with(".toml") {
        toml::from_str::<AppSettings>(&s)
            .ok()
            .or_else(|| serde_json::from_str::<AppSettings>(&s).ok())
    } else {
        serde_json::from_str::<AppSettings>(&s)
            .ok()
            .or_else(|| toml::from_str::<AppSettings>(&s).ok())
    }
}

pub(super) fn save_settings(path: &str, settings: &AppSettings) -> anyhow::Result<()> {
    let text = if path.ends_with(".toml") {
        toml::to_string_pretty(settings)?
    } else {
        serde_json::to_string_pretty(settings)?
    };
    std::fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matchdraw.toml");
        std::fs::write(&path, "store_dir = \"saved\"\n\n[editor]\nsnap_radius = 80.0\n").unwrap();
        let settings = load_settings(path.to_str().unwrap()).unwrap();
        assert_eq!(settings.store_dir, "saved");
        assert_eq!(settings.editor.snap_radius, 80.0);
        assert_eq!(settings.editor.min_block_size, 20.0);
        assert_eq!(settings.arrow_style, model::ArrowStyle::default());
    }

    #[test]
    fn save_then_load_in_both_formats() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = AppSettings::default();
        settings.editor.padding = 10.0;
        settings.arrow_style.stroke_width = 5.0;
        for name in ["settings.toml", "settings.json"] {
            let path = dir.path().join(name);
            let path = path.to_str().unwrap();
            save_settings(path, &settings).unwrap();
            assert_eq!(load_settings(path), Some(settings.clone()));
        }
    }

    #[test]
    fn missing_file_yields_none() {
        assert!(load_settings("/definitely/not/here.toml").is_none());
    }
}
