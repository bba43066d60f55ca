use std::{collections::HashMap, fs};

#[derive(Debug, Clone)]
pub struct Settings {
    pub backend_url: String,
    pub download_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000".into(),
            download_dir: "./downloads".into(),
        }
    }
}

fn apply_file_overrides(settings: &mut Settings, file_cfg: &HashMap<String, String>) {
    if let Some(v) = file_cfg.get("backend_url") {
        settings.backend_url = v.clone();
    }
    if let Some(v) = file_cfg.get("download_dir") {
        settings.download_dir = v.clone();
    }
}

/// Layered load: defaults, then `pitchpilot.toml` in the working directory,
/// then environment variables.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("pitchpilot.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            apply_file_overrides(&mut settings, &file_cfg);
        }
    }

    if let Ok(v) = std::env::var("PITCHPILOT_BACKEND_URL") {
        settings.backend_url = v;
    }
    if let Ok(v) = std::env::var("PITCHPILOT_DOWNLOAD_DIR") {
        settings.download_dir = v;
    }

    settings
}
