use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Where snapshots and recorded PNG sequences are written.
    pub capture_dir: PathBuf,
    /// Persist only every Nth grabbed frame while recording.
    pub record_every_nth: usize,
    /// Last URI entered in the open box, restored on startup.
    #[serde(default)]
    pub last_input: Option<String>,
}

fn default_capture_dir() -> PathBuf {
    dirs::picture_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Framescope")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            capture_dir: default_capture_dir(),
            record_every_nth: 1,
            last_input: None,
        }
    }
}

impl Settings {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("Framescope").join("settings.json"))
    }

    pub fn load() -> Self {
        Self::config_path()
            .and_then(|path| fs::read_to_string(path).ok())
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default()
    }

    pub fn save(&self) {
        if let Some(path) = Self::config_path() {
            if let Some(parent) = path.parent() {
                let _ = fs::create_dir_all(parent);
            }
            if let Ok(json) = serde_json::to_string_pretty(self) {
                let _ = fs::write(path, json);
            }
        }
    }
}
