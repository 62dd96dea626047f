use clap::ValueEnum;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Game constants, fixed once a session starts.
///
/// Loaded from the optional per-user config file, then adjusted by the
/// difficulty preset and explicit CLI flags (in that order).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Starting lives; the session ends when they run out
    pub lives: i32,
    /// Countdown length in whole seconds before `playing`
    pub countdown_secs: u32,
    /// Per-target sketch-time budget at session start, in ms
    pub level_budget_ms: u64,
    /// Budget reduction applied after every correct guess, in ms
    pub budget_step_ms: u64,
    /// Lower clamp on the shrinking budget, in ms
    pub budget_floor_ms: u64,
    /// Classification poll period (also the tick rate), in ms
    pub poll_ms: u64,
    /// Pointer-move throttle quantum; one processed move accrues this much
    /// drawing time, in ms
    pub throttle_ms: u64,
    /// Drawing time before the rejection curve starts biting, in ms
    pub reject_delay_ms: u64,
    /// Overage needed to make one more label eligible for suppression, in ms
    pub reject_time_per_label_ms: u64,
    /// Top-score threshold below which the rejection curve stays off
    pub start_reject_score: f64,
    /// Correct guesses needed for the session to count as won
    pub win_threshold: usize,
    /// Logical canvas side length in pixels (always square)
    pub canvas_px: u32,
    /// Brush diameter in canvas pixels
    pub brush_px: u32,
    /// Dead zone at each canvas edge, as a fraction of the side length
    pub margin_ratio: f64,
    /// Symmetric padding added around the crop square, in pixels
    pub crop_pad_px: u32,
    /// Labels never used as targets and dropped from classifier output
    pub banned_labels: Vec<String>,
    /// Command line for the external classifier worker (whitespace-split)
    pub classifier_cmd: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lives: 3,
            countdown_secs: 3,
            level_budget_ms: 15_000,
            budget_step_ms: 1_000,
            budget_floor_ms: 5_000,
            poll_ms: 100,
            throttle_ms: 10,
            reject_delay_ms: 5_000,
            reject_time_per_label_ms: 1_500,
            start_reject_score: 0.5,
            win_threshold: 10,
            canvas_px: 512,
            brush_px: 16,
            margin_ratio: 0.1,
            crop_pad_px: 4,
            banned_labels: default_banned_labels(),
            classifier_cmd: None,
        }
    }
}

fn default_banned_labels() -> Vec<String> {
    [
        "aircraft carrier",
        "animal migration",
        "camouflage",
        "line",
        "squiggle",
        "zigzag",
        "The Eiffel Tower",
        "The Great Wall of China",
        "The Mona Lisa",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Session pacing presets selectable from the CLI
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, strum_macros::Display)]
pub enum Difficulty {
    #[strum(serialize = "relaxed")]
    Relaxed,
    #[strum(serialize = "classic")]
    Classic,
    #[strum(serialize = "frantic")]
    Frantic,
}

impl Config {
    /// Overwrite the pacing group (lives, budget, rejection curve) with a
    /// preset; everything else is left alone.
    pub fn apply_difficulty(&mut self, difficulty: Difficulty) {
        match difficulty {
            Difficulty::Relaxed => {
                self.lives = 5;
                self.level_budget_ms = 20_000;
                self.budget_step_ms = 500;
                self.budget_floor_ms = 8_000;
                self.reject_delay_ms = 8_000;
                self.reject_time_per_label_ms = 2_500;
            }
            Difficulty::Classic => {
                let d = Config::default();
                self.lives = d.lives;
                self.level_budget_ms = d.level_budget_ms;
                self.budget_step_ms = d.budget_step_ms;
                self.budget_floor_ms = d.budget_floor_ms;
                self.reject_delay_ms = d.reject_delay_ms;
                self.reject_time_per_label_ms = d.reject_time_per_label_ms;
            }
            Difficulty::Frantic => {
                self.lives = 2;
                self.level_budget_ms = 9_000;
                self.budget_step_ms = 1_500;
                self.budget_floor_ms = 3_000;
                self.reject_delay_ms = 3_000;
                self.reject_time_per_label_ms = 1_000;
            }
        }
    }

    /// Margin width in canvas pixels
    pub fn margin_px(&self) -> f64 {
        self.canvas_px as f64 * self.margin_ratio
    }

    /// Brush radius in canvas pixels
    pub fn brush_radius(&self) -> f64 {
        self.brush_px as f64 / 2.0
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "skiss") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("skiss_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(cfg) = serde_json::from_slice::<Config>(&bytes) {
                return cfg;
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            lives: 7,
            countdown_secs: 5,
            level_budget_ms: 30_000,
            win_threshold: 20,
            banned_labels: vec!["triangle".into()],
            classifier_cmd: Some("python3 worker.py".into()),
            ..Config::default()
        };
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn corrupt_file_falls_back_to_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, b"{not json").unwrap();
        let store = FileConfigStore::with_path(&path);
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn difficulty_presets_touch_pacing_only() {
        let mut cfg = Config::default();
        cfg.canvas_px = 1024;
        cfg.apply_difficulty(Difficulty::Frantic);
        assert_eq!(cfg.lives, 2);
        assert_eq!(cfg.level_budget_ms, 9_000);
        assert_eq!(cfg.canvas_px, 1024);

        cfg.apply_difficulty(Difficulty::Relaxed);
        assert_eq!(cfg.lives, 5);
        assert_eq!(cfg.budget_floor_ms, 8_000);

        cfg.apply_difficulty(Difficulty::Classic);
        assert_eq!(cfg.lives, Config::default().lives);
        assert_eq!(cfg.level_budget_ms, Config::default().level_budget_ms);
    }

    #[test]
    fn derived_geometry_helpers() {
        let cfg = Config::default();
        assert_eq!(cfg.margin_px(), 51.2);
        assert_eq!(cfg.brush_radius(), 8.0);
    }
}
