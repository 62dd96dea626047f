use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Where finished sessions are journaled
    pub fn scores_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "skiss").map(|pd| pd.config_dir().join("scores.csv"))
    }
}
