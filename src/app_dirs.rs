use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("faster"),
            )
        } else {
            ProjectDirs::from("", "", "faster").map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    pub fn db_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("faster.db"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("faster.log"))
    }

    pub fn config_path() -> PathBuf {
        match ProjectDirs::from("", "", "faster") {
            Some(pd) => pd.config_dir().join("config.json"),
            None => PathBuf::from("faster_config.json"),
        }
    }
}
