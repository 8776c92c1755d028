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
                    .join("lunalog"),
            )
        } else {
            ProjectDirs::from("", "", "lunalog")
                .map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn store_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("store.db"))
    }

    /// Diagnostics go to a file; the TUI owns stderr's terminal.
    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("lunalog.log"))
    }
}
