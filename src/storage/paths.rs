//! Application paths for saved session contexts.

use directories::ProjectDirs;
use std::path::PathBuf;

/// Application paths.
pub struct AppPaths {
    /// Data directory where session contexts live.
    pub data: PathBuf,
}

impl AppPaths {
    /// Create paths for the sfsight application.
    #[must_use]
    pub fn new() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("com", "sfsight", "sfsight") {
            Self {
                data: proj_dirs.data_dir().to_path_buf(),
            }
        } else {
            let home = directories::BaseDirs::new()
                .map_or_else(|| PathBuf::from("."), |d| d.home_dir().to_path_buf());
            Self {
                data: home.join(".local/share/sfsight"),
            }
        }
    }

    /// Paths rooted at an explicit directory, for tests and `--context-dir`.
    #[must_use]
    pub fn at(data: PathBuf) -> Self {
        Self { data }
    }

    /// Path to a saved context file with the given stem.
    #[must_use]
    pub fn context_file(&self, stem: &str) -> PathBuf {
        self.data.join(format!("{stem}.json"))
    }

    /// Ensure the data directory exists.
    ///
    /// # Errors
    ///
    /// Propagates the underlying filesystem error.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data)
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
