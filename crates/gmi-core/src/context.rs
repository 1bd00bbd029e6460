//! Shared mutable context for one installation run.

use std::path::PathBuf;

/// Facts discovered while installing, passed from task to task.
///
/// Owned by the pipeline driver; each task gets `&mut` access for its single
/// sequential turn, so mutations are totally ordered and never aliased.
#[derive(Debug, Clone, Default)]
pub struct InstallContext {
    /// Where the mod is being installed.
    pub target_install_path: PathBuf,
    /// Detected original game directory, once found.
    pub original_game_path: Option<PathBuf>,
    /// Detected original game version, once found.
    pub original_game_version: Option<String>,
    /// Local path of the downloaded mod package, once fetched.
    pub mod_package_path: Option<PathBuf>,
}

impl InstallContext {
    pub fn new(target_install_path: impl Into<PathBuf>) -> Self {
        Self {
            target_install_path: target_install_path.into(),
            ..Default::default()
        }
    }
}
