//! Locating the original game installation.
//!
//! The probe is a narrow collaborator: "find the game directory, read its
//! version". The heuristics here are deliberately shallow (marker file in
//! configured search roots); anything smarter belongs behind the same trait.

use crate::config::GameConfig;
use crate::outcome::Outcome;
use std::fs;
use std::path::{Path, PathBuf};

/// Filesystem probe for an existing game installation.
pub trait InstallProbe {
    /// Candidate original-installation directory, or None when not found.
    fn locate(&self) -> Option<PathBuf>;

    /// Detected version of the installation at `dir`. Success carries the
    /// version string as its message; failures carry a human-readable reason.
    fn version_of(&self, dir: &Path) -> Outcome;
}

/// Probe that scans configured roots for a directory containing the game
/// binary, and reads the version from a file next to it.
pub struct MarkerProbe {
    game: GameConfig,
}

impl MarkerProbe {
    pub fn new(game: GameConfig) -> Self {
        Self { game }
    }
}

impl InstallProbe for MarkerProbe {
    fn locate(&self) -> Option<PathBuf> {
        for root in &self.game.search_roots {
            if root.join(&self.game.binary_name).is_file() {
                return Some(root.clone());
            }
            let Ok(entries) = fs::read_dir(root) else {
                continue;
            };
            for entry in entries.flatten() {
                let dir = entry.path();
                if dir.join(&self.game.binary_name).is_file() {
                    return Some(dir);
                }
            }
        }
        None
    }

    fn version_of(&self, dir: &Path) -> Outcome {
        let version_path = dir.join(&self.game.version_file);
        match fs::read_to_string(&version_path) {
            Ok(raw) => {
                let version = raw.trim();
                if version.is_empty() {
                    Outcome::failure(format!(
                        "version file {} is empty",
                        version_path.display()
                    ))
                } else {
                    Outcome::success_with(version)
                }
            }
            Err(e) => Outcome::failure(format!(
                "could not read game version from {}: {}",
                version_path.display(),
                e
            )),
        }
    }
}
