//! Concrete pre-checks for the install environment.

use super::{PreCheck, PreCheckResult};
use crate::cache::human_size;
use crate::config::GameConfig;
use crate::context::InstallContext;
use std::fs;

/// Blocking: the original game must be installed (directory present and
/// containing the game binary). Remediation is installing/launching the game,
/// then retrying this one check.
pub struct GameInstalledCheck {
    game: GameConfig,
}

impl GameInstalledCheck {
    pub fn new(game: GameConfig) -> Self {
        Self { game }
    }
}

impl PreCheck for GameInstalledCheck {
    fn name(&self) -> &str {
        "Game installed"
    }

    fn evaluate(&mut self, ctx: &InstallContext) -> PreCheckResult {
        let Some(dir) = &ctx.original_game_path else {
            return PreCheckResult::failed_retryable(
                "game installation could not be found",
                "Retry",
            );
        };
        if !dir.is_dir() || !dir.join(&self.game.binary_name).is_file() {
            return PreCheckResult::failed_retryable(
                "game installation could not be found",
                "Retry",
            );
        }
        PreCheckResult::passed_with("game install folder found")
    }
}

/// Blocking: the target directory must be creatable and writable. Verified
/// with a create-then-delete probe file rather than permissions metadata.
pub struct TargetWritableCheck;

impl PreCheck for TargetWritableCheck {
    fn name(&self) -> &str {
        "Install folder writable"
    }

    fn evaluate(&mut self, ctx: &InstallContext) -> PreCheckResult {
        let target = &ctx.target_install_path;
        if let Err(e) = fs::create_dir_all(target) {
            return PreCheckResult::failed_retryable(
                format!("could not create install folder {}: {}", target.display(), e),
                "Retry",
            );
        }
        let probe = target.join(".gmi-write-probe");
        match fs::write(&probe, b"probe") {
            Ok(()) => {
                let _ = fs::remove_file(&probe);
                PreCheckResult::passed()
            }
            Err(e) => PreCheckResult::failed_retryable(
                format!("install folder {} is not writable: {}", target.display(), e),
                "Retry",
            ),
        }
    }
}

/// Advisory: warn when the target folder already has content. Installing into
/// a fresh folder avoids clobbering unrelated files, but this never halts.
pub struct TargetEmptyCheck;

impl PreCheck for TargetEmptyCheck {
    fn name(&self) -> &str {
        "Install folder empty"
    }

    fn blocking(&self) -> bool {
        false
    }

    fn evaluate(&mut self, ctx: &InstallContext) -> PreCheckResult {
        let target = &ctx.target_install_path;
        let Ok(entries) = fs::read_dir(target) else {
            // Folder missing entirely counts as empty; creation is the
            // writable check's concern.
            return PreCheckResult::passed();
        };
        let count = entries.flatten().count();
        if count == 0 {
            PreCheckResult::passed()
        } else {
            PreCheckResult::failed(format!(
                "install folder is not empty ({} entries); a fresh folder is recommended",
                count
            ))
        }
    }
}

/// Advisory: warn when the target filesystem looks low on space. Probes the
/// nearest existing ancestor of the target so it works before the install
/// folder exists. A probe failure passes; this never halts the gate.
pub struct FreeSpaceCheck {
    required_bytes: u64,
}

impl FreeSpaceCheck {
    /// Rough floor for a full install: mod package plus unpacked payload.
    pub const DEFAULT_REQUIRED_BYTES: u64 = 2 * 1024 * 1024 * 1024;

    pub fn new(required_bytes: u64) -> Self {
        Self { required_bytes }
    }
}

impl Default for FreeSpaceCheck {
    fn default() -> Self {
        Self::new(Self::DEFAULT_REQUIRED_BYTES)
    }
}

impl PreCheck for FreeSpaceCheck {
    fn name(&self) -> &str {
        "Free disk space"
    }

    fn blocking(&self) -> bool {
        false
    }

    fn evaluate(&mut self, ctx: &InstallContext) -> PreCheckResult {
        let mut probe = ctx.target_install_path.as_path();
        while !probe.exists() {
            match probe.parent() {
                Some(parent) => probe = parent,
                None => {
                    return PreCheckResult::passed_with("free space could not be determined")
                }
            }
        }
        match fs2::available_space(probe) {
            Ok(available) if available < self.required_bytes => {
                PreCheckResult::failed(format!(
                    "only {} free at {}; at least {} recommended",
                    human_size(available),
                    probe.display(),
                    human_size(self.required_bytes),
                ))
            }
            Ok(available) => PreCheckResult::passed_with(format!("{} free", human_size(available))),
            Err(e) => {
                tracing::debug!("free space probe failed for {}: {}", probe.display(), e);
                PreCheckResult::passed_with("free space could not be determined")
            }
        }
    }
}
