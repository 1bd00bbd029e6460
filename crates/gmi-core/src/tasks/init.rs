//! Startup task: locate the original game and validate the basic layout
//! before anything else runs.

use crate::config::GameConfig;
use crate::context::InstallContext;
use crate::detect::InstallProbe;
use crate::outcome::Outcome;
use crate::paths;
use crate::pipeline::{StatusHandle, Task};

pub struct InitTask {
    probe: Box<dyn InstallProbe>,
    game: GameConfig,
}

impl InitTask {
    pub fn new(probe: Box<dyn InstallProbe>, game: GameConfig) -> Self {
        Self { probe, game }
    }
}

impl Task for InitTask {
    fn name(&self) -> &str {
        "Startup"
    }

    fn run(&mut self, ctx: &mut InstallContext, status: &StatusHandle<'_>) -> Outcome {
        status.set(
            Some("Initializing"),
            Some(&format!(
                "Target install path: {}",
                paths::redacted(&ctx.target_install_path)
            )),
        );

        let Some(original) = self.probe.locate() else {
            return Outcome::failure("game is not installed");
        };
        ctx.original_game_path = Some(original.clone());
        status.set(
            None,
            Some(&format!("Installed game path: {}", paths::redacted(&original))),
        );

        let version_result = self.probe.version_of(&original);
        if !version_result.succeeded() {
            return version_result;
        }
        let version = version_result.message().unwrap_or_default().to_string();
        ctx.original_game_version = Some(version.clone());
        status.set(None, Some(&format!("Installed game version: {}", version)));

        if original == ctx.target_install_path {
            return Outcome::failure(
                "installer is targeting the game's original directory; choose a separate folder",
            );
        }

        if ctx.target_install_path.join(&self.game.binary_name).exists() {
            return Outcome::failure(
                "install folder already contains game files; use a fresh folder",
            );
        }

        Outcome::success_with(format!("Current game version: {}", version))
    }
}
