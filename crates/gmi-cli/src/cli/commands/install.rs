//! Install command: assemble and run the full pipeline.

use anyhow::{bail, Result};
use gmi_core::cache::DownloadCache;
use gmi_core::config::GmiConfig;
use gmi_core::context::InstallContext;
use gmi_core::detect::MarkerProbe;
use gmi_core::fetch::FetchOptions;
use gmi_core::outcome::Outcome;
use gmi_core::pipeline::{Pipeline, ProgressEvent, ProgressSink, TaskState};
use gmi_core::precheck::{
    FreeSpaceCheck, Gate, GameInstalledCheck, TargetEmptyCheck, TargetWritableCheck,
};
use gmi_core::tasks::{DownloadModTask, InitTask, PreCheckTask};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Prints pipeline progress to stdout. Download progress is throttled to
/// 10% steps so large transfers don't flood the terminal.
struct ConsoleSink {
    last_percent: Mutex<i64>,
}

impl ConsoleSink {
    fn new() -> Self {
        Self {
            last_percent: Mutex::new(-1),
        }
    }
}

impl ProgressSink for ConsoleSink {
    fn on_event(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::TaskStarted {
                index, total, name, ..
            } => {
                println!("[{}/{}] {}", index + 1, total, name);
                *self.last_percent.lock().unwrap() = -1;
            }
            ProgressEvent::Status { title, detail } => {
                if let Some(title) = title {
                    println!("  {}", title);
                }
                if let Some(detail) = detail {
                    println!("    {}", detail);
                }
            }
            ProgressEvent::DownloadProgress(fraction) => {
                let percent = (fraction * 100.0) as i64;
                let mut last = self.last_percent.lock().unwrap();
                if percent / 10 > *last / 10 || (percent == 100 && *last != 100) {
                    *last = percent;
                    println!("    {}%", percent);
                }
            }
            ProgressEvent::TaskFinished { state, message, .. } => {
                let label = match state {
                    TaskState::Succeeded => "done",
                    TaskState::Warning => "done (with warnings)",
                    TaskState::Failed => "FAILED",
                    _ => return,
                };
                match message {
                    Some(message) => println!("  {}: {}", label, message),
                    None => println!("  {}", label),
                }
            }
        }
    }
}

/// Run the install pipeline against the configured (or overridden) target.
pub fn run_install(cfg: &GmiConfig, target: Option<PathBuf>) -> Result<()> {
    let target = match target
        .or_else(|| cfg.target_install_dir.clone())
    {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    let cache = Arc::new(DownloadCache::default_location()?);
    let opts = FetchOptions::from(&cfg.network());

    let probe = MarkerProbe::new(cfg.game.clone());
    let gate = Gate::new(vec![
        Box::new(GameInstalledCheck::new(cfg.game.clone())),
        Box::new(TargetWritableCheck),
        Box::new(FreeSpaceCheck::default()),
        Box::new(TargetEmptyCheck),
    ]);
    let mut pipeline = Pipeline::new(vec![
        Box::new(InitTask::new(Box::new(probe), cfg.game.clone())),
        Box::new(PreCheckTask::new(gate)),
        Box::new(DownloadModTask::new(
            cache,
            cfg.mod_package_url.clone(),
            cfg.mod_package_sha256.clone(),
            opts,
        )),
    ]);

    let mut ctx = InstallContext::new(target);
    let report = pipeline.run(&mut ctx, &ConsoleSink::new());

    match report.outcome {
        Outcome::Success { message } => {
            match message {
                Some(message) => println!("Install complete: {}", message),
                None => println!("Install complete."),
            }
            Ok(())
        }
        Outcome::Warning { message } => {
            println!("Install complete with warnings: {}", message);
            Ok(())
        }
        Outcome::Failure { message } => bail!("{}", message),
    }
}
