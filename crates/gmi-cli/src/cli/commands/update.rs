//! Update command: check the release feed and optionally self-update.

use anyhow::{Context, Result};
use gmi_core::cache::DownloadCache;
use gmi_core::config::GmiConfig;
use gmi_core::fetch::FetchOptions;
use gmi_core::selfupdate::{self, EmbeddedScript, ShellLauncher};
use gmi_core::update::{check_for_update, HttpReleaseFeed, UpdateStatus};
use semver::Version;

const UPDATER_SCRIPT: &[u8] = include_bytes!("../../../assets/update.sh");

fn current_version() -> Result<Version> {
    Version::parse(env!("CARGO_PKG_VERSION")).context("parse current version")
}

/// Check for a newer installer build; with `apply`, download it and hand off
/// to the updater process.
pub fn run_update(cfg: &GmiConfig, apply: bool) -> Result<()> {
    let current = current_version()?;
    let opts = FetchOptions::from(&cfg.network());
    let feed = HttpReleaseFeed::new(&cfg.release_feed_url, opts);

    if !apply {
        match check_for_update(&feed, &current)? {
            UpdateStatus::UpToDate => println!("No updates available (current: v{})", current),
            UpdateStatus::Available { version, url } => {
                println!("Update available: v{} ({})", version, url);
                println!("Run `gmi update --apply` to install it.");
            }
        }
        return Ok(());
    }

    let cache = DownloadCache::default_location()?;
    let mut progress = |fraction: f64| {
        let percent = (fraction * 100.0) as i64;
        if percent % 10 == 0 {
            tracing::info!("installer download: {}%", percent);
        }
    };
    let status = selfupdate::check_and_apply(
        &cache,
        &feed,
        &current,
        &EmbeddedScript(UPDATER_SCRIPT),
        &ShellLauncher,
        opts,
        &mut progress,
    )?;

    match status {
        UpdateStatus::UpToDate => println!("No updates available (current: v{})", current),
        UpdateStatus::Available { version, .. } => {
            println!("Updating to v{}; the updater will replace this binary.", version);
        }
    }
    Ok(())
}
