//! Self-update: fetch a newer installer build and hand off to an external
//! updater process that swaps the running binary.
//!
//! The moving parts the core cannot own (bundled script bytes, process
//! launch) sit behind narrow traits so the flow itself stays testable.

use crate::cache::DownloadCache;
use crate::fetch::{self, FetchOptions};
use crate::update::{check_for_update, ReleaseFeed, UpdateStatus};
use anyhow::{bail, Context, Result};
use semver::Version;
use std::fs;
use std::path::Path;
use std::process::Command;

/// File name the updater script is extracted under, inside the cache dir.
pub const UPDATER_SCRIPT_NAME: &str = "gmi-update.sh";

/// Provider of the bundled updater script ("produce a file at path X").
pub trait ScriptSource {
    fn extract_to(&self, dest: &Path) -> Result<()>;
}

/// Script embedded in the binary at build time.
pub struct EmbeddedScript(pub &'static [u8]);

impl ScriptSource for EmbeddedScript {
    fn extract_to(&self, dest: &Path) -> Result<()> {
        fs::write(dest, self.0).with_context(|| format!("write {}", dest.display()))?;
        Ok(())
    }
}

/// Hands off to the external updater process.
pub trait Launcher {
    fn launch(&self, updater: &Path, new_installer: &Path, current_exe: &Path) -> Result<()>;
}

/// Runs the updater script through `sh` with explicit arguments:
/// new-installer path, then current-executable path.
pub struct ShellLauncher;

impl Launcher for ShellLauncher {
    fn launch(&self, updater: &Path, new_installer: &Path, current_exe: &Path) -> Result<()> {
        Command::new("sh")
            .arg(updater)
            .arg(new_installer)
            .arg(current_exe)
            .spawn()
            .with_context(|| format!("launch updater {}", updater.display()))?;
        Ok(())
    }
}

/// Download the new installer through the cache and hand off to the updater.
///
/// `url` is the release asset location from a prior [`check_for_update`];
/// `version` is only used for logging. Returns once the updater process has
/// been spawned; the caller is expected to exit promptly so the binary can be
/// replaced.
pub fn apply_update(
    cache: &DownloadCache,
    version: &Version,
    url: &str,
    script: &dyn ScriptSource,
    launcher: &dyn Launcher,
    opts: FetchOptions,
    progress: &mut dyn FnMut(f64),
) -> Result<()> {
    fs::create_dir_all(cache.root())
        .with_context(|| format!("create cache dir {}", cache.root().display()))?;

    let updater_path = cache.root().join(UPDATER_SCRIPT_NAME);
    script
        .extract_to(&updater_path)
        .context("failed to prepare updater script")?;
    if !updater_path.exists() {
        bail!("updater script missing after extraction");
    }

    tracing::info!("downloading installer v{}", version);
    let file_name = fetch::file_name_for_url(url, "gmi-installer.new");
    let mut source = crate::cache::HttpSource::new(url).with_options(opts);
    let installer = cache
        .get_or_fetch(&file_name, &mut source, None, progress)
        .with_context(|| format!("failed to download new installer v{}", version))?;

    let current_exe = std::env::current_exe().context("locate current executable")?;
    launcher.launch(&updater_path, &installer, &current_exe)
}

/// Convenience: check the feed and, when an update exists, apply it.
/// Returns the status so the caller can report "already up to date".
pub fn check_and_apply(
    cache: &DownloadCache,
    feed: &dyn ReleaseFeed,
    current: &Version,
    script: &dyn ScriptSource,
    launcher: &dyn Launcher,
    opts: FetchOptions,
    progress: &mut dyn FnMut(f64),
) -> Result<UpdateStatus> {
    let status = check_for_update(feed, current)?;
    if let UpdateStatus::Available { version, url } = &status {
        apply_update(cache, version, url, script, launcher, opts, progress)?;
    }
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    struct RecordingLauncher {
        calls: Mutex<Vec<(PathBuf, PathBuf, PathBuf)>>,
    }

    impl Launcher for RecordingLauncher {
        fn launch(&self, updater: &Path, new_installer: &Path, current_exe: &Path) -> Result<()> {
            self.calls.lock().unwrap().push((
                updater.to_path_buf(),
                new_installer.to_path_buf(),
                current_exe.to_path_buf(),
            ));
            Ok(())
        }
    }

    #[test]
    fn apply_update_extracts_script_and_launches() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DownloadCache::new(dir.path());
        // Pre-seed the cache under the asset's derived name; no expected hash
        // means the cached copy is trusted and no network fetch happens.
        std::fs::write(dir.path().join("gmi-installer-1.3.0"), b"new binary").unwrap();

        let launcher = RecordingLauncher {
            calls: Mutex::new(Vec::new()),
        };
        let version = Version::parse("1.3.0").unwrap();
        apply_update(
            &cache,
            &version,
            "https://releases.example.com/dl/gmi-installer-1.3.0",
            &EmbeddedScript(b"#!/bin/sh\nexit 0\n"),
            &launcher,
            FetchOptions::default(),
            &mut |_| {},
        )
        .unwrap();

        let updater = dir.path().join(UPDATER_SCRIPT_NAME);
        assert_eq!(
            std::fs::read(&updater).unwrap(),
            b"#!/bin/sh\nexit 0\n".to_vec()
        );

        let calls = launcher.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, updater);
        assert_eq!(calls[0].1, dir.path().join("gmi-installer-1.3.0"));
    }

    struct FailingScript;

    impl ScriptSource for FailingScript {
        fn extract_to(&self, _dest: &Path) -> Result<()> {
            bail!("resource not found")
        }
    }

    #[test]
    fn script_extraction_failure_aborts_before_download() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DownloadCache::new(dir.path());
        let launcher = RecordingLauncher {
            calls: Mutex::new(Vec::new()),
        };
        let version = Version::parse("1.3.0").unwrap();
        let err = apply_update(
            &cache,
            &version,
            "https://releases.example.com/dl/installer",
            &FailingScript,
            &launcher,
            FetchOptions::default(),
            &mut |_| {},
        )
        .unwrap_err();
        assert!(err.to_string().contains("updater script"));
        assert!(launcher.calls.lock().unwrap().is_empty());
    }
}
