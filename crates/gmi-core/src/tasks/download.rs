//! Download task: fetch the mod package through the cache.

use crate::cache::{DownloadCache, HttpSource};
use crate::context::InstallContext;
use crate::fetch::{self, FetchOptions};
use crate::outcome::Outcome;
use crate::pipeline::{StatusHandle, Task};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Fetches the configured mod package into the download cache and records the
/// local path in the context for the apply step. A valid cached copy skips
/// the network entirely.
pub struct DownloadModTask {
    cache: Arc<DownloadCache>,
    url: Option<String>,
    expected_sha256: Option<String>,
    opts: FetchOptions,
    cancel: Option<Arc<AtomicBool>>,
}

impl DownloadModTask {
    pub fn new(
        cache: Arc<DownloadCache>,
        url: Option<String>,
        expected_sha256: Option<String>,
        opts: FetchOptions,
    ) -> Self {
        Self {
            cache,
            url,
            expected_sha256,
            opts,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

impl Task for DownloadModTask {
    fn name(&self) -> &str {
        "Download mod package"
    }

    fn run(&mut self, ctx: &mut InstallContext, status: &StatusHandle<'_>) -> Outcome {
        let Some(url) = self.url.clone() else {
            return Outcome::failure(
                "no mod package URL configured; set mod_package_url in config.toml",
            );
        };

        let file_name = fetch::file_name_for_url(&url, "mod-package.bin");
        status.set(Some("Downloading mod package"), Some(&file_name));

        let mut source = HttpSource::new(&url).with_options(self.opts);
        if let Some(cancel) = &self.cancel {
            source = source.with_cancel(Arc::clone(cancel));
        }
        let mut progress = |fraction: f64| status.download_progress(fraction);
        match self.cache.get_or_fetch(
            &file_name,
            &mut source,
            self.expected_sha256.as_deref(),
            &mut progress,
        ) {
            Ok(path) => {
                ctx.mod_package_path = Some(path.clone());
                Outcome::success_with(format!("mod package ready: {}", file_name))
            }
            Err(e) => Outcome::failure(e.to_string()),
        }
    }
}
