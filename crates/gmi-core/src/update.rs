//! Update checker: compare the running version against a remote release feed.

use crate::fetch::{self, FetchOptions};
use anyhow::{Context, Result};
use semver::Version;
use serde::Deserialize;

/// Downloadable artifact attached to a release.
#[derive(Debug, Clone, Deserialize)]
pub struct Asset {
    #[serde(default)]
    pub name: String,
    pub browser_download_url: String,
}

/// One published release in the feed. Minimal shape: only what the checker reads.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// Source of published releases.
pub trait ReleaseFeed {
    fn releases(&self) -> Result<Vec<Release>>;
}

/// Feed served as a JSON array of releases over HTTP.
pub struct HttpReleaseFeed {
    url: String,
    opts: FetchOptions,
}

impl HttpReleaseFeed {
    pub fn new(url: impl Into<String>, opts: FetchOptions) -> Self {
        Self {
            url: url.into(),
            opts,
        }
    }
}

impl ReleaseFeed for HttpReleaseFeed {
    fn releases(&self) -> Result<Vec<Release>> {
        let body = fetch::fetch_bytes(&self.url, self.opts)
            .with_context(|| format!("fetch release feed {}", self.url))?;
        let releases: Vec<Release> =
            serde_json::from_slice(&body).context("parse release feed")?;
        Ok(releases)
    }
}

/// Result of an update check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    UpToDate,
    Available { version: Version, url: String },
}

/// Parse a release tag as a version: leading `v` stripped, short tags like
/// `1.2` padded to three components. None for anything else.
pub fn parse_tag(tag: &str) -> Option<Version> {
    let tag = tag.trim().trim_start_matches('v');
    if let Ok(v) = Version::parse(tag) {
        return Some(v);
    }
    let parts: Vec<&str> = tag.split('.').collect();
    let padded = match parts.as_slice() {
        [major] => format!("{}.0.0", major),
        [major, minor] => format!("{}.{}.0", major, minor),
        _ => return None,
    };
    Version::parse(&padded).ok()
}

/// Check the feed for a newer installer.
///
/// Feed ordering is not trusted: the maximum non-prerelease version is
/// selected explicitly. Only a strictly greater version counts as an update.
/// Unparseable tags are skipped; a best release without assets is reported
/// as up-to-date (there is nothing to download).
pub fn check_for_update(feed: &dyn ReleaseFeed, current: &Version) -> Result<UpdateStatus> {
    let releases = feed.releases()?;
    if releases.is_empty() {
        tracing::info!("release feed is empty");
        return Ok(UpdateStatus::UpToDate);
    }

    let best = releases
        .iter()
        .filter(|r| !r.prerelease)
        .filter_map(|r| match parse_tag(&r.tag_name) {
            Some(v) => Some((v, r)),
            None => {
                tracing::warn!("skipping release with unparseable tag: {}", r.tag_name);
                None
            }
        })
        .max_by(|a, b| a.0.cmp(&b.0));

    match best {
        Some((version, release)) if version > *current => {
            let Some(asset) = release.assets.first() else {
                tracing::warn!("release {} has no assets; nothing to download", release.tag_name);
                return Ok(UpdateStatus::UpToDate);
            };
            Ok(UpdateStatus::Available {
                version,
                url: asset.browser_download_url.clone(),
            })
        }
        _ => Ok(UpdateStatus::UpToDate),
    }
}
