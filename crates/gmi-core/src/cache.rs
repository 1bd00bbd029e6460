//! Content-addressed download cache.
//!
//! A flat directory of files named by their logical cache key. There is no
//! manifest: presence plus an optional hash check is the only validity
//! signal. Fetches write to a `.part` temp file and atomically rename, so a
//! crash mid-download never leaves a partial file visible under the final
//! name, and re-invoking the same key either reuses a valid prior result or
//! transparently repairs a corrupt one.

use crate::fetch::{self, FetchError, FetchOptions};
use crate::hash;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Failure of a cache operation, normalized to one human-readable reason.
/// The caller decides whether it is fatal to the surrounding flow.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to prepare cache directory {dir}: {source}")]
    CacheDir { dir: PathBuf, source: io::Error },
    #[error("download failed for {name}: {source}")]
    Fetch { name: String, source: FetchError },
    #[error("download failed for {name}: file missing after fetch")]
    Missing { name: String },
    #[error("hash mismatch for {name}")]
    HashMismatch { name: String },
    #[error("failed to store {name}: {source}")]
    Store { name: String, source: io::Error },
}

/// Something that can produce the bytes for a cache entry at a given path.
///
/// Implementations must create (or truncate) the file at `dest` and report
/// fractional progress in [0, 1]. The cache guarantees a source is only
/// invoked when no valid cached copy exists.
pub trait FetchSource {
    fn fetch_to(&mut self, dest: &Path, progress: &mut dyn FnMut(f64)) -> Result<(), FetchError>;
}

/// Remote HTTP(S) source, streamed via libcurl.
pub struct HttpSource {
    url: String,
    opts: FetchOptions,
    cancel: Option<Arc<AtomicBool>>,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            opts: FetchOptions::default(),
            cancel: None,
        }
    }

    pub fn with_options(mut self, opts: FetchOptions) -> Self {
        self.opts = opts;
        self
    }

    /// Attach a cancellation flag; raising it aborts an in-flight transfer.
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

impl FetchSource for HttpSource {
    fn fetch_to(&mut self, dest: &Path, progress: &mut dyn FnMut(f64)) -> Result<(), FetchError> {
        let bytes = fetch::fetch_to_file(&self.url, dest, progress, self.cancel.as_deref(), self.opts)?;
        tracing::debug!("fetched {} ({} bytes) from {}", dest.display(), bytes, self.url);
        Ok(())
    }
}

/// In-memory or bundled-resource source: copies any `Read` to the cache.
pub struct ReaderSource<R: Read> {
    inner: R,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: Read> FetchSource for ReaderSource<R> {
    fn fetch_to(&mut self, dest: &Path, progress: &mut dyn FnMut(f64)) -> Result<(), FetchError> {
        let mut file = File::create(dest)?;
        io::copy(&mut self.inner, &mut file)?;
        progress(1.0);
        Ok(())
    }
}

/// Keyed store of downloaded files under a single root directory.
///
/// Single-process: concurrent calls for the same key serialize on a
/// key-scoped lock so a second caller never observes a torn file. Distinct
/// keys are independent.
pub struct DownloadCache {
    root: PathBuf,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl DownloadCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Cache at the platform per-user location (`~/.cache/gmi`).
    pub fn default_location() -> anyhow::Result<Self> {
        Ok(Self::new(crate::paths::cache_root()?))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_lock(&self, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(name.to_string()).or_default())
    }

    /// Drop lock entries no caller holds or waits on, keeping the map
    /// bounded by the number of in-flight keys.
    fn prune_locks(&self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    /// Return a local file for `file_name`, fetching from `source` only when
    /// no valid cached copy exists.
    ///
    /// With an expected hash, an existing file that does not match is deleted
    /// and re-fetched. Without one, any existing file is trusted as-is. A
    /// fetched file that fails verification is left in place for diagnostics;
    /// the next call for the same key evicts it.
    pub fn get_or_fetch(
        &self,
        file_name: &str,
        source: &mut dyn FetchSource,
        expected_hash: Option<&str>,
        progress: &mut dyn FnMut(f64),
    ) -> Result<PathBuf, CacheError> {
        let lock = self.key_lock(file_name);
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.fetch_locked(file_name, source, expected_hash, progress)
        };
        drop(lock);
        self.prune_locks();
        result
    }

    fn fetch_locked(
        &self,
        file_name: &str,
        source: &mut dyn FetchSource,
        expected_hash: Option<&str>,
        progress: &mut dyn FnMut(f64),
    ) -> Result<PathBuf, CacheError> {
        fs::create_dir_all(&self.root).map_err(|source| CacheError::CacheDir {
            dir: self.root.clone(),
            source,
        })?;

        let path = self.root.join(file_name);

        if path.exists() {
            match expected_hash {
                None => {
                    tracing::info!("using cached file (no hash check): {}", file_name);
                    return Ok(path);
                }
                Some(expected) if hash::check_hash(&path, expected) => {
                    tracing::info!("using cached file: {} - hash: {}", file_name, expected);
                    return Ok(path);
                }
                Some(_) => {
                    tracing::info!("evicting stale cached file: {}", file_name);
                    fs::remove_file(&path).map_err(|source| CacheError::Store {
                        name: file_name.to_string(),
                        source,
                    })?;
                }
            }
        }

        let part = temp_path(&path);
        if let Err(source) = source.fetch_to(&part, progress) {
            // No partial file left visible on failure.
            let _ = fs::remove_file(&part);
            return Err(CacheError::Fetch {
                name: file_name.to_string(),
                source,
            });
        }

        fs::rename(&part, &path).map_err(|source| CacheError::Store {
            name: file_name.to_string(),
            source,
        })?;

        if !path.exists() {
            return Err(CacheError::Missing {
                name: file_name.to_string(),
            });
        }

        if let Some(expected) = expected_hash {
            if !hash::check_hash(&path, expected) {
                tracing::warn!("hash mismatch for freshly fetched {}", file_name);
                return Err(CacheError::HashMismatch {
                    name: file_name.to_string(),
                });
            }
        }

        Ok(path)
    }

    /// Total size of all cached files in bytes. Zero when the cache directory
    /// does not exist yet.
    pub fn size_bytes(&self) -> u64 {
        let Ok(entries) = fs::read_dir(&self.root) else {
            return 0;
        };
        entries
            .flatten()
            .filter_map(|e| e.metadata().ok())
            .filter(|m| m.is_file())
            .map(|m| m.len())
            .sum()
    }

    /// Delete every cached file. The directory itself is kept.
    pub fn clear(&self) -> io::Result<()> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };
        for entry in entries.flatten() {
            if entry.metadata().map(|m| m.is_file()).unwrap_or(false) {
                fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }
}

/// Path for the in-flight temp file: appends `.part` to the final path.
fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

const SIZE_SUFFIXES: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Human-readable size, e.g. "1.5 MB".
pub fn human_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut idx = 0;
    while value >= 1024.0 && idx < SIZE_SUFFIXES.len() - 1 {
        value /= 1024.0;
        idx += 1;
    }
    if idx == 0 {
        format!("{} {}", bytes, SIZE_SUFFIXES[0])
    } else {
        format!("{:.1} {}", value, SIZE_SUFFIXES[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Source that writes fixed bytes and counts how often it is invoked.
    struct CountingSource {
        body: Vec<u8>,
        calls: usize,
        fail: bool,
    }

    impl CountingSource {
        fn new(body: &[u8]) -> Self {
            Self {
                body: body.to_vec(),
                calls: 0,
                fail: false,
            }
        }
    }

    impl FetchSource for CountingSource {
        fn fetch_to(
            &mut self,
            dest: &Path,
            progress: &mut dyn FnMut(f64),
        ) -> Result<(), FetchError> {
            self.calls += 1;
            let mut f = File::create(dest)?;
            f.write_all(&self.body)?;
            if self.fail {
                return Err(FetchError::Http(500));
            }
            progress(1.0);
            Ok(())
        }
    }

    fn sha256_of(data: &[u8]) -> String {
        use sha2::{Digest, Sha256};
        hex::encode(Sha256::digest(data))
    }

    #[test]
    fn second_call_is_a_hit_without_invoking_source() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DownloadCache::new(dir.path());
        let body = b"mod package bytes";
        let expected = sha256_of(body);
        let mut source = CountingSource::new(body);

        let p1 = cache
            .get_or_fetch("mod.zip", &mut source, Some(&expected), &mut |_| {})
            .unwrap();
        assert_eq!(std::fs::read(&p1).unwrap(), body);
        assert_eq!(source.calls, 1);

        let p2 = cache
            .get_or_fetch("mod.zip", &mut source, Some(&expected), &mut |_| {})
            .unwrap();
        assert_eq!(p2, p1);
        assert_eq!(source.calls, 1, "cache hit must not invoke the source");
    }

    #[test]
    fn corrupted_entry_is_evicted_and_refetched() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DownloadCache::new(dir.path());
        let body = b"good content";
        let expected = sha256_of(body);
        let mut source = CountingSource::new(body);

        let p = cache
            .get_or_fetch("mod.zip", &mut source, Some(&expected), &mut |_| {})
            .unwrap();
        std::fs::write(&p, b"corrupted!").unwrap();

        let p2 = cache
            .get_or_fetch("mod.zip", &mut source, Some(&expected), &mut |_| {})
            .unwrap();
        assert_eq!(source.calls, 2);
        assert_eq!(std::fs::read(&p2).unwrap(), body);
    }

    #[test]
    fn existing_file_trusted_when_no_hash_given() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DownloadCache::new(dir.path());
        std::fs::write(dir.path().join("mod.zip"), b"arbitrary").unwrap();

        let mut source = CountingSource::new(b"never used");
        let p = cache
            .get_or_fetch("mod.zip", &mut source, None, &mut |_| {})
            .unwrap();
        assert_eq!(source.calls, 0, "no fetch when any file exists and no hash");
        assert_eq!(std::fs::read(&p).unwrap(), b"arbitrary");
    }

    #[test]
    fn failed_fetch_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DownloadCache::new(dir.path());
        let mut source = CountingSource::new(b"half written");
        source.fail = true;

        let err = cache
            .get_or_fetch("mod.zip", &mut source, None, &mut |_| {})
            .unwrap_err();
        assert!(matches!(err, CacheError::Fetch { .. }));
        assert!(!dir.path().join("mod.zip").exists());
        assert!(!dir.path().join("mod.zip.part").exists());
    }

    #[test]
    fn mismatching_fetch_fails_but_leaves_file_for_next_call() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DownloadCache::new(dir.path());
        let expected = sha256_of(b"what we wanted");
        let mut bad = CountingSource::new(b"what we got");

        let err = cache
            .get_or_fetch("mod.zip", &mut bad, Some(&expected), &mut |_| {})
            .unwrap_err();
        assert!(matches!(err, CacheError::HashMismatch { .. }));
        // Left in place for diagnostics; repaired lazily by the next call.
        assert!(dir.path().join("mod.zip").exists());

        let mut good = CountingSource::new(b"what we wanted");
        let p = cache
            .get_or_fetch("mod.zip", &mut good, Some(&expected), &mut |_| {})
            .unwrap();
        assert_eq!(std::fs::read(&p).unwrap(), b"what we wanted");
    }

    #[test]
    fn reader_source_copies_bundled_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DownloadCache::new(dir.path());
        let mut source = ReaderSource::new(&b"embedded script"[..]);

        let p = cache
            .get_or_fetch("update.sh", &mut source, None, &mut |_| {})
            .unwrap();
        assert_eq!(std::fs::read(&p).unwrap(), b"embedded script");
    }

    #[test]
    fn size_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DownloadCache::new(dir.path());
        assert_eq!(cache.size_bytes(), 0);
        std::fs::write(dir.path().join("a.bin"), vec![0u8; 100]).unwrap();
        std::fs::write(dir.path().join("b.bin"), vec![0u8; 50]).unwrap();
        assert_eq!(cache.size_bytes(), 150);
        cache.clear().unwrap();
        assert_eq!(cache.size_bytes(), 0);
    }

    #[test]
    fn human_size_suffixes() {
        assert_eq!(human_size(0), "0 B");
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn key_lock_map_stays_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DownloadCache::new(dir.path());

        for i in 0..16 {
            let mut source = CountingSource::new(b"bytes");
            cache
                .get_or_fetch(&format!("pkg-{}.zip", i), &mut source, None, &mut |_| {})
                .unwrap();
        }

        let locks = cache.locks.lock().unwrap();
        assert!(locks.is_empty(), "idle lock entries must be pruned");
    }
}
