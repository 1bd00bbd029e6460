//! Streaming HTTP GET over libcurl (via the `curl` crate).
//!
//! One transfer writes the body sequentially to an open file, reporting
//! fractional progress as bytes arrive. The release feed uses the in-memory
//! variant. Timeouts are finite but generous: mod archives can take most of
//! an hour on a slow line.

use crate::config::NetworkConfig;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;

/// Error from a single fetch. Carries the underlying transport text so the
/// caller can surface it verbatim.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Curl reported an error (timeout, connection, TLS, etc.).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// HTTP response had a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Local write failed (e.g. disk full, permission denied).
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
    /// An external cancellation flag was raised mid-transfer.
    #[error("transfer cancelled")]
    Cancelled,
}

/// Timeout and abort knobs for one transfer.
#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    pub connect_timeout: Duration,
    pub transfer_timeout: Duration,
    pub low_speed_limit: u32,
    pub low_speed_time: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::from(&NetworkConfig::default())
    }
}

impl From<&NetworkConfig> for FetchOptions {
    fn from(net: &NetworkConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(net.connect_timeout_secs),
            transfer_timeout: Duration::from_secs(net.transfer_timeout_secs),
            low_speed_limit: net.low_speed_limit_bytes,
            low_speed_time: Duration::from_secs(net.low_speed_time_secs),
        }
    }
}

fn configure(easy: &mut curl::easy::Easy, url: &str, opts: FetchOptions) -> Result<(), FetchError> {
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(opts.connect_timeout)?;
    easy.timeout(opts.transfer_timeout)?;
    easy.low_speed_limit(opts.low_speed_limit)?;
    easy.low_speed_time(opts.low_speed_time)?;
    easy.useragent("gmi")?;
    Ok(())
}

/// Fraction of a transfer completed, clamped to [0, 1]. Zero while the total
/// is still unknown (no Content-Length yet).
pub fn fraction(done: f64, total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    (done / total).clamp(0.0, 1.0)
}

/// Download `url` to `dest`, creating/truncating the file, streaming the body
/// and reporting fractional progress. Returns bytes written.
///
/// `cancel` is polled from the transfer's progress callback; raising it aborts
/// the transfer and surfaces `FetchError::Cancelled`.
pub fn fetch_to_file(
    url: &str,
    dest: &Path,
    progress: &mut dyn FnMut(f64),
    cancel: Option<&AtomicBool>,
    opts: FetchOptions,
) -> Result<u64, FetchError> {
    let mut file = File::create(dest)?;
    let mut written: u64 = 0;
    let mut io_error: Option<std::io::Error> = None;
    let mut cancelled = false;

    let mut easy = curl::easy::Easy::new();
    configure(&mut easy, url, opts)?;
    easy.progress(true)?;

    let perform_result = {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| match file.write_all(data) {
            Ok(()) => {
                written += data.len() as u64;
                Ok(data.len())
            }
            Err(e) => {
                io_error = Some(e);
                Ok(0) // abort transfer
            }
        })?;
        transfer.progress_function(|dltotal, dlnow, _ultotal, _ulnow| {
            if let Some(flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    cancelled = true;
                    return false; // abort transfer
                }
            }
            progress(fraction(dlnow, dltotal));
            true
        })?;
        transfer.perform()
    };

    if let Err(e) = perform_result {
        if let Some(io) = io_error.take() {
            return Err(FetchError::Io(io));
        }
        if cancelled {
            return Err(FetchError::Cancelled);
        }
        return Err(FetchError::Curl(e));
    }

    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        return Err(FetchError::Http(code));
    }

    file.flush()?;
    progress(1.0);
    Ok(written)
}

/// GET `url` and return the body in memory. Used for small payloads only
/// (the release feed); downloads go through `fetch_to_file`.
pub fn fetch_bytes(url: &str, opts: FetchOptions) -> Result<Vec<u8>, FetchError> {
    let mut body: Vec<u8> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    configure(&mut easy, url, opts)?;

    {
        let body = &mut body;
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        return Err(FetchError::Http(code));
    }

    Ok(body)
}

/// Local file name for a download URL: the last non-empty path segment,
/// or `fallback` when the URL has none worth using.
pub fn file_name_for_url(raw: &str, fallback: &str) -> String {
    if let Ok(parsed) = url::Url::parse(raw) {
        if let Some(segments) = parsed.path_segments() {
            if let Some(name) = segments.filter(|s| !s.is_empty()).last() {
                return name.to_string();
            }
        }
    }
    fallback.to_string()
}
