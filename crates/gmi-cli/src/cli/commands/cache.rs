//! Cache command: show size or clear the download cache.

use crate::cli::CacheAction;
use anyhow::Result;
use gmi_core::cache::{human_size, DownloadCache};

pub fn run_cache(action: &CacheAction) -> Result<()> {
    let cache = DownloadCache::default_location()?;
    match action {
        CacheAction::Size => {
            let bytes = cache.size_bytes();
            if bytes == 0 {
                println!("{}: empty", cache.root().display());
            } else {
                println!("{}: {}", cache.root().display(), human_size(bytes));
            }
        }
        CacheAction::Clear => {
            cache.clear()?;
            println!("Cache cleared: {}", cache.root().display());
        }
    }
    Ok(())
}
