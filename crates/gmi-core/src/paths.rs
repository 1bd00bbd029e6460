//! Well-known directories and path display helpers.

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Root of the download cache: `~/.cache/gmi`. Created lazily by the cache itself.
pub fn cache_root() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("gmi")?;
    Ok(xdg_dirs.get_cache_home())
}

/// Render a path for status lines and logs with the home directory collapsed
/// to `~`. Install paths routinely contain the user name; keep it out of
/// anything a user might paste into a public bug report.
pub fn redacted(path: &Path) -> String {
    if let Some(home) = std::env::var_os("HOME") {
        let home = PathBuf::from(home);
        if let Ok(rest) = path.strip_prefix(&home) {
            if rest.as_os_str().is_empty() {
                return "~".to_string();
            }
            return format!("~/{}", rest.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacted_collapses_home_prefix() {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/home/test".into());
        let p = PathBuf::from(&home).join("games/target");
        assert_eq!(redacted(&p), "~/games/target");
    }

    #[test]
    fn redacted_leaves_foreign_paths_alone() {
        let p = Path::new("/opt/games/target");
        assert_eq!(redacted(p), "/opt/games/target");
    }
}
