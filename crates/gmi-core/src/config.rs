use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Network knobs for downloads (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Overall transfer timeout in seconds. Mod archives run to several GB,
    /// so the default is a full hour.
    pub transfer_timeout_secs: u64,
    /// Abort when the transfer rate stays below this many bytes/sec...
    pub low_speed_limit_bytes: u32,
    /// ...for this many seconds.
    pub low_speed_time_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            transfer_timeout_secs: 3600,
            low_speed_limit_bytes: 1024,
            low_speed_time_secs: 60,
        }
    }
}

/// How to recognize the original game installation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// File whose presence marks a game directory (e.g. the main executable).
    pub binary_name: String,
    /// File inside the game directory holding the installed version string.
    pub version_file: String,
    /// Directories to scan for the game, in order.
    #[serde(default)]
    pub search_roots: Vec<PathBuf>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            binary_name: "Game.exe".to_string(),
            version_file: "version.txt".to_string(),
            search_roots: Vec::new(),
        }
    }
}

/// Global configuration loaded from `~/.config/gmi/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GmiConfig {
    /// Release feed listing installer builds (JSON array of releases).
    pub release_feed_url: String,
    /// URL of the mod package archive to install.
    #[serde(default)]
    pub mod_package_url: Option<String>,
    /// Expected SHA-256 (hex) of the mod package; verified after download when set.
    #[serde(default)]
    pub mod_package_sha256: Option<String>,
    /// Where to install; defaults to the current directory at run time.
    #[serde(default)]
    pub target_install_dir: Option<PathBuf>,
    /// Game detection settings.
    #[serde(default)]
    pub game: GameConfig,
    /// Optional network overrides; built-in defaults are used when missing.
    #[serde(default)]
    pub network: Option<NetworkConfig>,
}

impl Default for GmiConfig {
    fn default() -> Self {
        Self {
            release_feed_url: "https://api.github.com/repos/gmi-project/gmi/releases".to_string(),
            mod_package_url: None,
            mod_package_sha256: None,
            target_install_dir: None,
            game: GameConfig::default(),
            network: None,
        }
    }
}

impl GmiConfig {
    /// Effective network settings (section or defaults).
    pub fn network(&self) -> NetworkConfig {
        self.network.clone().unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("gmi")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<GmiConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = GmiConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: GmiConfig = toml::from_str(&data)?;
    Ok(cfg)
}
