use crate::calendar::Calendar;
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the settings file inside the data directory
pub const CONFIG_FILE: &str = "reisetagebuch.toml";

/// Get the app data directory for the current platform
pub fn get_app_data_dir() -> PathBuf {
    // Desktop builds keep everything next to the binary, like the mobile sandbox
    PathBuf::from("./data")
}

/// Timestamp tolerances for matching legacy photos without asset identifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DedupConfig {
    /// Maximum clock skew between library and stored capture date
    pub tolerance_secs: i64,
    /// Tolerance used when several legacy photos cluster around the candidate
    pub burst_tolerance_secs: i64,
    /// Window around the candidate in which clustering is counted
    pub cluster_window_secs: i64,
    /// Legacy photos inside the window needed to widen the tolerance
    pub cluster_min_photos: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            tolerance_secs: 2,
            burst_tolerance_secs: 5,
            cluster_window_secs: 10,
            cluster_min_photos: 2,
        }
    }
}

/// Application settings, read from `reisetagebuch.toml`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub database_file: String,
    /// Subdirectory of `data_dir` holding imported media
    pub media_dir: String,
    /// Minutes east of UTC, absent for the system zone
    pub utc_offset_minutes: Option<i32>,
    /// Longest edge of display thumbnails in pixels
    pub thumbnail_size: u32,
    /// Concurrent thumbnail requests against the photo library
    pub thumbnail_concurrency: usize,
    /// Default `env_logger` filter when `RUST_LOG` is unset
    pub log_level: String,
    pub dedup: DedupConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: get_app_data_dir(),
            database_file: "reisetagebuch.db".to_string(),
            media_dir: "media".to_string(),
            utc_offset_minutes: None,
            thumbnail_size: 600,
            thumbnail_concurrency: photo_library::DEFAULT_THUMBNAIL_CONCURRENCY,
            log_level: "info".to_string(),
            dedup: DedupConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads the settings file from the default data directory, falling back
    /// to defaults when it does not exist
    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            log::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        log::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn from_toml(s: &str) -> Result<Self, AppError> {
        Ok(toml::from_str(s)?)
    }

    pub fn to_toml(&self) -> Result<String, AppError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    pub fn media_path(&self) -> PathBuf {
        self.data_dir.join(&self.media_dir)
    }

    pub fn calendar(&self) -> Calendar {
        Calendar::from_offset_minutes(self.utc_offset_minutes)
    }
}
