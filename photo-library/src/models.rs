use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Kind of media an asset (or a stored photo) holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
        }
    }

    /// Extension used for copies in app storage
    pub fn file_extension(&self) -> &str {
        match self {
            MediaKind::Photo => "jpg",
            MediaKind::Video => "mov",
        }
    }

    /// Guesses the kind from a file extension (case-insensitive)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "webp" | "heic" | "heif" => Some(MediaKind::Photo),
            "mov" | "mp4" | "m4v" => Some(MediaKind::Video),
            _ => None,
        }
    }
}

impl FromStr for MediaKind {
    type Err = UnknownMediaKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "photo" => Ok(MediaKind::Photo),
            "video" => Ok(MediaKind::Video),
            other => Err(UnknownMediaKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMediaKind(pub String);

impl std::fmt::Display for UnknownMediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unknown media kind: {:?}", self.0)
    }
}

impl std::error::Error for UnknownMediaKind {}

/// Photo library authorization as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizationStatus {
    NotDetermined,
    Denied,
    Limited,
    Authorized,
}

impl AuthorizationStatus {
    /// Only full and limited access allow reading assets
    pub fn permits_read(&self) -> bool {
        matches!(
            self,
            AuthorizationStatus::Authorized | AuthorizationStatus::Limited
        )
    }
}

/// Handle to an asset in the device photo library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryAsset {
    pub local_identifier: String,
    pub kind: MediaKind,
    pub creation_date: Option<DateTime<Utc>>,
}

impl LibraryAsset {
    pub fn new(
        local_identifier: impl Into<String>,
        kind: MediaKind,
        creation_date: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            local_identifier: local_identifier.into(),
            kind,
            creation_date,
        }
    }
}

/// Half-open time range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts < self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentMode {
    AspectFit,
    AspectFill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryQuality {
    /// May deliver a degraded image first
    Opportunistic,
    HighQuality,
    FastFormat,
}

/// Parameters for an image request against the library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequestOptions {
    /// Longest edge in pixels, `None` for the original
    pub target_size: Option<u32>,
    pub content_mode: ContentMode,
    pub delivery: DeliveryQuality,
    /// Allow fetching cloud-only originals
    pub network_access_allowed: bool,
}

impl ImageRequestOptions {
    /// Original bytes in full quality, network allowed (used for import)
    pub fn full_quality() -> Self {
        Self {
            target_size: None,
            content_mode: ContentMode::AspectFit,
            delivery: DeliveryQuality::HighQuality,
            network_access_allowed: true,
        }
    }

    /// Rendered thumbnail for display
    pub fn thumbnail(size: u32) -> Self {
        Self {
            target_size: Some(size),
            content_mode: ContentMode::AspectFill,
            delivery: DeliveryQuality::Opportunistic,
            network_access_allowed: true,
        }
    }
}
