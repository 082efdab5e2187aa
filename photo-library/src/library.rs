use crate::models::{AuthorizationStatus, DateRange, ImageRequestOptions, LibraryAsset, MediaKind};
use crate::thumbnail::ThumbnailError;
use async_trait::async_trait;
use std::path::PathBuf;

/// Error type for photo library operations
#[derive(Debug)]
pub enum LibraryError {
    /// Library access not granted
    PermissionDenied,
    /// Identifier no longer resolves to an asset
    NotFound(String),
    /// Asset exists but its data could not be delivered (e.g. cloud fetch failed)
    Unavailable(String),
    Thumbnail(ThumbnailError),
    IoError(std::io::Error),
    Other(String),
}

impl std::fmt::Display for LibraryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LibraryError::PermissionDenied => write!(f, "Photo library access denied"),
            LibraryError::NotFound(id) => write!(f, "Asset not found: {}", id),
            LibraryError::Unavailable(msg) => write!(f, "Asset unavailable: {}", msg),
            LibraryError::Thumbnail(e) => write!(f, "Thumbnail error: {}", e),
            LibraryError::IoError(e) => write!(f, "IO error: {}", e),
            LibraryError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for LibraryError {}

impl From<std::io::Error> for LibraryError {
    fn from(err: std::io::Error) -> Self {
        LibraryError::IoError(err)
    }
}

impl From<ThumbnailError> for LibraryError {
    fn from(err: ThumbnailError) -> Self {
        LibraryError::Thumbnail(err)
    }
}

/// The device photo library as seen by the journal.
///
/// Implementations wrap the platform media store. All calls are async and
/// may touch the network when `network_access_allowed` is set.
#[async_trait]
pub trait PhotoLibrary: Send + Sync {
    /// Current authorization, never prompts
    fn authorization_status(&self) -> AuthorizationStatus;

    /// Prompts the user when undetermined and returns the resulting status
    async fn request_authorization(&self) -> AuthorizationStatus;

    /// Assets of the given kinds whose capture timestamp lies inside `range`.
    /// No ordering guarantee.
    async fn fetch_assets(
        &self,
        range: &DateRange,
        kinds: &[MediaKind],
    ) -> Result<Vec<LibraryAsset>, LibraryError>;

    async fn resolve_asset(&self, identifier: &str) -> Result<LibraryAsset, LibraryError>;

    /// Encoded image bytes for a photo asset
    async fn request_image_data(
        &self,
        asset: &LibraryAsset,
        options: &ImageRequestOptions,
    ) -> Result<Vec<u8>, LibraryError>;

    /// Location of the underlying video file; the caller copies it
    async fn request_video_file(&self, asset: &LibraryAsset) -> Result<PathBuf, LibraryError>;

    /// Rendered still for display (photos and videos), JPEG encoded
    async fn request_thumbnail(
        &self,
        asset: &LibraryAsset,
        options: &ImageRequestOptions,
    ) -> Result<Vec<u8>, LibraryError>;
}
