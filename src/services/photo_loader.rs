//! Resolves stored media into displayable JPEG bytes.
//!
//! Lookup order: the copy in app storage, then the library asset by stored
//! identifier, then identifiers encoded in filenames of early imports.
//! Loading never changes persisted state.

use crate::error::AppError;
use crate::models::{Photo, Trip};
use crate::storage::MediaStore;
use photo_library::{
    encode_jpeg, video_placeholder, ImageRequestOptions, LibraryError, MediaKind, PhotoLibrary,
    ThumbnailError, ThumbnailGate, VideoFrameSampler,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Filename prefixes of imports that stored the library reference instead
/// of a copy
pub const LEGACY_IDENTIFIER_PREFIXES: [&str; 2] = ["asset://", "ph://"];

/// Library identifier encoded in a legacy filename, if any
pub fn decode_legacy_identifier(filename: &str) -> Option<&str> {
    for prefix in LEGACY_IDENTIFIER_PREFIXES {
        if let Some(identifier) = filename.strip_prefix(prefix) {
            return (!identifier.is_empty()).then_some(identifier);
        }
    }

    if filename.contains(':') || filename.contains("/L0/") {
        return Some(filename);
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    /// Copy in app storage
    Local,
    /// Rendered by the photo library
    Library,
    /// Generated video tile
    Placeholder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayImage {
    pub bytes: Vec<u8>,
    pub source: ImageSource,
}

#[derive(Debug)]
pub enum LoadError {
    /// Neither a stored copy nor a library asset exists
    NotFound,
    Library(LibraryError),
    Render(ThumbnailError),
}

impl LoadError {
    /// Whether showing a retry action makes sense
    pub fn is_retryable(&self) -> bool {
        match self {
            LoadError::NotFound => false,
            LoadError::Library(LibraryError::PermissionDenied) => false,
            LoadError::Library(LibraryError::NotFound(_)) => false,
            LoadError::Library(_) => true,
            LoadError::Render(_) => false,
        }
    }
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::NotFound => write!(f, "Media not found"),
            LoadError::Library(e) => write!(f, "Photo library error: {}", e),
            LoadError::Render(e) => write!(f, "Render error: {}", e),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<LibraryError> for LoadError {
    fn from(err: LibraryError) -> Self {
        match err {
            LibraryError::NotFound(_) => LoadError::NotFound,
            other => LoadError::Library(other),
        }
    }
}

impl From<ThumbnailError> for LoadError {
    fn from(err: ThumbnailError) -> Self {
        LoadError::Render(err)
    }
}

#[derive(Clone)]
pub struct PhotoLoader {
    store: MediaStore,
    library: Arc<dyn PhotoLibrary>,
    gate: ThumbnailGate,
    sampler: Arc<dyn VideoFrameSampler>,
    thumbnail_size: u32,
}

impl PhotoLoader {
    pub fn new(
        store: MediaStore,
        library: Arc<dyn PhotoLibrary>,
        gate: ThumbnailGate,
        sampler: Arc<dyn VideoFrameSampler>,
        thumbnail_size: u32,
    ) -> Self {
        Self {
            store,
            library,
            gate,
            sampler,
            thumbnail_size,
        }
    }

    pub async fn load_display_image(
        &self,
        filename: &str,
        asset_identifier: Option<&str>,
        kind: MediaKind,
    ) -> Result<DisplayImage, LoadError> {
        self.load(Some(filename), asset_identifier, kind).await
    }

    pub async fn load_photo(&self, photo: &Photo) -> Result<DisplayImage, LoadError> {
        self.load(
            Some(photo.filename.as_str()),
            photo.asset_identifier.as_deref(),
            photo.kind,
        )
        .await
    }

    /// Cover image of a trip
    pub async fn load_feature_photo(&self, trip: &Trip) -> Result<DisplayImage, LoadError> {
        self.load(
            trip.feature_photo_filename.as_deref(),
            trip.feature_photo_asset_id.as_deref(),
            MediaKind::Photo,
        )
        .await
    }

    async fn load(
        &self,
        filename: Option<&str>,
        asset_identifier: Option<&str>,
        kind: MediaKind,
    ) -> Result<DisplayImage, LoadError> {
        if let Some(filename) = filename.filter(|f| self.store.exists(f)) {
            match self.load_local(filename, kind).await {
                Ok(image) => return Ok(image),
                Err(e) => log::warn!("Stored copy {} unreadable: {}", filename, e),
            }
        }

        let identifier = asset_identifier.or_else(|| filename.and_then(decode_legacy_identifier));
        match identifier {
            Some(identifier) => self.load_from_library(identifier, kind).await,
            None => Err(LoadError::NotFound),
        }
    }

    async fn load_local(&self, filename: &str, kind: MediaKind) -> Result<DisplayImage, AppError> {
        match kind {
            MediaKind::Photo => Ok(DisplayImage {
                bytes: self.store.read_async(filename.to_string()).await?,
                source: ImageSource::Local,
            }),
            MediaKind::Video => match self.sample_video(self.store.path_for(filename)?).await {
                Ok(bytes) => Ok(DisplayImage {
                    bytes,
                    source: ImageSource::Local,
                }),
                Err(e) => {
                    log::debug!("No still for {}: {}", filename, e);
                    Ok(self.placeholder()?)
                }
            },
        }
    }

    async fn load_from_library(
        &self,
        identifier: &str,
        kind: MediaKind,
    ) -> Result<DisplayImage, LoadError> {
        let options = ImageRequestOptions::thumbnail(self.thumbnail_size);
        let result = self
            .gate
            .run(async {
                let asset = self.library.resolve_asset(identifier).await?;
                self.library.request_thumbnail(&asset, &options).await
            })
            .await;

        match (result, kind) {
            (Ok(bytes), _) => Ok(DisplayImage {
                bytes,
                source: ImageSource::Library,
            }),
            (Err(LibraryError::NotFound(_)), _) => Err(LoadError::NotFound),
            (Err(LibraryError::PermissionDenied), _) => {
                Err(LoadError::Library(LibraryError::PermissionDenied))
            }
            (Err(e), MediaKind::Video) => {
                log::debug!("No library still for video {}: {}", identifier, e);
                Ok(self.placeholder()?)
            }
            (Err(e), MediaKind::Photo) => Err(e.into()),
        }
    }

    async fn sample_video(&self, path: PathBuf) -> Result<Vec<u8>, ThumbnailError> {
        let sampler = self.sampler.clone();
        tokio::task::spawn_blocking(move || {
            let frame = sampler.sample_first_frame(&path)?;
            encode_jpeg(&frame)
        })
        .await
        .map_err(|e| ThumbnailError::TaskError(format!("Task join error: {}", e)))?
    }

    fn placeholder(&self) -> Result<DisplayImage, ThumbnailError> {
        Ok(DisplayImage {
            bytes: video_placeholder(self.thumbnail_size)?,
            source: ImageSource::Placeholder,
        })
    }
}
