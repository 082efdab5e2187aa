//! In-memory photo library.
//!
//! Stands in for the platform library in tests and previews. Assets are
//! registered up front; an asset registered without data behaves like a
//! cloud-only original whose download fails.

use crate::library::{LibraryError, PhotoLibrary};
use crate::models::{AuthorizationStatus, DateRange, ImageRequestOptions, LibraryAsset, MediaKind};
use crate::thumbnail::render_thumbnail_async;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone)]
struct StoredAsset {
    asset: LibraryAsset,
    data: Option<Vec<u8>>,
    video_path: Option<PathBuf>,
}

#[derive(Debug)]
pub struct MemoryLibrary {
    status: Mutex<AuthorizationStatus>,
    granted_on_prompt: AuthorizationStatus,
    assets: Mutex<Vec<StoredAsset>>,
    thumbnail_requests: AtomicUsize,
}

impl MemoryLibrary {
    /// Library with full access
    pub fn new() -> Self {
        Self::with_status(AuthorizationStatus::Authorized)
    }

    pub fn with_status(status: AuthorizationStatus) -> Self {
        Self {
            status: Mutex::new(status),
            granted_on_prompt: AuthorizationStatus::Authorized,
            assets: Mutex::new(Vec::new()),
            thumbnail_requests: AtomicUsize::new(0),
        }
    }

    /// Status the simulated prompt resolves to
    pub fn grant_on_prompt(mut self, status: AuthorizationStatus) -> Self {
        self.granted_on_prompt = status;
        self
    }

    pub fn set_status(&self, status: AuthorizationStatus) {
        *lock(&self.status) = status;
    }

    pub fn add_photo(
        &self,
        identifier: &str,
        creation_date: Option<DateTime<Utc>>,
        data: Vec<u8>,
    ) -> LibraryAsset {
        self.insert(StoredAsset {
            asset: LibraryAsset::new(identifier, MediaKind::Photo, creation_date),
            data: Some(data),
            video_path: None,
        })
    }

    pub fn add_video(
        &self,
        identifier: &str,
        creation_date: Option<DateTime<Utc>>,
        path: impl Into<PathBuf>,
    ) -> LibraryAsset {
        self.insert(StoredAsset {
            asset: LibraryAsset::new(identifier, MediaKind::Video, creation_date),
            data: None,
            video_path: Some(path.into()),
        })
    }

    /// Asset whose payload can never be delivered
    pub fn add_unavailable(
        &self,
        identifier: &str,
        kind: MediaKind,
        creation_date: Option<DateTime<Utc>>,
    ) -> LibraryAsset {
        self.insert(StoredAsset {
            asset: LibraryAsset::new(identifier, kind, creation_date),
            data: None,
            video_path: None,
        })
    }

    /// Removes an asset, as if the user deleted it from the device
    pub fn remove(&self, identifier: &str) {
        lock(&self.assets).retain(|stored| stored.asset.local_identifier != identifier);
    }

    /// Number of thumbnail requests served so far
    pub fn thumbnail_requests(&self) -> usize {
        self.thumbnail_requests.load(Ordering::SeqCst)
    }

    fn insert(&self, stored: StoredAsset) -> LibraryAsset {
        let asset = stored.asset.clone();
        let mut assets = lock(&self.assets);
        assets.retain(|s| s.asset.local_identifier != asset.local_identifier);
        assets.push(stored);
        asset
    }

    fn find(&self, identifier: &str) -> Result<StoredAsset, LibraryError> {
        lock(&self.assets)
            .iter()
            .find(|s| s.asset.local_identifier == identifier)
            .cloned()
            .ok_or_else(|| LibraryError::NotFound(identifier.to_string()))
    }

    fn ensure_readable(&self) -> Result<(), LibraryError> {
        if self.authorization_status().permits_read() {
            Ok(())
        } else {
            Err(LibraryError::PermissionDenied)
        }
    }
}

impl Default for MemoryLibrary {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl PhotoLibrary for MemoryLibrary {
    fn authorization_status(&self) -> AuthorizationStatus {
        *lock(&self.status)
    }

    async fn request_authorization(&self) -> AuthorizationStatus {
        let mut status = lock(&self.status);
        if *status == AuthorizationStatus::NotDetermined {
            *status = self.granted_on_prompt;
        }
        *status
    }

    async fn fetch_assets(
        &self,
        range: &DateRange,
        kinds: &[MediaKind],
    ) -> Result<Vec<LibraryAsset>, LibraryError> {
        self.ensure_readable()?;
        Ok(lock(&self.assets)
            .iter()
            .filter(|s| kinds.contains(&s.asset.kind))
            .filter(|s| s.asset.creation_date.is_some_and(|ts| range.contains(ts)))
            .map(|s| s.asset.clone())
            .collect())
    }

    async fn resolve_asset(&self, identifier: &str) -> Result<LibraryAsset, LibraryError> {
        self.ensure_readable()?;
        self.find(identifier).map(|s| s.asset)
    }

    async fn request_image_data(
        &self,
        asset: &LibraryAsset,
        options: &ImageRequestOptions,
    ) -> Result<Vec<u8>, LibraryError> {
        self.ensure_readable()?;
        let stored = self.find(&asset.local_identifier)?;
        if stored.asset.kind != MediaKind::Photo {
            return Err(LibraryError::Other(format!(
                "{} is not a photo",
                asset.local_identifier
            )));
        }
        let data = stored.data.ok_or_else(|| {
            LibraryError::Unavailable(format!("{}: download failed", asset.local_identifier))
        })?;
        match options.target_size {
            Some(size) => Ok(render_thumbnail_async(data, size, options.content_mode).await?),
            None => Ok(data),
        }
    }

    async fn request_video_file(&self, asset: &LibraryAsset) -> Result<PathBuf, LibraryError> {
        self.ensure_readable()?;
        let stored = self.find(&asset.local_identifier)?;
        stored.video_path.ok_or_else(|| {
            LibraryError::Unavailable(format!("{}: no video file", asset.local_identifier))
        })
    }

    async fn request_thumbnail(
        &self,
        asset: &LibraryAsset,
        options: &ImageRequestOptions,
    ) -> Result<Vec<u8>, LibraryError> {
        self.ensure_readable()?;
        self.thumbnail_requests.fetch_add(1, Ordering::SeqCst);
        let stored = self.find(&asset.local_identifier)?;
        let data = stored.data.ok_or_else(|| {
            LibraryError::Unavailable(format!("{}: no still available", asset.local_identifier))
        })?;
        let size = options.target_size.unwrap_or(600);
        Ok(render_thumbnail_async(data, size, options.content_mode).await?)
    }
}
