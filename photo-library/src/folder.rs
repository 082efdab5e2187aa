//! Folder-backed photo library for desktop builds.
//!
//! A single directory plays the role of the device library. Identifiers are
//! file names inside that directory, capture time comes from EXIF for photos
//! and from the file modification time otherwise.

use crate::library::{LibraryError, PhotoLibrary};
use crate::metadata::capture_date_from_bytes;
use crate::models::{AuthorizationStatus, DateRange, ImageRequestOptions, LibraryAsset, MediaKind};
use crate::thumbnail::{render_thumbnail_async, ThumbnailError};
use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FolderLibrary {
    root: PathBuf,
}

impl FolderLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, identifier: &str) -> Result<PathBuf, LibraryError> {
        if identifier.is_empty()
            || identifier.contains('/')
            || identifier.contains('\\')
            || identifier.contains("..")
        {
            return Err(LibraryError::NotFound(identifier.to_string()));
        }
        let path = self.root.join(identifier);
        if path.is_file() {
            Ok(path)
        } else {
            Err(LibraryError::NotFound(identifier.to_string()))
        }
    }

    fn ensure_readable(&self) -> Result<(), LibraryError> {
        if self.authorization_status().permits_read() {
            Ok(())
        } else {
            Err(LibraryError::PermissionDenied)
        }
    }

    async fn read_file(path: PathBuf) -> Result<Vec<u8>, LibraryError> {
        tokio::task::spawn_blocking(move || fs::read(path))
            .await
            .map_err(|e| LibraryError::Other(format!("Task join error: {}", e)))?
            .map_err(LibraryError::from)
    }
}

/// Builds the asset handle for one file, `None` for unsupported files
fn asset_for_file(path: &Path) -> Option<LibraryAsset> {
    let name = path.file_name()?.to_str()?.to_string();
    let kind = MediaKind::from_extension(path.extension()?.to_str()?)?;

    let exif_date = match kind {
        MediaKind::Photo => fs::read(path)
            .ok()
            .and_then(|bytes| capture_date_from_bytes(&bytes))
            .and_then(|naive| Local.from_local_datetime(&naive).earliest())
            .map(|local| local.with_timezone(&Utc)),
        MediaKind::Video => None,
    };

    let creation_date = exif_date.or_else(|| {
        fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from)
    });

    Some(LibraryAsset::new(name, kind, creation_date))
}

fn scan_folder(root: &Path) -> std::io::Result<Vec<LibraryAsset>> {
    if !root.exists() {
        return Ok(Vec::new());
    }

    let assets = fs::read_dir(root)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter_map(|path| asset_for_file(&path))
        .collect();

    Ok(assets)
}

#[async_trait]
impl PhotoLibrary for FolderLibrary {
    fn authorization_status(&self) -> AuthorizationStatus {
        match fs::read_dir(&self.root) {
            Ok(_) => AuthorizationStatus::Authorized,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                AuthorizationStatus::NotDetermined
            }
            Err(_) => AuthorizationStatus::Denied,
        }
    }

    async fn request_authorization(&self) -> AuthorizationStatus {
        if self.authorization_status() == AuthorizationStatus::NotDetermined {
            if let Err(e) = fs::create_dir_all(&self.root) {
                log::warn!("Could not create library folder {:?}: {}", self.root, e);
            }
        }
        self.authorization_status()
    }

    async fn fetch_assets(
        &self,
        range: &DateRange,
        kinds: &[MediaKind],
    ) -> Result<Vec<LibraryAsset>, LibraryError> {
        self.ensure_readable()?;
        let root = self.root.clone();
        let assets = tokio::task::spawn_blocking(move || scan_folder(&root))
            .await
            .map_err(|e| LibraryError::Other(format!("Task join error: {}", e)))??;

        log::debug!("Folder library {:?}: {} assets", self.root, assets.len());

        Ok(assets
            .into_iter()
            .filter(|a| kinds.contains(&a.kind))
            .filter(|a| a.creation_date.is_some_and(|ts| range.contains(ts)))
            .collect())
    }

    async fn resolve_asset(&self, identifier: &str) -> Result<LibraryAsset, LibraryError> {
        self.ensure_readable()?;
        let path = self.path_for(identifier)?;
        tokio::task::spawn_blocking(move || asset_for_file(&path))
            .await
            .map_err(|e| LibraryError::Other(format!("Task join error: {}", e)))?
            .ok_or_else(|| LibraryError::NotFound(identifier.to_string()))
    }

    async fn request_image_data(
        &self,
        asset: &LibraryAsset,
        options: &ImageRequestOptions,
    ) -> Result<Vec<u8>, LibraryError> {
        self.ensure_readable()?;
        let path = self.path_for(&asset.local_identifier)?;
        let bytes = Self::read_file(path).await?;
        match options.target_size {
            Some(size) => Ok(render_thumbnail_async(bytes, size, options.content_mode).await?),
            None => Ok(bytes),
        }
    }

    async fn request_video_file(&self, asset: &LibraryAsset) -> Result<PathBuf, LibraryError> {
        self.ensure_readable()?;
        if asset.kind != MediaKind::Video {
            return Err(LibraryError::Other(format!(
                "{} is not a video",
                asset.local_identifier
            )));
        }
        self.path_for(&asset.local_identifier)
    }

    async fn request_thumbnail(
        &self,
        asset: &LibraryAsset,
        options: &ImageRequestOptions,
    ) -> Result<Vec<u8>, LibraryError> {
        self.ensure_readable()?;
        if asset.kind == MediaKind::Video {
            return Err(ThumbnailError::Unsupported(format!(
                "No video stills for {}",
                asset.local_identifier
            ))
            .into());
        }
        let path = self.path_for(&asset.local_identifier)?;
        let bytes = Self::read_file(path).await?;
        let size = options.target_size.unwrap_or(600);
        Ok(render_thumbnail_async(bytes, size, options.content_mode).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thumbnail::encode_jpeg;
    use chrono::Duration;

    fn write_jpeg(dir: &Path, name: &str) {
        let img = image::RgbImage::from_pixel(20, 10, image::Rgb([10, 120, 200]));
        let bytes = encode_jpeg(&image::DynamicImage::ImageRgb8(img)).unwrap();
        fs::write(dir.join(name), bytes).unwrap();
    }

    fn around_now() -> DateRange {
        let now = Utc::now();
        DateRange::new(now - Duration::hours(1), now + Duration::hours(1))
    }

    #[tokio::test]
    async fn test_scan_uses_supported_files_only() {
        let dir = tempfile::tempdir().unwrap();
        write_jpeg(dir.path(), "beach.jpg");
        fs::write(dir.path().join("clip.mov"), b"video").unwrap();
        fs::write(dir.path().join("notes.txt"), b"text").unwrap();

        let library = FolderLibrary::new(dir.path());
        let mut assets = library
            .fetch_assets(&around_now(), &[MediaKind::Photo, MediaKind::Video])
            .await
            .unwrap();
        assets.sort_by(|a, b| a.local_identifier.cmp(&b.local_identifier));

        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].local_identifier, "beach.jpg");
        assert_eq!(assets[0].kind, MediaKind::Photo);
        assert_eq!(assets[1].local_identifier, "clip.mov");
        assert_eq!(assets[1].kind, MediaKind::Video);
    }

    #[tokio::test]
    async fn test_resolve_rejects_paths_outside_root() {
        let dir = tempfile::tempdir().unwrap();
        let library = FolderLibrary::new(dir.path());
        let result = library.resolve_asset("../etc/passwd").await;
        assert!(matches!(result, Err(LibraryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_thumbnail_for_photo_and_video() {
        let dir = tempfile::tempdir().unwrap();
        write_jpeg(dir.path(), "beach.jpg");
        fs::write(dir.path().join("clip.mov"), b"video").unwrap();
        let library = FolderLibrary::new(dir.path());

        let photo = library.resolve_asset("beach.jpg").await.unwrap();
        let thumb = library
            .request_thumbnail(&photo, &ImageRequestOptions::thumbnail(8))
            .await
            .unwrap();
        assert!(image::load_from_memory(&thumb).is_ok());

        let video = library.resolve_asset("clip.mov").await.unwrap();
        let result = library
            .request_thumbnail(&video, &ImageRequestOptions::thumbnail(8))
            .await;
        assert!(matches!(result, Err(LibraryError::Thumbnail(_))));
    }

    #[tokio::test]
    async fn test_missing_folder_is_not_determined() {
        let dir = tempfile::tempdir().unwrap();
        let library = FolderLibrary::new(dir.path().join("Bilder"));
        assert_eq!(
            library.authorization_status(),
            AuthorizationStatus::NotDetermined
        );
        assert_eq!(
            library.request_authorization().await,
            AuthorizationStatus::Authorized
        );
    }
}
