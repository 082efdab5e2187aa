//! # Photo Library
//!
//! Access to the device photo library for the travel journal.
//!
//! This crate provides the platform-facing half of media import:
//! - Asset handles, authorization status and request options
//! - The [`PhotoLibrary`] trait every platform backend implements
//! - A folder-backed library for desktop builds and an in-memory library for tests
//! - EXIF capture-date extraction
//! - Thumbnail rendering (JPEG), including the video placeholder tile
//! - A bounded gate for thumbnail requests in large picker grids
//!
//! ## Platform Separation
//!
//! Persistence and day bucketing live in the application crate. Everything
//! here only knows about assets and bytes.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use photo_library::{DateRange, FolderLibrary, MediaKind, PhotoLibrary};
//!
//! let library = FolderLibrary::new("/home/me/Pictures/Urlaub");
//! let assets = library
//!     .fetch_assets(&range, &[MediaKind::Photo, MediaKind::Video])
//!     .await?;
//! ```

pub mod folder;
pub mod gate;
pub mod library;
pub mod memory;
pub mod metadata;
pub mod models;
pub mod thumbnail;

pub use folder::FolderLibrary;
pub use gate::{ThumbnailGate, DEFAULT_THUMBNAIL_CONCURRENCY};
pub use library::{LibraryError, PhotoLibrary};
pub use memory::MemoryLibrary;
pub use metadata::{capture_date_from_bytes, parse_exif_datetime, EXIF_DATE_FORMAT};
pub use models::{
    AuthorizationStatus, ContentMode, DateRange, DeliveryQuality, ImageRequestOptions,
    LibraryAsset, MediaKind, UnknownMediaKind,
};
pub use thumbnail::{
    encode_jpeg, render_thumbnail, render_thumbnail_async, video_placeholder, NoVideoDecoder,
    ThumbnailError, VideoFrameSampler,
};
