use photo_library::{LibraryError, ThumbnailError};
use std::fmt;

/// Central error types for the travel journal
#[derive(Debug)]
pub enum AppError {
    /// Database error (rusqlite)
    Database(rusqlite::Error),
    /// Filesystem error
    Filesystem(std::io::Error),
    /// Validation error (e.g. invalid inputs)
    Validation(String),
    /// Resource not found
    NotFound(String),
    /// Photo library access not granted
    PermissionDenied(String),
    /// Photo library request failed
    Library(LibraryError),
    /// Image processing error
    ImageProcessing(String),
    /// Configuration could not be read or written
    Config(String),
    /// General error
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Database(e) => write!(f, "Database error: {}", e),
            AppError::Filesystem(e) => write!(f, "Filesystem error: {}", e),
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            AppError::Library(e) => write!(f, "Photo library error: {}", e),
            AppError::ImageProcessing(msg) => write!(f, "Image processing error: {}", msg),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AppError {}

// Conversions from other error types
impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Database(e)
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Filesystem(e)
    }
}

impl From<LibraryError> for AppError {
    fn from(e: LibraryError) -> Self {
        match e {
            LibraryError::PermissionDenied => {
                AppError::PermissionDenied("photo library".to_string())
            }
            other => AppError::Library(other),
        }
    }
}

impl From<ThumbnailError> for AppError {
    fn from(e: ThumbnailError) -> Self {
        AppError::ImageProcessing(e.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(e: toml::de::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for AppError {
    fn from(e: toml::ser::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

/// User-friendly error messages for UI
impl AppError {
    pub fn user_message(&self) -> String {
        match self {
            AppError::Database(_) => "A database error occurred. Please try again.".to_string(),
            AppError::Filesystem(_) => {
                "Error accessing files. Please check app permissions.".to_string()
            }
            AppError::Validation(msg) => msg.clone(),
            AppError::NotFound(msg) => format!("{} was not found.", msg),
            AppError::PermissionDenied(msg) => format!("Permission required: {}", msg),
            AppError::Library(_) => {
                "The photo could not be loaded from your library.".to_string()
            }
            AppError::ImageProcessing(_) => "Error processing image.".to_string(),
            AppError::Config(_) => "The settings file could not be read.".to_string(),
            AppError::Other(msg) => msg.clone(),
        }
    }
}
