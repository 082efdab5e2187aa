//! App-private media storage.
//!
//! Imported photos and videos are copied into one flat directory. Filenames
//! are generated tokens (`<uuid>.jpg`, `<uuid>.mov`), never user input.

use crate::error::AppError;
use photo_library::MediaKind;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Fresh unique filename for a copy of `kind`
    pub fn generate_filename(kind: MediaKind) -> String {
        format!("{}.{}", Uuid::new_v4(), kind.file_extension())
    }

    /// Absolute path for a stored filename
    pub fn path_for(&self, filename: &str) -> Result<PathBuf, AppError> {
        validate_filename(filename)?;
        Ok(self.root.join(filename))
    }

    pub fn exists(&self, filename: &str) -> bool {
        self.path_for(filename).map(|p| p.is_file()).unwrap_or(false)
    }

    pub fn read(&self, filename: &str) -> Result<Vec<u8>, AppError> {
        Ok(fs::read(self.path_for(filename)?)?)
    }

    /// Writes `bytes` under `filename`. The file only appears under its final
    /// name once completely written.
    pub fn write(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, AppError> {
        let target = self.path_for(filename)?;
        fs::create_dir_all(&self.root)?;

        let partial = self.root.join(format!(".{}.part", filename));
        if let Err(e) = fs::write(&partial, bytes).and_then(|_| fs::rename(&partial, &target)) {
            let _ = fs::remove_file(&partial);
            return Err(e.into());
        }

        log::debug!("Stored {} ({} bytes)", filename, bytes.len());
        Ok(target)
    }

    /// Copies an external file (e.g. a library video) into the store
    pub fn copy_from(&self, filename: &str, source: &Path) -> Result<PathBuf, AppError> {
        let target = self.path_for(filename)?;
        fs::create_dir_all(&self.root)?;

        let partial = self.root.join(format!(".{}.part", filename));
        match fs::copy(source, &partial).and_then(|_| fs::rename(&partial, &target)) {
            Ok(()) => {
                log::debug!("Copied {:?} to {}", source, filename);
                Ok(target)
            }
            Err(e) => {
                let _ = fs::remove_file(&partial);
                Err(e.into())
            }
        }
    }

    pub async fn write_async(&self, filename: String, bytes: Vec<u8>) -> Result<PathBuf, AppError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.write(&filename, &bytes))
            .await
            .map_err(|e| AppError::Other(format!("Task join error: {}", e)))?
    }

    pub async fn copy_from_async(
        &self,
        filename: String,
        source: PathBuf,
    ) -> Result<PathBuf, AppError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.copy_from(&filename, &source))
            .await
            .map_err(|e| AppError::Other(format!("Task join error: {}", e)))?
    }

    pub async fn read_async(&self, filename: String) -> Result<Vec<u8>, AppError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.read(&filename))
            .await
            .map_err(|e| AppError::Other(format!("Task join error: {}", e)))?
    }

    /// Removes a stored file; a missing file is not an error
    pub fn delete(&self, filename: &str) -> Result<(), AppError> {
        match fs::remove_file(self.path_for(filename)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes a batch of files, logging failures instead of aborting
    pub fn delete_all<'a>(&self, filenames: impl IntoIterator<Item = &'a str>) -> usize {
        let mut removed = 0;
        for filename in filenames {
            match self.delete(filename) {
                Ok(()) => removed += 1,
                Err(e) => log::warn!("Could not remove {}: {}", filename, e),
            }
        }
        removed
    }

    /// List all files in the store
    pub fn list_files(&self) -> Result<Vec<String>, AppError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().to_str().map(|s| s.to_string()))
            .filter(|name| !name.starts_with('.'))
            .collect();

        Ok(entries)
    }
}

fn validate_filename(filename: &str) -> Result<(), AppError> {
    if filename.is_empty()
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains("..")
        || filename.starts_with('.')
    {
        return Err(AppError::Validation(format!(
            "Invalid media filename: {:?}",
            filename
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_filename_extension() {
        let photo = MediaStore::generate_filename(MediaKind::Photo);
        let video = MediaStore::generate_filename(MediaKind::Video);
        assert!(photo.ends_with(".jpg"));
        assert!(video.ends_with(".mov"));
        assert_ne!(photo, MediaStore::generate_filename(MediaKind::Photo));
    }

    #[test]
    fn test_write_read_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path().join("media"));

        store.write("a.jpg", b"jpeg bytes").unwrap();
        assert!(store.exists("a.jpg"));
        assert_eq!(store.read("a.jpg").unwrap(), b"jpeg bytes");
        assert_eq!(store.list_files().unwrap(), vec!["a.jpg".to_string()]);

        store.delete("a.jpg").unwrap();
        assert!(!store.exists("a.jpg"));
        // deleting again is fine
        store.delete("a.jpg").unwrap();
    }

    #[test]
    fn test_copy_from_missing_source_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());

        let result = store.copy_from("b.mov", &dir.path().join("does-not-exist.mov"));
        assert!(result.is_err());
        assert!(!store.exists("b.mov"));
        assert!(store.list_files().unwrap().is_empty());
    }

    #[test]
    fn test_rejects_path_like_filenames() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());

        for name in ["", "../x.jpg", "sub/x.jpg", "..\\x.jpg", ".hidden"] {
            assert!(
                matches!(store.write(name, b"x"), Err(AppError::Validation(_))),
                "{:?} accepted",
                name
            );
        }
    }
}
