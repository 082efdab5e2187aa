//! Wiring of the journal services around one database connection.

use crate::config::AppConfig;
use crate::database;
use crate::error::AppError;
use crate::notifications::Notifications;
use crate::services::{CandidateFetcher, DuplicateDetector, MediaImporter, PhotoLoader};
use crate::storage::MediaStore;
use photo_library::{NoVideoDecoder, PhotoLibrary, ThumbnailGate, VideoFrameSampler};
use rusqlite::Connection;
use std::sync::Arc;

pub struct AppContext {
    pub config: AppConfig,
    pub conn: Connection,
    pub store: MediaStore,
    pub notifications: Notifications,
    pub candidates: CandidateFetcher,
    pub importer: MediaImporter,
    pub loader: PhotoLoader,
    library: Arc<dyn PhotoLibrary>,
}

impl AppContext {
    /// Opens the database from `config` and builds the services on top of
    /// `library`
    pub fn open(config: AppConfig, library: Arc<dyn PhotoLibrary>) -> Result<Self, AppError> {
        let conn = database::init_database(&config)?;
        Ok(Self::with_connection(config, conn, library))
    }

    /// Uses an already initialized connection, e.g. an in-memory database
    pub fn with_connection(
        config: AppConfig,
        conn: Connection,
        library: Arc<dyn PhotoLibrary>,
    ) -> Self {
        let store = MediaStore::new(config.media_path());
        let notifications = Notifications::default();
        let calendar = config.calendar();
        let detector = DuplicateDetector::new(config.dedup.clone());

        let candidates = CandidateFetcher::new(library.clone(), calendar, detector.clone());
        let importer = MediaImporter::new(
            library.clone(),
            store.clone(),
            calendar,
            detector,
            notifications.clone(),
        );
        let loader = PhotoLoader::new(
            store.clone(),
            library.clone(),
            ThumbnailGate::new(config.thumbnail_concurrency),
            Arc::new(NoVideoDecoder),
            config.thumbnail_size,
        );

        log::info!("Journal ready, media in {:?}", store.root());
        Self {
            config,
            conn,
            store,
            notifications,
            candidates,
            importer,
            loader,
            library,
        }
    }

    /// Replaces the video still decoder of the loader
    pub fn with_video_sampler(mut self, sampler: Arc<dyn VideoFrameSampler>) -> Self {
        self.loader = PhotoLoader::new(
            self.store.clone(),
            self.library.clone(),
            ThumbnailGate::new(self.config.thumbnail_concurrency),
            sampler,
            self.config.thumbnail_size,
        );
        self
    }

    pub fn library(&self) -> &Arc<dyn PhotoLibrary> {
        &self.library
    }
}
