//! Copies library assets into app storage and attaches them to days.
//!
//! Assets of a batch are processed one after another. A failing asset is
//! logged and reported, the rest of the batch still runs.

use crate::calendar::Calendar;
use crate::error::AppError;
use crate::models::{Day, Photo, Trip};
use crate::notifications::{JournalEvent, Notifications};
use crate::services::duplicate_detector::DuplicateDetector;
use crate::services::{day_service, photo_service, trip_service};
use crate::storage::MediaStore;
use chrono::{DateTime, Utc};
use photo_library::{
    capture_date_from_bytes, ImageRequestOptions, LibraryAsset, MediaKind, PhotoLibrary,
};
use rusqlite::Connection;
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

/// Assets processed so far out of the batch size
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportProgress {
    pub current: usize,
    pub total: usize,
}

impl ImportProgress {
    pub fn is_finished(&self) -> bool {
        self.current >= self.total
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportFailure {
    pub asset_identifier: String,
    pub reason: String,
}

/// What happened to each asset of a batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub imported: Vec<Photo>,
    /// Identifiers skipped because they are already attached
    pub duplicates: Vec<String>,
    /// Identifiers whose capture time falls on no day of the trip
    pub without_day: Vec<String>,
    pub failed: Vec<ImportFailure>,
}

impl ImportReport {
    pub fn imported_ids(&self) -> Vec<Uuid> {
        self.imported.iter().map(|p| p.uuid).collect()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeaturePhotoOutcome {
    Updated { filename: String },
    /// The asset already is the trip's cover image
    AlreadySet,
}

enum AssetOutcome {
    Imported(Photo),
    Duplicate,
}

pub struct MediaImporter {
    library: Arc<dyn PhotoLibrary>,
    store: MediaStore,
    calendar: Calendar,
    detector: DuplicateDetector,
    notifications: Notifications,
    progress: watch::Sender<ImportProgress>,
}

impl MediaImporter {
    pub fn new(
        library: Arc<dyn PhotoLibrary>,
        store: MediaStore,
        calendar: Calendar,
        detector: DuplicateDetector,
        notifications: Notifications,
    ) -> Self {
        let (progress, _) = watch::channel(ImportProgress::default());
        Self {
            library,
            store,
            calendar,
            detector,
            notifications,
            progress,
        }
    }

    /// Progress of the running batch
    pub fn subscribe_progress(&self) -> watch::Receiver<ImportProgress> {
        self.progress.subscribe()
    }

    /// Attaches `assets` to `day`
    pub async fn import_into_day(
        &self,
        conn: &Connection,
        day: &Day,
        assets: &[LibraryAsset],
    ) -> Result<ImportReport, AppError> {
        day_service::get_day(conn, &day.uuid)?;

        let mut report = ImportReport::default();
        self.report_progress(0, assets.len());

        for (index, asset) in assets.iter().enumerate() {
            let outcome = match photo_service::list_day_photos(conn, &day.uuid) {
                Ok(existing) => self.import_asset(conn, day, asset, &existing).await,
                Err(e) => Err(e),
            };
            self.record(&mut report, asset, outcome);
            self.report_progress(index + 1, assets.len());
        }

        log::info!(
            "Imported {} of {} assets into day {}",
            report.imported.len(),
            assets.len(),
            day.date
        );
        if report.has_failures() {
            log::warn!("{} assets of day {} failed to import", report.failed.len(), day.date);
        }
        Ok(report)
    }

    /// Attaches each asset to the trip day its capture time falls on
    pub async fn import_into_trip(
        &self,
        conn: &Connection,
        trip: &Trip,
        assets: &[LibraryAsset],
    ) -> Result<ImportReport, AppError> {
        let days = day_service::list_days(conn, &trip.uuid)?;

        let mut report = ImportReport::default();
        self.report_progress(0, assets.len());

        for (index, asset) in assets.iter().enumerate() {
            match self.day_for(&days, asset.creation_date) {
                Some(day) => {
                    let outcome = match photo_service::list_trip_photos(conn, &trip.uuid) {
                        Ok(existing) => self.import_asset(conn, day, asset, &existing).await,
                        Err(e) => Err(e),
                    };
                    self.record(&mut report, asset, outcome);
                }
                None => {
                    log::info!(
                        "Asset {} lies outside trip {}, skipped",
                        asset.local_identifier,
                        trip.name
                    );
                    report.without_day.push(asset.local_identifier.clone());
                }
            }
            self.report_progress(index + 1, assets.len());
        }

        log::info!(
            "Imported {} of {} assets into trip {}",
            report.imported.len(),
            assets.len(),
            trip.name
        );
        if report.has_failures() {
            log::warn!("{} assets of trip {} failed to import", report.failed.len(), trip.name);
        }
        Ok(report)
    }

    /// Makes `asset` the trip's cover image, replacing the previous one
    pub async fn import_feature_photo(
        &self,
        conn: &Connection,
        trip: &Trip,
        asset: &LibraryAsset,
    ) -> Result<FeaturePhotoOutcome, AppError> {
        let current = trip_service::get_trip(conn, &trip.uuid)?;
        if current.feature_photo_asset_id.as_deref() == Some(asset.local_identifier.as_str()) {
            log::debug!("Asset {} already is the cover of {}", asset.local_identifier, trip.name);
            return Ok(FeaturePhotoOutcome::AlreadySet);
        }
        if asset.kind != MediaKind::Photo {
            return Err(AppError::Validation(
                "Only photos can be used as cover image".to_string(),
            ));
        }

        let bytes = self
            .library
            .request_image_data(asset, &ImageRequestOptions::full_quality())
            .await?;
        let filename = MediaStore::generate_filename(MediaKind::Photo);
        self.store.write_async(filename.clone(), bytes).await?;

        let previous = match trip_service::set_feature_photo(
            conn,
            &trip.uuid,
            &filename,
            Some(&asset.local_identifier),
        ) {
            Ok(previous) => previous,
            Err(e) => {
                log::error!("Failed to save cover image of {}: {}", trip.name, e);
                self.discard(&filename);
                return Err(e);
            }
        };

        if let Some(old) = previous.filter(|old| *old != filename) {
            self.discard(&old);
        }

        log::info!("New cover image for trip {}", trip.name);
        Ok(FeaturePhotoOutcome::Updated { filename })
    }

    async fn import_asset(
        &self,
        conn: &Connection,
        day: &Day,
        asset: &LibraryAsset,
        existing: &[Photo],
    ) -> Result<AssetOutcome, AppError> {
        if self.detector.is_already_added(asset, existing) {
            log::debug!("Asset {} already attached, skipped", asset.local_identifier);
            return Ok(AssetOutcome::Duplicate);
        }

        let filename = MediaStore::generate_filename(asset.kind);
        let capture_date = match asset.kind {
            MediaKind::Photo => {
                let bytes = self
                    .library
                    .request_image_data(asset, &ImageRequestOptions::full_quality())
                    .await?;
                let taken = capture_date_from_bytes(&bytes)
                    .and_then(|naive| self.calendar.local_to_utc(naive));
                self.store.write_async(filename.clone(), bytes).await?;
                taken.unwrap_or_else(|| self.calendar.start_of_day(day.date))
            }
            MediaKind::Video => {
                let source = self.library.request_video_file(asset).await?;
                self.store.copy_from_async(filename.clone(), source).await?;
                self.calendar.start_of_day(day.date)
            }
        };

        match self.save_photo(conn, day, asset, &filename, capture_date) {
            Ok(photo) => {
                self.notifications.publish(JournalEvent::MediaAdded {
                    day_uuid: day.uuid,
                    photo_uuid: photo.uuid,
                });
                Ok(AssetOutcome::Imported(photo))
            }
            Err(e) => {
                log::error!("Failed to save {}: {}", asset.local_identifier, e);
                self.discard(&filename);
                Err(e)
            }
        }
    }

    fn save_photo(
        &self,
        conn: &Connection,
        day: &Day,
        asset: &LibraryAsset,
        filename: &str,
        capture_date: DateTime<Utc>,
    ) -> Result<Photo, AppError> {
        let tx = conn.unchecked_transaction()?;
        let photo = Photo {
            uuid: Uuid::new_v4(),
            day_uuid: day.uuid,
            filename: filename.to_string(),
            asset_identifier: Some(asset.local_identifier.clone()),
            kind: asset.kind,
            caption: None,
            capture_date: Some(capture_date),
            order_index: photo_service::count_day_photos(&tx, &day.uuid)?,
            created_at: Utc::now(),
        };
        photo_service::insert_photo(&tx, &photo)?;
        tx.commit()?;
        Ok(photo)
    }

    fn day_for<'a>(&self, days: &'a [Day], taken: Option<DateTime<Utc>>) -> Option<&'a Day> {
        let taken = taken?;
        days.iter()
            .find(|day| self.calendar.day_window(day.date).contains(taken))
    }

    fn record(
        &self,
        report: &mut ImportReport,
        asset: &LibraryAsset,
        outcome: Result<AssetOutcome, AppError>,
    ) {
        match outcome {
            Ok(AssetOutcome::Imported(photo)) => report.imported.push(photo),
            Ok(AssetOutcome::Duplicate) => report.duplicates.push(asset.local_identifier.clone()),
            Err(e) => {
                log::warn!("Import of {} failed: {}", asset.local_identifier, e);
                report.failed.push(ImportFailure {
                    asset_identifier: asset.local_identifier.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    fn discard(&self, filename: &str) {
        if let Err(e) = self.store.delete(filename) {
            log::warn!("Could not remove {}: {}", filename, e);
        }
    }

    fn report_progress(&self, current: usize, total: usize) {
        self.progress.send_replace(ImportProgress { current, total });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database;
    use chrono::{Duration, FixedOffset, NaiveDate, TimeZone};
    use image::{DynamicImage, Rgb, RgbImage};
    use photo_library::{encode_jpeg, MemoryLibrary};
    use tempfile::TempDir;

    struct Fixture {
        conn: Connection,
        trip: Trip,
        days: Vec<Day>,
        library: Arc<MemoryLibrary>,
        importer: MediaImporter,
        store: MediaStore,
        notifications: Notifications,
        _dir: TempDir,
    }

    fn calendar() -> Calendar {
        Calendar::Fixed(FixedOffset::east_opt(3600).unwrap())
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, day).unwrap()
    }

    fn noon(day: u32) -> DateTime<Utc> {
        calendar()
            .local_to_utc(date(day).and_hms_opt(12, 0, 0).unwrap())
            .unwrap()
    }

    fn setup() -> Fixture {
        let conn = Connection::open_in_memory().unwrap();
        database::schema::init_schema(&conn).unwrap();
        let trip = Trip::new("Sizilien", date(1), date(3));
        trip_service::create_trip(&conn, &trip).unwrap();
        let days = day_service::list_days(&conn, &trip.uuid).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path().join("media"));
        let library = Arc::new(MemoryLibrary::new());
        let notifications = Notifications::default();
        let importer = MediaImporter::new(
            library.clone(),
            store.clone(),
            calendar(),
            DuplicateDetector::default(),
            notifications.clone(),
        );

        Fixture {
            conn,
            trip,
            days,
            library,
            importer,
            store,
            notifications,
            _dir: dir,
        }
    }

    fn jpeg() -> Vec<u8> {
        let img = RgbImage::from_pixel(8, 8, Rgb([200, 120, 40]));
        encode_jpeg(&DynamicImage::ImageRgb8(img)).unwrap()
    }

    /// JPEG carrying a DateTimeOriginal tag
    fn jpeg_with_exif_date(value: &str) -> Vec<u8> {
        assert_eq!(value.len(), 19);
        let mut tiff: Vec<u8> = vec![b'M', b'M', 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08];
        // IFD0: one entry pointing at the Exif IFD at offset 26
        tiff.extend_from_slice(&[0x00, 0x01]);
        tiff.extend_from_slice(&[0x87, 0x69, 0x00, 0x04, 0x00, 0x00, 0x00, 0x01]);
        tiff.extend_from_slice(&[0x00, 0x00, 0x00, 0x1A]);
        tiff.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        // Exif IFD: DateTimeOriginal, ASCII, 20 bytes at offset 44
        tiff.extend_from_slice(&[0x00, 0x01]);
        tiff.extend_from_slice(&[0x90, 0x03, 0x00, 0x02, 0x00, 0x00, 0x00, 0x14]);
        tiff.extend_from_slice(&[0x00, 0x00, 0x00, 0x2C]);
        tiff.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        tiff.extend_from_slice(value.as_bytes());
        tiff.push(0);

        let mut app1 = b"Exif\0\0".to_vec();
        app1.extend_from_slice(&tiff);
        let length = (app1.len() + 2) as u16;

        let plain = jpeg();
        let mut out = vec![0xFF, 0xD8, 0xFF, 0xE1];
        out.extend_from_slice(&length.to_be_bytes());
        out.extend_from_slice(&app1);
        out.extend_from_slice(&plain[2..]);
        out
    }

    fn video_file(dir: &TempDir, name: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, b"not really a movie").unwrap();
        path
    }

    #[tokio::test]
    async fn test_import_photo_and_video_into_empty_day() {
        let f = setup();
        let day = &f.days[1];
        let photo = f.library.add_photo("IMG_1", Some(noon(2)), jpeg());
        let video = f
            .library
            .add_video("MOV_1", Some(noon(2)), video_file(&f._dir, "clip.mov"));

        let report = f
            .importer
            .import_into_day(&f.conn, day, &[photo, video])
            .await
            .unwrap();

        assert_eq!(report.imported.len(), 2);
        assert!(report.failed.is_empty());

        let stored = photo_service::list_day_photos(&f.conn, &day.uuid).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].order_index, 0);
        assert_eq!(stored[0].kind, MediaKind::Photo);
        assert!(stored[0].filename.ends_with(".jpg"));
        assert_eq!(stored[1].order_index, 1);
        assert_eq!(stored[1].kind, MediaKind::Video);
        assert!(stored[1].filename.ends_with(".mov"));

        // No EXIF in either: both fall back to the start of the day
        let start = calendar().start_of_day(day.date);
        assert!(stored.iter().all(|p| p.capture_date == Some(start)));
        assert_eq!(stored[1].asset_identifier.as_deref(), Some("MOV_1"));
        assert_eq!(f.store.read(&stored[1].filename).unwrap(), b"not really a movie");
    }

    #[tokio::test]
    async fn test_exif_capture_date_in_calendar_zone() {
        let f = setup();
        let asset = f
            .library
            .add_photo("IMG_EXIF", Some(noon(1)), jpeg_with_exif_date("2025:09:01 18:30:05"));

        let report = f
            .importer
            .import_into_day(&f.conn, &f.days[0], &[asset])
            .await
            .unwrap();

        let expected = Utc.with_ymd_and_hms(2025, 9, 1, 17, 30, 5).unwrap();
        assert_eq!(report.imported[0].capture_date, Some(expected));
    }

    #[tokio::test]
    async fn test_same_asset_twice_is_one_row() {
        let f = setup();
        let asset = f.library.add_photo("IMG_1", Some(noon(1)), jpeg());

        f.importer
            .import_into_day(&f.conn, &f.days[0], &[asset.clone()])
            .await
            .unwrap();
        let report = f
            .importer
            .import_into_day(&f.conn, &f.days[0], &[asset.clone(), asset])
            .await
            .unwrap();

        assert!(report.imported.is_empty());
        assert_eq!(report.duplicates, vec!["IMG_1".to_string(), "IMG_1".to_string()]);
        assert_eq!(photo_service::count_day_photos(&f.conn, &f.days[0].uuid).unwrap(), 1);
        assert_eq!(f.store.list_files().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_nothing_and_batch_continues() {
        let f = setup();
        let broken = f
            .library
            .add_unavailable("CLOUD_1", MediaKind::Photo, Some(noon(1)));
        let good = f.library.add_photo("IMG_2", Some(noon(1)), jpeg());

        let report = f
            .importer
            .import_into_day(&f.conn, &f.days[0], &[broken, good])
            .await
            .unwrap();

        assert!(report.has_failures());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].asset_identifier, "CLOUD_1");
        assert_eq!(report.imported.len(), 1);
        assert_eq!(report.imported[0].order_index, 0);

        let stored = photo_service::list_day_photos(&f.conn, &f.days[0].uuid).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(report.imported_ids(), vec![stored[0].uuid]);
        assert_eq!(f.store.list_files().unwrap(), vec![stored[0].filename.clone()]);
    }

    #[tokio::test]
    async fn test_trip_import_buckets_by_day() {
        let f = setup();
        let first = f.library.add_photo("IMG_A", Some(noon(1)), jpeg());
        let third = f.library.add_photo("IMG_C", Some(noon(3)), jpeg());
        let late_evening = f.library.add_photo(
            "IMG_LATE",
            Some(calendar().start_of_day(date(3)) + Duration::hours(24) - Duration::seconds(1)),
            jpeg(),
        );
        let outside = f.library.add_photo("IMG_OUT", Some(noon(5)), jpeg());
        let undated = f.library.add_photo("IMG_NODATE", None, jpeg());

        let report = f
            .importer
            .import_into_trip(&f.conn, &f.trip, &[first, third, late_evening, outside, undated])
            .await
            .unwrap();

        assert_eq!(report.imported.len(), 3);
        assert_eq!(
            report.without_day,
            vec!["IMG_OUT".to_string(), "IMG_NODATE".to_string()]
        );

        assert_eq!(photo_service::count_day_photos(&f.conn, &f.days[0].uuid).unwrap(), 1);
        assert_eq!(photo_service::count_day_photos(&f.conn, &f.days[1].uuid).unwrap(), 0);
        let third_day = photo_service::list_day_photos(&f.conn, &f.days[2].uuid).unwrap();
        let ids: Vec<_> = third_day
            .iter()
            .map(|p| p.asset_identifier.as_deref().unwrap())
            .collect();
        assert_eq!(ids, vec!["IMG_C", "IMG_LATE"]);
    }

    #[tokio::test]
    async fn test_trip_import_skips_assets_on_other_days() {
        let f = setup();
        let asset = f.library.add_photo("IMG_A", Some(noon(1)), jpeg());
        f.importer
            .import_into_day(&f.conn, &f.days[0], &[asset.clone()])
            .await
            .unwrap();

        let report = f
            .importer
            .import_into_trip(&f.conn, &f.trip, &[asset])
            .await
            .unwrap();
        assert_eq!(report.duplicates, vec!["IMG_A".to_string()]);
    }

    #[tokio::test]
    async fn test_progress_and_events() {
        let f = setup();
        let mut events = f.notifications.subscribe();
        let progress = f.importer.subscribe_progress();
        let a = f.library.add_photo("IMG_1", Some(noon(1)), jpeg());
        let b = f.library.add_photo("IMG_2", Some(noon(1)), jpeg());

        let report = f
            .importer
            .import_into_day(&f.conn, &f.days[0], &[a, b])
            .await
            .unwrap();

        assert_eq!(*progress.borrow(), ImportProgress { current: 2, total: 2 });
        assert!(progress.borrow().is_finished());
        for photo in &report.imported {
            assert_eq!(
                events.try_recv().unwrap(),
                JournalEvent::MediaAdded {
                    day_uuid: f.days[0].uuid,
                    photo_uuid: photo.uuid
                }
            );
        }
    }

    #[tokio::test]
    async fn test_feature_photo_replaces_previous_file() {
        let f = setup();
        let first = f.library.add_photo("COVER_1", Some(noon(1)), jpeg());
        let second = f.library.add_photo("COVER_2", Some(noon(2)), jpeg());

        let FeaturePhotoOutcome::Updated { filename: old } = f
            .importer
            .import_feature_photo(&f.conn, &f.trip, &first)
            .await
            .unwrap()
        else {
            panic!("first cover not stored");
        };
        assert!(f.store.exists(&old));

        assert_eq!(
            f.importer
                .import_feature_photo(&f.conn, &f.trip, &first)
                .await
                .unwrap(),
            FeaturePhotoOutcome::AlreadySet
        );

        let FeaturePhotoOutcome::Updated { filename: new } = f
            .importer
            .import_feature_photo(&f.conn, &f.trip, &second)
            .await
            .unwrap()
        else {
            panic!("second cover not stored");
        };
        assert!(!f.store.exists(&old));
        assert!(f.store.exists(&new));

        let trip = trip_service::get_trip(&f.conn, &f.trip.uuid).unwrap();
        assert_eq!(trip.feature_photo_filename.as_deref(), Some(new.as_str()));
        assert_eq!(trip.feature_photo_asset_id.as_deref(), Some("COVER_2"));
    }
}
