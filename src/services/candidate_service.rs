use crate::calendar::Calendar;
use crate::error::AppError;
use crate::models::{Day, Photo, Trip};
use crate::services::duplicate_detector::DuplicateDetector;
use crate::services::photo_service;
use photo_library::{DateRange, LibraryAsset, LibraryError, MediaKind, PhotoLibrary};
use rusqlite::Connection;
use std::sync::Arc;

/// Library asset offered in a picker
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub asset: LibraryAsset,
    pub already_added: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateList {
    /// Newest first
    pub candidates: Vec<Candidate>,
    /// Library access is missing; the list is empty
    pub permission_denied: bool,
}

impl CandidateList {
    fn denied() -> Self {
        Self {
            candidates: Vec::new(),
            permission_denied: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Candidates not yet attached
    pub fn selectable(&self) -> impl Iterator<Item = &LibraryAsset> {
        self.candidates
            .iter()
            .filter(|c| !c.already_added)
            .map(|c| &c.asset)
    }
}

#[derive(Clone)]
pub struct CandidateFetcher {
    library: Arc<dyn PhotoLibrary>,
    calendar: Calendar,
    detector: DuplicateDetector,
}

impl CandidateFetcher {
    pub fn new(
        library: Arc<dyn PhotoLibrary>,
        calendar: Calendar,
        detector: DuplicateDetector,
    ) -> Self {
        Self {
            library,
            calendar,
            detector,
        }
    }

    /// Photos and videos taken on `day`, flagged against the day's photos
    pub async fn fetch_for_day(
        &self,
        conn: &Connection,
        day: &Day,
    ) -> Result<CandidateList, AppError> {
        let existing = photo_service::list_day_photos(conn, &day.uuid)?;
        let range = self.calendar.day_window(day.date);
        self.fetch(&range, &[MediaKind::Photo, MediaKind::Video], &existing)
            .await
    }

    /// Photos and videos taken during the trip, flagged against all of its
    /// photos
    pub async fn fetch_for_trip(
        &self,
        conn: &Connection,
        trip: &Trip,
    ) -> Result<CandidateList, AppError> {
        let existing = photo_service::list_trip_photos(conn, &trip.uuid)?;
        let range = self.calendar.range_window(trip.start_date, trip.end_date);
        self.fetch(&range, &[MediaKind::Photo, MediaKind::Video], &existing)
            .await
    }

    /// Photos taken during the trip, flagged against the current cover image
    pub async fn fetch_for_feature_photo(&self, trip: &Trip) -> Result<CandidateList, AppError> {
        let range = self.calendar.range_window(trip.start_date, trip.end_date);
        let mut list = self.fetch(&range, &[MediaKind::Photo], &[]).await?;
        if let Some(current) = trip.feature_photo_asset_id.as_deref() {
            for candidate in &mut list.candidates {
                candidate.already_added = candidate.asset.local_identifier == current;
            }
        }
        Ok(list)
    }

    async fn fetch(
        &self,
        range: &DateRange,
        kinds: &[MediaKind],
        existing: &[Photo],
    ) -> Result<CandidateList, AppError> {
        let status = self.library.authorization_status();
        if !status.permits_read() {
            log::info!("Photo library not readable ({:?}), no candidates", status);
            return Ok(CandidateList::denied());
        }

        let assets = match self.library.fetch_assets(range, kinds).await {
            Ok(assets) => assets,
            Err(LibraryError::PermissionDenied) => {
                log::info!("Photo library access revoked, no candidates");
                return Ok(CandidateList::denied());
            }
            Err(e) => return Err(e.into()),
        };

        let mut candidates: Vec<Candidate> = assets
            .into_iter()
            .filter(|a| kinds.contains(&a.kind))
            .filter(|a| a.creation_date.is_some_and(|ts| range.contains(ts)))
            .map(|asset| Candidate {
                already_added: self.detector.is_already_added(&asset, existing),
                asset,
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.asset
                .creation_date
                .cmp(&a.asset.creation_date)
                .then_with(|| a.asset.local_identifier.cmp(&b.asset.local_identifier))
        });

        log::debug!(
            "{} candidates between {} and {}",
            candidates.len(),
            range.start,
            range.end
        );
        Ok(CandidateList {
            candidates,
            permission_denied: false,
        })
    }
}
