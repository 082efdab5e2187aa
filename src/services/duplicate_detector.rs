//! Decides whether a library asset is already attached.
//!
//! A stored asset identifier is authoritative. Photos imported before
//! identifiers were stored are matched by capture time instead, which is a
//! heuristic and can report false positives for burst shots.

use crate::config::DedupConfig;
use crate::models::Photo;
use chrono::{DateTime, Duration, Utc};
use photo_library::LibraryAsset;

#[derive(Debug, Clone, Default)]
pub struct DuplicateDetector {
    config: DedupConfig,
}

impl DuplicateDetector {
    pub fn new(config: DedupConfig) -> Self {
        Self { config }
    }

    /// True when `candidate` matches one of `existing`
    pub fn is_already_added(&self, candidate: &LibraryAsset, existing: &[Photo]) -> bool {
        if existing
            .iter()
            .any(|p| p.asset_identifier.as_deref() == Some(candidate.local_identifier.as_str()))
        {
            return true;
        }

        let Some(taken_at) = candidate.creation_date else {
            return false;
        };

        let legacy: Vec<DateTime<Utc>> = existing
            .iter()
            .filter(|p| p.is_legacy() && p.kind == candidate.kind)
            .map(Photo::reference_timestamp)
            .collect();
        if legacy.is_empty() {
            return false;
        }

        let tolerance = self.tolerance_for(taken_at, &legacy);
        legacy
            .iter()
            .any(|ts| (*ts - taken_at).abs() <= tolerance)
    }

    /// Base tolerance, widened when enough legacy photos cluster around
    /// `taken_at`
    fn tolerance_for(&self, taken_at: DateTime<Utc>, legacy: &[DateTime<Utc>]) -> Duration {
        let window = Duration::seconds(self.config.cluster_window_secs);
        let nearby = legacy
            .iter()
            .filter(|ts| (**ts - taken_at).abs() <= window)
            .count();

        if nearby >= self.config.cluster_min_photos {
            Duration::seconds(self.config.burst_tolerance_secs)
        } else {
            Duration::seconds(self.config.tolerance_secs)
        }
    }
}

/// [`DuplicateDetector::is_already_added`] with default tolerances
pub fn is_already_added(candidate: &LibraryAsset, existing: &[Photo]) -> bool {
    DuplicateDetector::default().is_already_added(candidate, existing)
}
