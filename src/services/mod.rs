pub mod candidate_service;
pub mod day_service;
pub mod duplicate_detector;
pub mod import_service;
pub mod journal_service;
pub mod photo_loader;
pub mod photo_service;
pub mod trip_service;

pub use candidate_service::{Candidate, CandidateFetcher, CandidateList};
pub use duplicate_detector::{is_already_added, DuplicateDetector};
pub use import_service::{
    FeaturePhotoOutcome, ImportFailure, ImportProgress, ImportReport, MediaImporter,
};
pub use photo_loader::{DisplayImage, ImageSource, LoadError, PhotoLoader};
pub use trip_service::{DateChangeOutcome, DaysAtRisk};
