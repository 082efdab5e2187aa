//! # Reisetagebuch
//!
//! Core of a travel journal: trips are split into calendar days, each day
//! holds a journal entry and photos or videos imported from the device
//! photo library.
//!
//! The interesting part is media association:
//! - library assets are bucketed into days by capture time ([`calendar`])
//! - copies land in app storage ([`storage`]) and are loaded back through a
//!   fallback chain ([`services::photo_loader`])
//! - the same asset is never attached twice ([`services::duplicate_detector`])
//!
//! Platform access to the photo library lives in the `photo-library` crate.

pub mod app;
pub mod calendar;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod notifications;
pub mod services;
pub mod storage;

pub use app::AppContext;
pub use calendar::Calendar;
pub use config::{AppConfig, DedupConfig};
pub use error::AppError;
pub use models::{Day, JournalEntry, Photo, Trip};
pub use notifications::{JournalEvent, Notifications};
pub use storage::MediaStore;

/// Initializes `env_logger`. `RUST_LOG` wins over the configured level.
/// Calling it again is harmless.
pub fn init_logging(config: &AppConfig) {
    let env = env_logger::Env::default().default_filter_or(config.log_level.as_str());
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("Logger already initialized");
    }
}
