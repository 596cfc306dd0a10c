//! # Rollcall
//!
//! Attendance management client toolkit: a typed REST client for the
//! attendance backend, the biometric device-proxy workflows, and the
//! polling/event plumbing the admin console is built on.
//!
//! ## Modules
//!
//! - [`client`]: backend REST client (attendance, requests, schedules,
//!   reports)
//! - [`device`]: biometric middleware proxy (enrollment, registration,
//!   scan logs)
//! - [`watch`]: cancellable interval pollers
//! - [`events`]: typed in-process event bus
//! - [`config`]: TOML + environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rollcall::client::{ApiClient, attendance::AttendanceFilter};
//! use rollcall::config::Config;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let client = Arc::new(ApiClient::new(config.api.clone()));
//!
//!     let records = client.list_attendances(&AttendanceFilter::default()).await?;
//!     println!("{} attendance records", records.len());
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod device;
pub mod error;
pub mod events;
pub mod model;
pub mod watch;

// Re-export top-level types for convenience
pub use client::{
    attendance::AttendanceFilter,
    reports::{DashboardSummary, ReportRange},
    requests::ReviewSession,
    schedule::BulkTimeAssignment,
    ApiClient,
};

pub use config::{ApiConfig, Config, ConfigError, DeviceConfig, LoggingConfig, PollingConfig};

pub use device::{
    enrollment::{
        prepare_face_photo, BiometricKind, BiometricRegistration, Hand, NewPerson,
        JPEG_QUALITY, MAX_PHOTO_BYTES, MAX_PHOTO_DIMENSION,
    },
    scan::{ScanLogState, ScanLogWatcher},
    ConnectionState, DeviceClient, FaceRecord, PalmRecord,
};

pub use error::{ClientError, ClientResult};

pub use events::{AppEvent, EventBus};

pub use model::{
    AttendanceRecord, CheckAction, Decision, HolidaySettings, KpiReport, Person, RequestState,
    ScanMethod, ScanOutcome, ScanRecord, StatusRequest, TimeWindowSettings,
};

pub use watch::{AttendanceStatusWatcher, Poller};
