//! Job application tracking: records, certifications, the skill vocabulary
//! and the reminder engine deriving follow-up and expiry signals from them.

pub mod clock;
pub mod domain;
pub mod memory;
pub mod reminders;
pub mod repository;
pub mod router;
pub mod service;
pub mod stats;
pub mod transfer;

#[cfg(test)]
mod tests;

pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::{
    default_skills, ApplicationDraft, ApplicationId, ApplicationRecord, ApplicationStatus,
    Certification, CertificationDraft, CertificationId, FollowUp, ValidationError,
};
pub use memory::InMemoryTrackerRepository;
pub use reminders::{
    ApplicationStatusView, CertificationStatusView, ExpiryBucket, FollowUpNotification, Reminder,
    ReminderAction, ReminderKind,
};
pub use repository::{
    NotificationError, NotificationPublisher, RepositoryError, TrackerRepository, TrackerSnapshot,
};
pub use router::{tracker_router, ApplicationView};
pub use service::{DispatchOutcome, SearchQuery, TrackerService, TrackerServiceError};
pub use stats::{AdvancedStats, NamedCount, StatusSummary};
pub use transfer::{ExportBundle, ImportPayload, ImportSummary, TransferError};
