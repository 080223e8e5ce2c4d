use std::collections::BTreeSet;

use chrono::NaiveDateTime;

use super::domain::{
    ApplicationDraft, ApplicationId, ApplicationRecord, Certification, CertificationDraft,
    CertificationId,
};
use super::reminders::FollowUpNotification;

/// Full copy of the stored records, used for snapshots and restores. Records
/// come newest first, in the same order as the listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackerSnapshot {
    pub applications: Vec<ApplicationRecord>,
    pub certifications: Vec<Certification>,
    pub skills: BTreeSet<String>,
}

/// Storage abstraction so the service can be exercised in isolation.
///
/// Listings return records newest first.
pub trait TrackerRepository: Send + Sync {
    fn insert_application(
        &self,
        draft: ApplicationDraft,
        created_at: NaiveDateTime,
    ) -> Result<ApplicationRecord, RepositoryError>;
    fn update_application(&self, record: ApplicationRecord) -> Result<(), RepositoryError>;
    fn fetch_application(
        &self,
        id: ApplicationId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn delete_application(&self, id: ApplicationId) -> Result<(), RepositoryError>;
    fn applications(&self) -> Result<Vec<ApplicationRecord>, RepositoryError>;

    fn insert_certification(
        &self,
        draft: CertificationDraft,
        created_at: NaiveDateTime,
    ) -> Result<Certification, RepositoryError>;
    fn fetch_certification(
        &self,
        id: CertificationId,
    ) -> Result<Option<Certification>, RepositoryError>;
    fn delete_certification(&self, id: CertificationId) -> Result<(), RepositoryError>;
    fn certifications(&self) -> Result<Vec<Certification>, RepositoryError>;

    /// Skill names in ascending order.
    fn skills(&self) -> Result<Vec<String>, RepositoryError>;
    fn add_skill(&self, name: String) -> Result<(), RepositoryError>;
    fn remove_skill(&self, name: &str) -> Result<(), RepositoryError>;
    fn replace_skills(&self, skills: BTreeSet<String>) -> Result<(), RepositoryError>;

    fn snapshot(&self) -> Result<TrackerSnapshot, RepositoryError>;
    /// Replace every stored record, keeping the identifiers found in `snapshot`.
    fn restore(&self, snapshot: TrackerSnapshot) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook for follow-up notifications (desktop, e-mail, log sink).
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: FollowUpNotification) -> Result<(), NotificationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
