use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::tracker::clock::FixedClock;
use crate::tracker::domain::{
    ApplicationDraft, ApplicationId, ApplicationRecord, ApplicationStatus, Certification,
    CertificationDraft, CertificationId,
};
use crate::tracker::memory::InMemoryTrackerRepository;
use crate::tracker::reminders::FollowUpNotification;
use crate::tracker::repository::{
    NotificationError, NotificationPublisher, RepositoryError, TrackerRepository, TrackerSnapshot,
};
use crate::tracker::{tracker_router, TrackerService};

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn at_noon(day: NaiveDate) -> NaiveDateTime {
    day.and_hms_opt(12, 0, 0).expect("valid time")
}

/// Fixed "today" used by the service fixtures.
pub(super) fn today() -> NaiveDate {
    date(2025, 3, 20)
}

pub(super) fn draft(company: &str, submitted_days_ago: Option<i64>) -> ApplicationDraft {
    let mut draft = ApplicationDraft::new(company, "Backend Engineer");
    draft.submitted_on = submitted_days_ago.map(|days| today() - chrono::Duration::days(days));
    draft.skills = ["rust", "postgresql"]
        .into_iter()
        .map(str::to_string)
        .collect::<BTreeSet<_>>();
    draft
}

pub(super) fn record(
    id: u64,
    company: &str,
    status: ApplicationStatus,
    submitted_on: Option<NaiveDate>,
) -> ApplicationRecord {
    let mut draft = ApplicationDraft::new(company, "Backend Engineer");
    draft.status = status;
    draft.submitted_on = submitted_on;
    ApplicationRecord::from_draft(ApplicationId(id), draft, at_noon(date(2025, 1, 1)))
}

pub(super) fn certification(id: u64, name: &str, expires_on: Option<NaiveDate>) -> Certification {
    Certification {
        id: CertificationId(id),
        name: name.to_string(),
        obtained_on: Some(date(2023, 1, 1)),
        expires_on,
        created_at: at_noon(date(2025, 1, 1)),
    }
}

pub(super) fn certification_draft(name: &str, expires_on: Option<NaiveDate>) -> CertificationDraft {
    CertificationDraft {
        name: name.to_string(),
        obtained_on: Some(date(2023, 1, 1)),
        expires_on,
    }
}

pub(super) type MemoryService = TrackerService<InMemoryTrackerRepository, MemoryNotifications>;

pub(super) fn build_service() -> (
    MemoryService,
    Arc<InMemoryTrackerRepository>,
    Arc<MemoryNotifications>,
) {
    let repository = Arc::new(InMemoryTrackerRepository::with_default_skills());
    let notifications = Arc::new(MemoryNotifications::default());
    let service = TrackerService::with_clock(
        repository.clone(),
        notifications.clone(),
        Arc::new(FixedClock(at_noon(today()))),
    );
    (service, repository, notifications)
}

pub(super) fn router_with_service(service: MemoryService) -> axum::Router {
    tracker_router(Arc::new(service))
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifications {
    events: Arc<Mutex<Vec<FollowUpNotification>>>,
}

impl MemoryNotifications {
    pub(super) fn events(&self) -> Vec<FollowUpNotification> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .clone()
    }
}

impl NotificationPublisher for MemoryNotifications {
    fn publish(&self, notification: FollowUpNotification) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
        Ok(())
    }
}

pub(super) struct FailingNotifications;

impl NotificationPublisher for FailingNotifications {
    fn publish(&self, _notification: FollowUpNotification) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("notifier offline".to_string()))
    }
}

pub(super) struct UnavailableRepository;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("store offline".to_string()))
}

impl TrackerRepository for UnavailableRepository {
    fn insert_application(
        &self,
        _draft: ApplicationDraft,
        _created_at: NaiveDateTime,
    ) -> Result<ApplicationRecord, RepositoryError> {
        offline()
    }

    fn update_application(&self, _record: ApplicationRecord) -> Result<(), RepositoryError> {
        offline()
    }

    fn fetch_application(
        &self,
        _id: ApplicationId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        offline()
    }

    fn delete_application(&self, _id: ApplicationId) -> Result<(), RepositoryError> {
        offline()
    }

    fn applications(&self) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        offline()
    }

    fn insert_certification(
        &self,
        _draft: CertificationDraft,
        _created_at: NaiveDateTime,
    ) -> Result<Certification, RepositoryError> {
        offline()
    }

    fn fetch_certification(
        &self,
        _id: CertificationId,
    ) -> Result<Option<Certification>, RepositoryError> {
        offline()
    }

    fn delete_certification(&self, _id: CertificationId) -> Result<(), RepositoryError> {
        offline()
    }

    fn certifications(&self) -> Result<Vec<Certification>, RepositoryError> {
        offline()
    }

    fn skills(&self) -> Result<Vec<String>, RepositoryError> {
        offline()
    }

    fn add_skill(&self, _name: String) -> Result<(), RepositoryError> {
        offline()
    }

    fn remove_skill(&self, _name: &str) -> Result<(), RepositoryError> {
        offline()
    }

    fn replace_skills(&self, _skills: BTreeSet<String>) -> Result<(), RepositoryError> {
        offline()
    }

    fn snapshot(&self) -> Result<TrackerSnapshot, RepositoryError> {
        offline()
    }

    fn restore(&self, _snapshot: TrackerSnapshot) -> Result<(), RepositoryError> {
        offline()
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}
