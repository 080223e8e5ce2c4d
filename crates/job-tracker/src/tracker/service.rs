use std::io::Read;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::domain::{
    default_skills, ApplicationDraft, ApplicationId, ApplicationRecord, ApplicationStatus,
    Certification, CertificationDraft, CertificationId, FollowUp, ValidationError,
};
use super::reminders::{
    collect_reminders, due_notifications, CertificationStatusView, Reminder, ReminderAction,
};
use super::repository::{
    NotificationError, NotificationPublisher, RepositoryError, TrackerRepository,
};
use super::stats::{AdvancedStats, StatusSummary};
use super::transfer::{
    csv_template, parse_applications_csv, write_applications_csv, ExportBundle, ImportPayload,
    ImportSummary, TransferError,
};

/// Search parameters for the application listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default, deserialize_with = "blank_status_as_none")]
    pub status: Option<ApplicationStatus>,
}

fn blank_status_as_none<'de, D>(deserializer: D) -> Result<Option<ApplicationStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(label) => ApplicationStatus::from_label(label)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown status '{label}'"))),
    }
}

/// Result of replaying a reminder action.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", content = "record", rename_all = "snake_case")]
pub enum DispatchOutcome {
    FollowUpRecorded(ApplicationRecord),
    CertificationReview(Certification),
}

/// Service composing the repository, the clock and the reminder engine.
pub struct TrackerService<R, N> {
    repository: Arc<R>,
    notifications: Arc<N>,
    clock: Arc<dyn Clock>,
}

impl<R, N> TrackerService<R, N>
where
    R: TrackerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(repository: Arc<R>, notifications: Arc<N>) -> Self {
        Self::with_clock(repository, notifications, Arc::new(SystemClock))
    }

    pub fn with_clock(repository: Arc<R>, notifications: Arc<N>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository,
            notifications,
            clock,
        }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Record a new application.
    pub fn submit(&self, draft: ApplicationDraft) -> Result<ApplicationRecord, TrackerServiceError> {
        let now = self.clock.now();
        draft.validate(now.date())?;
        let record = self.repository.insert_application(draft, now)?;
        info!(application_id = %record.id, company = %record.company, "application recorded");
        Ok(record)
    }

    /// Replace the editable fields of an existing application.
    pub fn update(
        &self,
        id: ApplicationId,
        draft: ApplicationDraft,
    ) -> Result<ApplicationRecord, TrackerServiceError> {
        let mut record = self.get(id)?;
        draft.validate(self.today())?;
        record.apply(draft);
        self.repository.update_application(record.clone())?;
        debug!(application_id = %id, status = record.status.label(), "application updated");
        Ok(record)
    }

    pub fn delete(&self, id: ApplicationId) -> Result<(), TrackerServiceError> {
        self.repository.delete_application(id)?;
        info!(application_id = %id, "application deleted");
        Ok(())
    }

    pub fn get(&self, id: ApplicationId) -> Result<ApplicationRecord, TrackerServiceError> {
        let record = self
            .repository
            .fetch_application(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    pub fn list(&self) -> Result<Vec<ApplicationRecord>, TrackerServiceError> {
        Ok(self.repository.applications()?)
    }

    /// Text search over company, position, notes and skills with an optional
    /// status filter. An empty query matches nothing.
    pub fn search(&self, query: &SearchQuery) -> Result<Vec<ApplicationRecord>, TrackerServiceError> {
        let needle = query
            .q
            .as_deref()
            .map(str::trim)
            .filter(|needle| !needle.is_empty());
        if needle.is_none() && query.status.is_none() {
            return Ok(Vec::new());
        }

        Ok(self
            .repository
            .applications()?
            .into_iter()
            .filter(|record| query.status.map_or(true, |status| record.status == status))
            .filter(|record| needle.map_or(true, |needle| record.matches_text(needle)))
            .collect())
    }

    /// Log a follow-up and move the application to followed-up.
    pub fn record_follow_up(
        &self,
        id: ApplicationId,
        message: Option<String>,
    ) -> Result<ApplicationRecord, TrackerServiceError> {
        let mut record = self.get(id)?;
        record.follow_ups.push(FollowUp {
            at: self.clock.now(),
            message: message.unwrap_or_default(),
        });
        record.status = ApplicationStatus::FollowedUp;
        self.repository.update_application(record.clone())?;
        info!(
            application_id = %id,
            follow_ups = record.follow_ups.len(),
            "follow-up recorded"
        );
        Ok(record)
    }

    pub fn add_certification(
        &self,
        draft: CertificationDraft,
    ) -> Result<Certification, TrackerServiceError> {
        draft.validate()?;
        let certification = self
            .repository
            .insert_certification(draft, self.clock.now())?;
        info!(
            certification_id = %certification.id,
            name = %certification.name,
            "certification recorded"
        );
        Ok(certification)
    }

    pub fn delete_certification(&self, id: CertificationId) -> Result<(), TrackerServiceError> {
        self.repository.delete_certification(id)?;
        info!(certification_id = %id, "certification deleted");
        Ok(())
    }

    pub fn certification(&self, id: CertificationId) -> Result<Certification, TrackerServiceError> {
        let certification = self
            .repository
            .fetch_certification(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(certification)
    }

    pub fn certifications(&self) -> Result<Vec<Certification>, TrackerServiceError> {
        Ok(self.repository.certifications()?)
    }

    pub fn certification_statuses(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<CertificationStatusView>, TrackerServiceError> {
        Ok(self
            .repository
            .certifications()?
            .iter()
            .map(|certification| CertificationStatusView::derive(certification, today))
            .collect())
    }

    pub fn skills(&self) -> Result<Vec<String>, TrackerServiceError> {
        Ok(self.repository.skills()?)
    }

    pub fn add_skill(&self, name: &str) -> Result<(), TrackerServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::BlankField("name").into());
        }
        self.repository.add_skill(name.to_string())?;
        Ok(())
    }

    pub fn remove_skill(&self, name: &str) -> Result<(), TrackerServiceError> {
        Ok(self.repository.remove_skill(name)?)
    }

    /// Drop the custom vocabulary and restore the default skill set.
    pub fn reset_skills(&self) -> Result<Vec<String>, TrackerServiceError> {
        self.repository.replace_skills(default_skills())?;
        info!("skill vocabulary reset to defaults");
        self.skills()
    }

    pub fn stats(&self) -> Result<StatusSummary, TrackerServiceError> {
        Ok(StatusSummary::from_applications(
            &self.repository.applications()?,
        ))
    }

    pub fn advanced_stats(&self) -> Result<AdvancedStats, TrackerServiceError> {
        Ok(AdvancedStats::from_applications(
            &self.repository.applications()?,
        ))
    }

    /// Reminders due on `today`, evaluated against one snapshot of the store.
    pub fn reminders(&self, today: NaiveDate) -> Result<Vec<Reminder>, TrackerServiceError> {
        let snapshot = self.repository.snapshot()?;
        Ok(collect_reminders(
            &snapshot.applications,
            &snapshot.certifications,
            today,
        ))
    }

    /// Replay the action attached to a reminder.
    pub fn dispatch(&self, action: ReminderAction) -> Result<DispatchOutcome, TrackerServiceError> {
        match action {
            ReminderAction::RecordFollowUp { application_id } => self
                .record_follow_up(application_id, None)
                .map(DispatchOutcome::FollowUpRecorded),
            ReminderAction::ReviewCertification { certification_id } => self
                .certification(certification_id)
                .map(DispatchOutcome::CertificationReview),
        }
    }

    /// Publish the follow-up notifications due on `today`; returns how many were sent.
    pub fn notify_due(&self, today: NaiveDate) -> Result<usize, TrackerServiceError> {
        let snapshot = self.repository.snapshot()?;
        let notifications = due_notifications(&snapshot.applications, today);
        let count = notifications.len();
        for notification in notifications {
            self.notifications.publish(notification)?;
        }
        if count > 0 {
            info!(count, %today, "follow-up notifications published");
        }
        Ok(count)
    }

    pub fn export_bundle(&self) -> Result<ExportBundle, TrackerServiceError> {
        let snapshot = self.repository.snapshot()?;
        Ok(ExportBundle::from_snapshot(snapshot, self.clock.now()))
    }

    pub fn export_csv(&self) -> Result<String, TrackerServiceError> {
        Ok(write_applications_csv(&self.repository.applications()?)?)
    }

    pub fn csv_template(&self) -> Result<String, TrackerServiceError> {
        Ok(csv_template()?)
    }

    /// Import applications from CSV; nothing is stored when a row is invalid.
    pub fn import_csv<Rd: Read>(&self, reader: Rd) -> Result<ImportSummary, TrackerServiceError> {
        let drafts = parse_applications_csv(reader)?;
        let count = self.insert_all(drafts)?;
        info!(count, "applications imported from csv");
        Ok(ImportSummary {
            count,
            ..ImportSummary::default()
        })
    }

    /// Merge an export bundle or an application array into the store.
    pub fn import_json(&self, payload: ImportPayload) -> Result<ImportSummary, TrackerServiceError> {
        let bundle = payload.into_bundle();
        for certification in &bundle.certifications {
            certification.validate()?;
        }
        let count = self.insert_all(bundle.applications)?;

        let now = self.clock.now();
        let mut certifications = 0;
        for draft in bundle.certifications {
            self.repository.insert_certification(draft, now)?;
            certifications += 1;
        }

        let mut skills = 0;
        for name in bundle.skills {
            match self.repository.add_skill(name) {
                Ok(()) => skills += 1,
                Err(RepositoryError::Conflict) => {}
                Err(err) => return Err(err.into()),
            }
        }

        info!(count, certifications, skills, "tracker data imported from json");
        Ok(ImportSummary {
            count,
            certifications,
            skills,
        })
    }

    /// Replace the whole store with a previously exported bundle.
    pub fn restore(&self, bundle: ExportBundle) -> Result<(), TrackerServiceError> {
        if bundle.version != super::transfer::EXPORT_VERSION {
            warn!(version = %bundle.version, "restoring bundle with unexpected version");
        }
        self.repository.restore(bundle.into_snapshot())?;
        Ok(())
    }

    fn insert_all(&self, drafts: Vec<ApplicationDraft>) -> Result<usize, TrackerServiceError> {
        let now = self.clock.now();
        for draft in &drafts {
            draft.validate(now.date())?;
        }
        let count = drafts.len();
        for draft in drafts {
            self.repository.insert_application(draft, now)?;
        }
        Ok(count)
    }
}

/// Error raised by the tracker service.
#[derive(Debug, thiserror::Error)]
pub enum TrackerServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
    #[error(transparent)]
    Transfer(#[from] TransferError),
}
