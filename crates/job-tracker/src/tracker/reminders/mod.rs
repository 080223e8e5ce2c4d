//! Reminder and status derivation.
//!
//! Everything here is a pure function of a record snapshot and the current
//! calendar date. Nothing is cached between calls, so a reminder keeps coming
//! back until the underlying record changes.

mod elapsed;
mod rules;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, Certification, CertificationId,
};

pub use elapsed::{days_since, days_until, elapsed_days};
pub use rules::{
    classify_certification, follow_up_due, notification_due, ExpiryBucket, EXPIRY_WARNING_DAYS,
    FOLLOW_UP_AFTER_DAYS, NOTIFY_ON_DAYS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    FollowUpDue,
    CertificationExpiring,
}

impl ReminderKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::FollowUpDue => "Follow-up due",
            Self::CertificationExpiring => "Certification expiring",
        }
    }
}

/// Reference back to the record that raised a reminder, replayed through
/// the service's dispatch call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReminderAction {
    RecordFollowUp { application_id: ApplicationId },
    ReviewCertification { certification_id: CertificationId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reminder {
    pub kind: ReminderKind,
    pub message: String,
    pub action: ReminderAction,
}

pub fn follow_up_reminder(application: &ApplicationRecord, today: NaiveDate) -> Option<Reminder> {
    let days = follow_up_due(application, today)?;
    Some(Reminder {
        kind: ReminderKind::FollowUpDue,
        message: format!(
            "Follow up with {} for the {} position ({} days)",
            application.company, application.position, days
        ),
        action: ReminderAction::RecordFollowUp {
            application_id: application.id,
        },
    })
}

pub fn certification_reminder(certification: &Certification, today: NaiveDate) -> Option<Reminder> {
    match classify_certification(certification, today) {
        ExpiryBucket::ExpiringSoon { days_left } => Some(Reminder {
            kind: ReminderKind::CertificationExpiring,
            message: format!(
                "Certification {} expires in {} days",
                certification.name, days_left
            ),
            action: ReminderAction::ReviewCertification {
                certification_id: certification.id,
            },
        }),
        ExpiryBucket::Expired { .. } | ExpiryBucket::Normal => None,
    }
}

/// All due reminders: applications first, then certifications, each in input order.
pub fn collect_reminders(
    applications: &[ApplicationRecord],
    certifications: &[Certification],
    today: NaiveDate,
) -> Vec<Reminder> {
    applications
        .iter()
        .filter_map(|application| follow_up_reminder(application, today))
        .chain(
            certifications
                .iter()
                .filter_map(|certification| certification_reminder(certification, today)),
        )
        .collect()
}

/// One-shot notification raised on the exact notification days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FollowUpNotification {
    pub application_id: ApplicationId,
    pub days_since_submission: i64,
    pub title: String,
    pub message: String,
}

pub fn due_notifications(
    applications: &[ApplicationRecord],
    today: NaiveDate,
) -> Vec<FollowUpNotification> {
    applications
        .iter()
        .filter_map(|application| {
            notification_due(application, today).map(|days| FollowUpNotification {
                application_id: application.id,
                days_since_submission: days,
                title: "Follow-up reminder".to_string(),
                message: format!(
                    "Time to follow up with {} for the {} position",
                    application.company, application.position
                ),
            })
        })
        .collect()
}

/// Status badge and day count shown next to an application.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationStatusView {
    pub application_id: ApplicationId,
    pub status: ApplicationStatus,
    pub status_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_since_submission: Option<i64>,
    pub follow_up_due: bool,
}

impl ApplicationStatusView {
    pub fn derive(application: &ApplicationRecord, today: NaiveDate) -> Self {
        Self {
            application_id: application.id,
            status: application.status,
            status_label: application.status.display_label(),
            days_since_submission: elapsed_days(application.submitted_on, today),
            follow_up_due: follow_up_due(application, today).is_some(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CertificationStatusView {
    pub certification_id: CertificationId,
    pub name: String,
    #[serde(flatten)]
    pub bucket: ExpiryBucket,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_text: Option<String>,
}

impl CertificationStatusView {
    pub fn derive(certification: &Certification, today: NaiveDate) -> Self {
        let bucket = classify_certification(certification, today);
        Self {
            certification_id: certification.id,
            name: certification.name.clone(),
            bucket,
            display_text: bucket.display_text(),
        }
    }
}
