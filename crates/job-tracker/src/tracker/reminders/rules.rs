use chrono::NaiveDate;
use serde::Serialize;

use super::elapsed::{days_until, elapsed_days};
use crate::tracker::domain::{ApplicationRecord, ApplicationStatus, Certification};

/// Days after submission before an unanswered application needs a follow-up.
pub const FOLLOW_UP_AFTER_DAYS: i64 = 7;

/// Certifications expiring within this many days are flagged.
pub const EXPIRY_WARNING_DAYS: i64 = 30;

/// Elapsed-day counts that fire a one-time follow-up notification.
pub const NOTIFY_ON_DAYS: [i64; 2] = [7, 14];

/// Elapsed days when the application is waiting on a follow-up, `None` otherwise.
pub fn follow_up_due(application: &ApplicationRecord, today: NaiveDate) -> Option<i64> {
    if application.status != ApplicationStatus::Submitted {
        return None;
    }

    elapsed_days(application.submitted_on, today).filter(|days| *days >= FOLLOW_UP_AFTER_DAYS)
}

/// Elapsed days when today is one of the notification days.
pub fn notification_due(application: &ApplicationRecord, today: NaiveDate) -> Option<i64> {
    if application.status != ApplicationStatus::Submitted {
        return None;
    }

    elapsed_days(application.submitted_on, today).filter(|days| NOTIFY_ON_DAYS.contains(days))
}

/// Expiry classification of a certification relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "bucket", rename_all = "snake_case")]
pub enum ExpiryBucket {
    Expired { days_ago: i64 },
    ExpiringSoon { days_left: i64 },
    Normal,
}

impl ExpiryBucket {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Expired { .. } => "expired",
            Self::ExpiringSoon { .. } => "expiring_soon",
            Self::Normal => "normal",
        }
    }

    pub fn display_text(self) -> Option<String> {
        match self {
            Self::Expired { days_ago } => Some(format!("expired {days_ago} days ago")),
            Self::ExpiringSoon { days_left } => Some(format!("expires in {days_left} days")),
            Self::Normal => None,
        }
    }
}

pub fn classify_certification(certification: &Certification, today: NaiveDate) -> ExpiryBucket {
    let Some(expires_on) = certification.expires_on else {
        return ExpiryBucket::Normal;
    };

    let remaining = days_until(expires_on, today);
    if remaining < 0 {
        ExpiryBucket::Expired {
            days_ago: remaining.abs(),
        }
    } else if remaining <= EXPIRY_WARNING_DAYS {
        ExpiryBucket::ExpiringSoon {
            days_left: remaining,
        }
    } else {
        ExpiryBucket::Normal
    }
}
