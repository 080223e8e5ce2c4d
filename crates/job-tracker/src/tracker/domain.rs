use std::collections::BTreeSet;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier wrapper for tracked job applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub u64);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier wrapper for certifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CertificationId(pub u64);

impl fmt::Display for CertificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status tracked throughout an application's life.
///
/// The French labels used by older exports are still accepted on input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    #[serde(alias = "envoyee")]
    Submitted,
    #[serde(alias = "relancee", alias = "followed-up")]
    FollowedUp,
    #[serde(alias = "entretien")]
    Interview,
    #[serde(alias = "refusee")]
    Rejected,
    #[serde(alias = "acceptee")]
    Accepted,
}

impl ApplicationStatus {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Submitted,
            Self::FollowedUp,
            Self::Interview,
            Self::Rejected,
            Self::Accepted,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::FollowedUp => "followed_up",
            Self::Interview => "interview",
            Self::Rejected => "rejected",
            Self::Accepted => "accepted",
        }
    }

    pub const fn display_label(self) -> &'static str {
        match self {
            Self::Submitted => "Submitted",
            Self::FollowedUp => "Followed up",
            Self::Interview => "Interview",
            Self::Rejected => "Rejected",
            Self::Accepted => "Accepted",
        }
    }

    /// The employer answered: interview, rejection or offer.
    pub const fn is_response(self) -> bool {
        matches!(self, Self::Interview | Self::Rejected | Self::Accepted)
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "submitted" | "envoyee" => Some(Self::Submitted),
            "followed_up" | "followed-up" | "relancee" => Some(Self::FollowedUp),
            "interview" | "entretien" => Some(Self::Interview),
            "rejected" | "refusee" => Some(Self::Rejected),
            "accepted" | "acceptee" => Some(Self::Accepted),
            _ => None,
        }
    }
}

/// A follow-up logged against an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUp {
    pub at: NaiveDateTime,
    #[serde(default)]
    pub message: String,
}

/// Stored application record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub company: String,
    pub position: String,
    pub status: ApplicationStatus,
    pub submitted_on: Option<NaiveDate>,
    pub offer_link: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub follow_ups: Vec<FollowUp>,
    pub notes: Option<String>,
    #[serde(default)]
    pub skills: BTreeSet<String>,
    pub created_at: NaiveDateTime,
}

impl ApplicationRecord {
    pub fn from_draft(id: ApplicationId, draft: ApplicationDraft, created_at: NaiveDateTime) -> Self {
        Self {
            id,
            company: draft.company.trim().to_string(),
            position: draft.position.trim().to_string(),
            status: draft.status,
            submitted_on: draft.submitted_on,
            offer_link: draft.offer_link,
            contact_email: draft.contact_email,
            contact_phone: draft.contact_phone,
            follow_ups: draft.follow_ups.unwrap_or_default(),
            notes: draft.notes,
            skills: draft.skills,
            created_at,
        }
    }

    /// Overwrite the editable fields, keeping identity and creation time.
    pub fn apply(&mut self, draft: ApplicationDraft) {
        self.company = draft.company.trim().to_string();
        self.position = draft.position.trim().to_string();
        self.status = draft.status;
        self.submitted_on = draft.submitted_on;
        self.offer_link = draft.offer_link;
        self.contact_email = draft.contact_email;
        self.contact_phone = draft.contact_phone;
        if let Some(follow_ups) = draft.follow_ups {
            self.follow_ups = follow_ups;
        }
        self.notes = draft.notes;
        self.skills = draft.skills;
    }

    /// Case-insensitive match against company, position, notes and skills.
    pub fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.company.to_lowercase().contains(&needle)
            || self.position.to_lowercase().contains(&needle)
            || self
                .notes
                .as_deref()
                .is_some_and(|notes| notes.to_lowercase().contains(&needle))
            || self
                .skills
                .iter()
                .any(|skill| skill.to_lowercase().contains(&needle))
    }
}

/// Form payload used to create or replace an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationDraft {
    pub company: String,
    pub position: String,
    #[serde(default)]
    pub status: ApplicationStatus,
    #[serde(default, deserialize_with = "blank_date_as_none")]
    pub submitted_on: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_string_as_none")]
    pub offer_link: Option<String>,
    #[serde(default, deserialize_with = "blank_string_as_none")]
    pub contact_email: Option<String>,
    #[serde(default, deserialize_with = "blank_string_as_none")]
    pub contact_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_ups: Option<Vec<FollowUp>>,
    #[serde(default, deserialize_with = "blank_string_as_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub skills: BTreeSet<String>,
}

impl ApplicationDraft {
    pub fn new(company: impl Into<String>, position: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            position: position.into(),
            status: ApplicationStatus::Submitted,
            submitted_on: None,
            offer_link: None,
            contact_email: None,
            contact_phone: None,
            follow_ups: None,
            notes: None,
            skills: BTreeSet::new(),
        }
    }

    /// Check the form-level requirements against the creation date.
    pub fn validate(&self, today: NaiveDate) -> Result<(), ValidationError> {
        if self.company.trim().is_empty() {
            return Err(ValidationError::BlankField("company"));
        }
        if self.position.trim().is_empty() {
            return Err(ValidationError::BlankField("position"));
        }
        if let Some(submitted_on) = self.submitted_on {
            if submitted_on > today {
                return Err(ValidationError::SubmittedInFuture {
                    submitted_on,
                    today,
                });
            }
        }
        Ok(())
    }
}

impl From<&ApplicationRecord> for ApplicationDraft {
    fn from(record: &ApplicationRecord) -> Self {
        Self {
            company: record.company.clone(),
            position: record.position.clone(),
            status: record.status,
            submitted_on: record.submitted_on,
            offer_link: record.offer_link.clone(),
            contact_email: record.contact_email.clone(),
            contact_phone: record.contact_phone.clone(),
            follow_ups: Some(record.follow_ups.clone()),
            notes: record.notes.clone(),
            skills: record.skills.clone(),
        }
    }
}

/// Stored certification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certification {
    pub id: CertificationId,
    pub name: String,
    pub obtained_on: Option<NaiveDate>,
    pub expires_on: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationDraft {
    pub name: String,
    #[serde(default, deserialize_with = "blank_date_as_none")]
    pub obtained_on: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_date_as_none")]
    pub expires_on: Option<NaiveDate>,
}

impl CertificationDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::BlankField("name"));
        }
        if let (Some(obtained_on), Some(expires_on)) = (self.obtained_on, self.expires_on) {
            if obtained_on > expires_on {
                return Err(ValidationError::CertificationDates {
                    obtained_on,
                    expires_on,
                });
            }
        }
        Ok(())
    }
}

impl From<&Certification> for CertificationDraft {
    fn from(certification: &Certification) -> Self {
        Self {
            name: certification.name.clone(),
            obtained_on: certification.obtained_on,
            expires_on: certification.expires_on,
        }
    }
}

/// Skills restored by a vocabulary reset.
pub const DEFAULT_SKILLS: [&str; 23] = [
    "monitoring",
    "scripting",
    "virtualisation",
    "firewall",
    "pentest",
    "soc",
    "incident-response",
    "compliance",
    "kubernetes",
    "docker",
    "ansible",
    "terraform",
    "aws",
    "azure",
    "gcp",
    "linux",
    "windows",
    "python",
    "powershell",
    "bash",
    "siem",
    "forensic",
    "malware-analysis",
];

pub fn default_skills() -> BTreeSet<String> {
    DEFAULT_SKILLS.iter().map(|skill| skill.to_string()).collect()
}

/// Form-level validation failures.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} must not be blank")]
    BlankField(&'static str),
    #[error("submission date {submitted_on} is after {today}")]
    SubmittedInFuture {
        submitted_on: NaiveDate,
        today: NaiveDate,
    },
    #[error("certification obtained on {obtained_on} cannot expire earlier ({expires_on})")]
    CertificationDates {
        obtained_on: NaiveDate,
        expires_on: NaiveDate,
    },
}

fn blank_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty()))
}

fn blank_date_as_none<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match blank_string_as_none(deserializer)? {
        Some(raw) => parse_date(&raw).map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
