//! CSV and JSON export/import of tracker data.

use std::io::Read;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

use super::domain::{
    parse_date, ApplicationDraft, ApplicationRecord, ApplicationStatus, Certification,
    CertificationDraft,
};
use super::repository::TrackerSnapshot;

pub const EXPORT_VERSION: &str = "1.0";

const CSV_HEADERS: [&str; 10] = [
    "Company",
    "Position",
    "Status",
    "Submitted On",
    "Offer Link",
    "Contact Email",
    "Contact Phone",
    "Skills",
    "Notes",
    "Follow-ups",
];

const SKILL_SEPARATOR: &str = ", ";

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("export buffer error: {0}")]
    Buffer(String),
    #[error("row {row}: unknown status '{value}'")]
    InvalidStatus { row: usize, value: String },
    #[error("row {row}: {message}")]
    InvalidDate { row: usize, message: String },
}

pub fn write_applications_csv(applications: &[ApplicationRecord]) -> Result<String, TransferError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADERS)?;

    for application in applications {
        let skills = application
            .skills
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(SKILL_SEPARATOR);
        let submitted_on = application
            .submitted_on
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let follow_ups = application.follow_ups.len().to_string();

        writer.write_record([
            application.company.as_str(),
            application.position.as_str(),
            application.status.label(),
            submitted_on.as_str(),
            application.offer_link.as_deref().unwrap_or_default(),
            application.contact_email.as_deref().unwrap_or_default(),
            application.contact_phone.as_deref().unwrap_or_default(),
            skills.as_str(),
            application.notes.as_deref().unwrap_or_default(),
            follow_ups.as_str(),
        ])?;
    }

    finish(writer)
}

/// Header row plus one example row, ready to be filled in and imported.
pub fn csv_template() -> Result<String, TransferError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&CSV_HEADERS[..CSV_HEADERS.len() - 1])?;
    writer.write_record([
        "Example Corp",
        "Python Developer",
        ApplicationStatus::Submitted.label(),
        "2024-01-15",
        "https://example.com/offer",
        "hr@example.com",
        "0123456789",
        "python, django, postgresql",
        "Promising lead",
    ])?;
    finish(writer)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, TransferError> {
    let bytes = writer
        .into_inner()
        .map_err(|err| TransferError::Buffer(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| TransferError::Buffer(err.to_string()))
}

#[derive(Debug, Deserialize)]
struct CsvApplicationRow {
    #[serde(rename = "Company", default)]
    company: String,
    #[serde(rename = "Position", default)]
    position: String,
    #[serde(rename = "Status", default, deserialize_with = "empty_string_as_none")]
    status: Option<String>,
    #[serde(
        rename = "Submitted On",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    submitted_on: Option<String>,
    #[serde(rename = "Offer Link", default, deserialize_with = "empty_string_as_none")]
    offer_link: Option<String>,
    #[serde(
        rename = "Contact Email",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    contact_email: Option<String>,
    #[serde(
        rename = "Contact Phone",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    contact_phone: Option<String>,
    #[serde(rename = "Skills", default, deserialize_with = "empty_string_as_none")]
    skills: Option<String>,
    #[serde(rename = "Notes", default, deserialize_with = "empty_string_as_none")]
    notes: Option<String>,
}

impl CsvApplicationRow {
    fn into_draft(self, row: usize) -> Result<ApplicationDraft, TransferError> {
        let status = match self.status {
            Some(value) => ApplicationStatus::from_label(&value)
                .ok_or(TransferError::InvalidStatus { row, value })?,
            None => ApplicationStatus::Submitted,
        };
        let submitted_on = self
            .submitted_on
            .as_deref()
            .map(parse_date)
            .transpose()
            .map_err(|message| TransferError::InvalidDate { row, message })?;
        let skills = self
            .skills
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|skill| !skill.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(ApplicationDraft {
            company: self.company,
            position: self.position,
            status,
            submitted_on,
            offer_link: self.offer_link,
            contact_email: self.contact_email,
            contact_phone: self.contact_phone,
            follow_ups: None,
            notes: self.notes,
            skills,
        })
    }
}

/// Parse applications from CSV. Rows are numbered from 1, excluding the header.
pub fn parse_applications_csv<R: Read>(reader: R) -> Result<Vec<ApplicationDraft>, TransferError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut drafts = Vec::new();

    for (index, record) in csv_reader.deserialize::<CsvApplicationRow>().enumerate() {
        let row = record?;
        drafts.push(row.into_draft(index + 1)?);
    }

    Ok(drafts)
}

/// Strip the byte-order mark spreadsheet tools prepend to UTF-8 CSV files.
pub fn strip_bom(content: &str) -> &str {
    content.strip_prefix('\u{feff}').unwrap_or(content)
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

/// Full JSON export; also the on-disk data file format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportBundle {
    pub applications: Vec<ApplicationRecord>,
    pub certifications: Vec<Certification>,
    pub skills: Vec<String>,
    pub exported_at: NaiveDateTime,
    pub version: String,
}

impl ExportBundle {
    pub fn from_snapshot(snapshot: TrackerSnapshot, exported_at: NaiveDateTime) -> Self {
        Self {
            applications: snapshot.applications,
            certifications: snapshot.certifications,
            skills: snapshot.skills.into_iter().collect(),
            exported_at,
            version: EXPORT_VERSION.to_string(),
        }
    }

    pub fn into_snapshot(self) -> TrackerSnapshot {
        TrackerSnapshot {
            applications: self.applications,
            certifications: self.certifications,
            skills: self.skills.into_iter().collect(),
        }
    }
}

/// Accepted JSON import shapes: an export bundle or a bare array of applications.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ImportPayload {
    Applications(Vec<ApplicationDraft>),
    Bundle(ImportBundle),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportBundle {
    #[serde(default)]
    pub applications: Vec<ApplicationDraft>,
    #[serde(default)]
    pub certifications: Vec<CertificationDraft>,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl ImportPayload {
    pub fn into_bundle(self) -> ImportBundle {
        match self {
            Self::Applications(applications) => ImportBundle {
                applications,
                ..ImportBundle::default()
            },
            Self::Bundle(bundle) => bundle,
        }
    }
}

/// Counts of records created by an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub count: usize,
    pub certifications: usize,
    pub skills: usize,
}
