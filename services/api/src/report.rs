use crate::infra::{build_service, restore_from, save_to, AppService, DataFile};
use chrono::{Local, NaiveDate};
use clap::{Args, ValueEnum};
use job_tracker::config::{AppConfig, ConfigError};
use job_tracker::error::AppError;
use job_tracker::tracker::{
    domain::parse_date, CertificationStatusView, ExpiryBucket, ImportPayload, ImportSummary,
    Reminder,
};
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct RemindersArgs {
    /// Tracker data file (defaults to APP_DATA_FILE)
    #[arg(long)]
    pub(crate) data_file: Option<PathBuf>,
    /// Evaluation date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum ExportFormat {
    Csv,
    Json,
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    /// Tracker data file (defaults to APP_DATA_FILE)
    #[arg(long)]
    pub(crate) data_file: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
    pub(crate) format: ExportFormat,
    /// Write to this path instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ImportArgs {
    /// CSV or JSON file to merge; the format follows the extension
    pub(crate) file: PathBuf,
    /// Tracker data file receiving the records (defaults to APP_DATA_FILE)
    #[arg(long)]
    pub(crate) data_file: Option<PathBuf>,
}

fn resolve_data_file(explicit: Option<PathBuf>) -> Result<DataFile, AppError> {
    let path = match explicit {
        Some(path) => path,
        None => AppConfig::load()?
            .tracker
            .data_file
            .ok_or(ConfigError::MissingDataFile)?,
    };
    Ok(DataFile::new(path))
}

fn load_service(data_file: &DataFile) -> Result<Arc<AppService>, AppError> {
    let service = build_service();
    restore_from(&service, data_file)?;
    Ok(service)
}

pub(crate) fn run_reminders(args: RemindersArgs) -> Result<(), AppError> {
    let data_file = resolve_data_file(args.data_file)?;
    let service = load_service(&data_file)?;
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());

    let reminders = service.reminders(today)?;
    let statuses = service.certification_statuses(today)?;
    print!("{}", render_reminders(today, &reminders, &statuses));
    Ok(())
}

pub(crate) fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let data_file = resolve_data_file(args.data_file)?;
    let service = load_service(&data_file)?;

    let content = match args.format {
        ExportFormat::Csv => service.export_csv()?,
        ExportFormat::Json => serde_json::to_string_pretty(&service.export_bundle()?)?,
    };

    match args.output {
        Some(path) => {
            fs::write(&path, content)?;
            println!("Export written to {}", path.display());
        }
        None => print!("{content}"),
    }
    Ok(())
}

pub(crate) fn run_import(args: ImportArgs) -> Result<(), AppError> {
    let data_file = resolve_data_file(args.data_file)?;
    let service = load_service(&data_file)?;

    let summary = import_file(&service, &args.file)?;
    save_to(&service, &data_file)?;

    println!(
        "Imported {} applications, {} certifications, {} skills into {}",
        summary.count,
        summary.certifications,
        summary.skills,
        data_file.path().display()
    );
    Ok(())
}

fn import_file(service: &AppService, path: &Path) -> Result<ImportSummary, AppError> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        let payload: ImportPayload = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        Ok(service.import_json(payload)?)
    } else {
        let raw = fs::read_to_string(path)?;
        let content = job_tracker::tracker::transfer::strip_bom(&raw);
        Ok(service.import_csv(content.as_bytes())?)
    }
}

pub(crate) fn render_reminders(
    today: NaiveDate,
    reminders: &[Reminder],
    statuses: &[CertificationStatusView],
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Reminders for {today}");
    if reminders.is_empty() {
        let _ = writeln!(out, "- nothing due");
    }
    for reminder in reminders {
        let _ = writeln!(out, "- [{}] {}", reminder.kind.label(), reminder.message);
    }

    if !statuses.is_empty() {
        let _ = writeln!(out, "\nCertifications");
        for status in statuses {
            match status.bucket {
                ExpiryBucket::Normal => {
                    let _ = writeln!(out, "- {}: valid", status.name);
                }
                _ => {
                    let _ = writeln!(
                        out,
                        "- {}: {}",
                        status.name,
                        status.display_text.as_deref().unwrap_or(status.bucket.label())
                    );
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use job_tracker::tracker::{ApplicationDraft, CertificationDraft, TrackerRepository};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn render_lists_reminders_and_certification_states() {
        let service = build_service();
        let today = Local::now().date_naive();
        let mut draft = ApplicationDraft::new("Acme", "Dev");
        draft.submitted_on = Some(today - chrono::Duration::days(10));
        service.submit(draft).expect("submit");
        service
            .add_certification(CertificationDraft {
                name: "PMP".to_string(),
                obtained_on: Some(day(2020, 1, 1)),
                expires_on: Some(today - chrono::Duration::days(3)),
            })
            .expect("certification");

        let text = render_reminders(
            today,
            &service.reminders(today).expect("reminders"),
            &service.certification_statuses(today).expect("statuses"),
        );

        assert!(text.contains("Follow up with Acme for the Dev position (10 days)"));
        assert!(text.contains("- PMP: expired 3 days ago"));
    }

    #[test]
    fn render_reports_an_empty_day() {
        let text = render_reminders(day(2025, 1, 1), &[], &[]);
        assert_eq!(text, "Reminders for 2025-01-01\n- nothing due\n");
    }

    #[test]
    fn import_merges_csv_and_json_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        let csv = dir.path().join("applications.csv");
        fs::write(
            &csv,
            "\u{feff}Company,Position,Status\nAcme,Dev,submitted\nGlobex,Ops,interview\n",
        )
        .expect("write csv");
        let json = dir.path().join("applications.json");
        fs::write(&json, r#"[{"company":"Initech","position":"QA"}]"#).expect("write json");
        let data_file = DataFile::new(dir.path().join("tracker.json"));

        run_import(ImportArgs {
            file: csv,
            data_file: Some(data_file.path().to_path_buf()),
        })
        .expect("csv import");
        run_import(ImportArgs {
            file: json,
            data_file: Some(data_file.path().to_path_buf()),
        })
        .expect("json import");

        let service = load_service(&data_file).expect("reload");
        assert_eq!(service.repository().applications().expect("list").len(), 3);
    }

    #[test]
    fn export_writes_the_requested_format() {
        let dir = tempfile::tempdir().expect("temp dir");
        let data_file = DataFile::new(dir.path().join("tracker.json"));
        let service = build_service();
        service
            .submit(ApplicationDraft::new("Acme", "Dev"))
            .expect("submit");
        save_to(&service, &data_file).expect("save");

        let output = dir.path().join("export.csv");
        run_export(ExportArgs {
            data_file: Some(data_file.path().to_path_buf()),
            format: ExportFormat::Csv,
            output: Some(output.clone()),
        })
        .expect("export");

        let csv = fs::read_to_string(output).expect("read export");
        assert!(csv.starts_with("Company,Position,Status"));
        assert!(csv.contains("Acme,Dev,submitted"));
    }
}
