use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::domain::{ApplicationRecord, ApplicationStatus};
const SECONDS_PER_DAY: f64 = 86_400.0;

const TOP_LIMIT: usize = 10;
const MONTH_LIMIT: usize = 12;

/// Per-status counters shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub total: usize,
    pub submitted: usize,
    pub followed_up: usize,
    pub interview: usize,
    pub rejected: usize,
    pub accepted: usize,
    /// Percentage of applications that got an answer, ties rounded to even.
    pub response_rate: u32,
}

impl StatusSummary {
    pub fn from_applications(applications: &[ApplicationRecord]) -> Self {
        let mut summary = Self {
            total: applications.len(),
            ..Self::default()
        };

        for application in applications {
            let counter = match application.status {
                ApplicationStatus::Submitted => &mut summary.submitted,
                ApplicationStatus::FollowedUp => &mut summary.followed_up,
                ApplicationStatus::Interview => &mut summary.interview,
                ApplicationStatus::Rejected => &mut summary.rejected,
                ApplicationStatus::Accepted => &mut summary.accepted,
            };
            *counter += 1;
        }

        if summary.total > 0 {
            let responses = summary.interview + summary.rejected + summary.accepted;
            summary.response_rate = percent_half_even(responses, summary.total);
        }

        summary
    }

    pub fn count(&self, status: ApplicationStatus) -> usize {
        match status {
            ApplicationStatus::Submitted => self.submitted,
            ApplicationStatus::FollowedUp => self.followed_up,
            ApplicationStatus::Interview => self.interview,
            ApplicationStatus::Rejected => self.rejected,
            ApplicationStatus::Accepted => self.accepted,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvancedStats {
    /// Applications created per `YYYY-MM`, most recent twelve months with activity.
    pub monthly: BTreeMap<String, usize>,
    pub top_companies: Vec<NamedCount>,
    pub top_skills: Vec<NamedCount>,
    /// Mean days, time of day included, from midnight of the submission date to
    /// record creation, over answered applications.
    pub average_response_days: f64,
}

impl AdvancedStats {
    pub fn from_applications(applications: &[ApplicationRecord]) -> Self {
        let mut monthly: BTreeMap<String, usize> = BTreeMap::new();
        for application in applications {
            let month = application.created_at.format("%Y-%m").to_string();
            *monthly.entry(month).or_default() += 1;
        }
        while monthly.len() > MONTH_LIMIT {
            monthly.pop_first();
        }

        let top_companies = top_counts(applications.iter().map(|app| app.company.as_str()));
        let top_skills = top_counts(
            applications
                .iter()
                .flat_map(|app| app.skills.iter().map(String::as_str)),
        );

        let response_days: Vec<f64> = applications
            .iter()
            .filter(|app| app.status.is_response())
            .filter_map(|app| {
                let submitted = app.submitted_on?.and_hms_opt(0, 0, 0)?;
                Some((app.created_at - submitted).num_seconds() as f64 / SECONDS_PER_DAY)
            })
            .collect();
        let average_response_days = if response_days.is_empty() {
            0.0
        } else {
            let mean = response_days.iter().sum::<f64>() / response_days.len() as f64;
            (mean * 10.0).round() / 10.0
        };

        Self {
            monthly,
            top_companies,
            top_skills,
            average_response_days,
        }
    }
}

fn percent_half_even(part: usize, total: usize) -> u32 {
    let scaled = part * 100;
    let (quotient, remainder) = (scaled / total, scaled % total);
    let rounded = match (remainder * 2).cmp(&total) {
        std::cmp::Ordering::Greater => quotient + 1,
        std::cmp::Ordering::Equal if quotient % 2 == 1 => quotient + 1,
        _ => quotient,
    };
    rounded as u32
}

fn top_counts<'a>(names: impl Iterator<Item = &'a str>) -> Vec<NamedCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for name in names {
        *counts.entry(name).or_default() += 1;
    }

    let mut ranked: Vec<NamedCount> = counts
        .into_iter()
        .map(|(name, count)| NamedCount {
            name: name.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|left, right| {
        right
            .count
            .cmp(&left.count)
            .then_with(|| left.name.cmp(&right.name))
    });
    ranked.truncate(TOP_LIMIT);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::domain::{ApplicationDraft, ApplicationId};
    use chrono::NaiveDate;

    fn record(id: u64, company: &str, status: ApplicationStatus, month: u32) -> ApplicationRecord {
        let mut draft = ApplicationDraft::new(company, "Engineer");
        draft.status = status;
        draft.submitted_on = NaiveDate::from_ymd_opt(2024, month, 1);
        draft.skills.insert("rust".to_string());
        let created = NaiveDate::from_ymd_opt(2024, month, 11)
            .and_then(|date| date.and_hms_opt(10, 0, 0))
            .expect("valid timestamp");
        ApplicationRecord::from_draft(ApplicationId(id), draft, created)
    }

    #[test]
    fn summary_counts_and_rounds_response_rate() {
        let applications = vec![
            record(1, "Acme", ApplicationStatus::Submitted, 1),
            record(2, "Acme", ApplicationStatus::Interview, 1),
            record(3, "Globex", ApplicationStatus::FollowedUp, 2),
        ];
        let summary = StatusSummary::from_applications(&applications);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.count(ApplicationStatus::Submitted), 1);
        assert_eq!(summary.followed_up, 1);
        assert_eq!(summary.interview, 1);
        assert_eq!(summary.response_rate, 33);

        let halves = vec![
            record(1, "Acme", ApplicationStatus::Accepted, 1),
            record(2, "Acme", ApplicationStatus::Submitted, 1),
        ];
        assert_eq!(StatusSummary::from_applications(&halves).response_rate, 50);
    }

    #[test]
    fn response_rate_ties_round_to_even() {
        let with_answers = |answered: u64| -> Vec<ApplicationRecord> {
            (1..=8)
                .map(|id| {
                    let status = if id <= answered {
                        ApplicationStatus::Interview
                    } else {
                        ApplicationStatus::Submitted
                    };
                    record(id, "Acme", status, 1)
                })
                .collect()
        };

        assert_eq!(StatusSummary::from_applications(&with_answers(1)).response_rate, 12);
        assert_eq!(StatusSummary::from_applications(&with_answers(3)).response_rate, 38);
        assert_eq!(StatusSummary::from_applications(&with_answers(5)).response_rate, 62);
    }

    #[test]
    fn empty_summary_has_zero_rate() {
        assert_eq!(StatusSummary::from_applications(&[]), StatusSummary::default());
    }

    #[test]
    fn advanced_stats_rank_companies_and_skip_unanswered_response_times() {
        let applications = vec![
            record(1, "Globex", ApplicationStatus::Rejected, 1),
            record(2, "Acme", ApplicationStatus::Interview, 2),
            record(3, "Acme", ApplicationStatus::Submitted, 3),
        ];
        let stats = AdvancedStats::from_applications(&applications);

        assert_eq!(stats.top_companies[0].name, "Acme");
        assert_eq!(stats.top_companies[0].count, 2);
        assert_eq!(stats.top_skills[0].count, 3);
        assert_eq!(stats.monthly.get("2024-02"), Some(&1));
        assert_eq!(stats.average_response_days, 10.4);
    }

    #[test]
    fn monthly_stats_keep_latest_twelve_months() {
        let applications: Vec<ApplicationRecord> = (1..=12)
            .map(|month| record(month as u64, "Acme", ApplicationStatus::Submitted, month))
            .chain(std::iter::once({
                let mut older = record(99, "Acme", ApplicationStatus::Submitted, 1);
                older.created_at = NaiveDate::from_ymd_opt(2023, 12, 5)
                    .and_then(|date| date.and_hms_opt(9, 0, 0))
                    .expect("valid timestamp");
                older
            }))
            .collect();
        let stats = AdvancedStats::from_applications(&applications);
        assert_eq!(stats.monthly.len(), 12);
        assert!(!stats.monthly.contains_key("2023-12"));
    }
}
