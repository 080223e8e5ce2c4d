use super::common::*;
use crate::tracker::domain::ApplicationStatus;
use crate::tracker::reminders::{
    collect_reminders, due_notifications, ApplicationStatusView, CertificationStatusView,
    ReminderAction, ReminderKind,
};
use crate::tracker::{ApplicationId, CertificationId, ExpiryBucket};
use chrono::Duration;

#[test]
fn follow_up_starts_on_the_seventh_day() {
    let now = today();
    let week_old = record(1, "Acme", ApplicationStatus::Submitted, Some(now - Duration::days(7)));
    let six_days = record(2, "Globex", ApplicationStatus::Submitted, Some(now - Duration::days(6)));

    let reminders = collect_reminders(&[week_old, six_days], &[], now);

    assert_eq!(reminders.len(), 1);
    assert_eq!(reminders[0].kind, ReminderKind::FollowUpDue);
    assert_eq!(
        reminders[0].message,
        "Follow up with Acme for the Backend Engineer position (7 days)"
    );
    assert_eq!(
        reminders[0].action,
        ReminderAction::RecordFollowUp {
            application_id: ApplicationId(1)
        }
    );
}

#[test]
fn only_submitted_applications_raise_follow_ups() {
    let now = today();
    let old = Some(now - Duration::days(40));
    let applications: Vec<_> = ApplicationStatus::ordered()
        .into_iter()
        .enumerate()
        .map(|(index, status)| record(index as u64 + 1, "Acme", status, old))
        .collect();

    let reminders = collect_reminders(&applications, &[], now);

    assert_eq!(reminders.len(), 1);
    assert_eq!(
        reminders[0].action,
        ReminderAction::RecordFollowUp {
            application_id: ApplicationId(1)
        }
    );
}

#[test]
fn missing_or_future_submission_dates_never_remind() {
    let now = today();
    let undated = record(1, "Acme", ApplicationStatus::Submitted, None);
    let future = record(2, "Globex", ApplicationStatus::Submitted, Some(now + Duration::days(10)));

    assert!(collect_reminders(&[undated.clone(), future.clone()], &[], now).is_empty());
    assert_eq!(ApplicationStatusView::derive(&undated, now).days_since_submission, None);
    assert_eq!(
        ApplicationStatusView::derive(&future, now).days_since_submission,
        Some(-10)
    );
}

#[test]
fn certification_window_covers_zero_through_thirty_days() {
    let now = today();
    let certifications = vec![
        certification(1, "AWS SA", Some(now + Duration::days(30))),
        certification(2, "CKA", Some(now + Duration::days(31))),
        certification(3, "PMP", Some(now)),
        certification(4, "CISSP", Some(now - Duration::days(1))),
        certification(5, "Scrum", None),
    ];

    let reminders = collect_reminders(&[], &certifications, now);
    let ids: Vec<_> = reminders
        .iter()
        .map(|reminder| reminder.action)
        .collect();

    assert_eq!(
        ids,
        vec![
            ReminderAction::ReviewCertification {
                certification_id: CertificationId(1)
            },
            ReminderAction::ReviewCertification {
                certification_id: CertificationId(3)
            },
        ]
    );
    assert_eq!(reminders[0].message, "Certification AWS SA expires in 30 days");
    assert_eq!(reminders[1].message, "Certification PMP expires in 0 days");
}

#[test]
fn reminders_list_applications_before_certifications() {
    let now = today();
    let applications = vec![
        record(3, "Initech", ApplicationStatus::Submitted, Some(now - Duration::days(9))),
        record(1, "Acme", ApplicationStatus::Submitted, Some(now - Duration::days(20))),
    ];
    let certifications = vec![certification(8, "CKA", Some(now + Duration::days(5)))];

    let kinds: Vec<_> = collect_reminders(&applications, &certifications, now)
        .into_iter()
        .map(|reminder| (reminder.kind, reminder.action))
        .collect();

    assert_eq!(
        kinds,
        vec![
            (
                ReminderKind::FollowUpDue,
                ReminderAction::RecordFollowUp {
                    application_id: ApplicationId(3)
                }
            ),
            (
                ReminderKind::FollowUpDue,
                ReminderAction::RecordFollowUp {
                    application_id: ApplicationId(1)
                }
            ),
            (
                ReminderKind::CertificationExpiring,
                ReminderAction::ReviewCertification {
                    certification_id: CertificationId(8)
                }
            ),
        ]
    );
}

#[test]
fn empty_input_yields_no_reminders_or_notifications() {
    assert!(collect_reminders(&[], &[], today()).is_empty());
    assert!(due_notifications(&[], today()).is_empty());
}

#[test]
fn evaluation_is_repeatable_for_the_same_inputs() {
    let now = today();
    let applications = vec![record(
        1,
        "Acme",
        ApplicationStatus::Submitted,
        Some(now - Duration::days(12)),
    )];
    let certifications = vec![certification(1, "CKA", Some(now + Duration::days(2)))];

    let first = collect_reminders(&applications, &certifications, now);
    let second = collect_reminders(&applications, &certifications, now);
    assert_eq!(first, second);
}

#[test]
fn notifications_fire_only_on_days_seven_and_fourteen() {
    let now = today();
    let applications: Vec<_> = [6, 7, 8, 14, 15]
        .into_iter()
        .map(|days| {
            record(
                days as u64,
                "Acme",
                ApplicationStatus::Submitted,
                Some(now - Duration::days(days)),
            )
        })
        .collect();

    let notifications = due_notifications(&applications, now);
    let days: Vec<_> = notifications
        .iter()
        .map(|notification| notification.days_since_submission)
        .collect();

    assert_eq!(days, vec![7, 14]);
    assert_eq!(notifications[0].title, "Follow-up reminder");
    assert_eq!(
        notifications[0].message,
        "Time to follow up with Acme for the Backend Engineer position"
    );
}

#[test]
fn status_views_expose_badges_and_expiry_text() {
    let now = today();
    let application = record(
        4,
        "Acme",
        ApplicationStatus::Interview,
        Some(now - Duration::days(3)),
    );
    let view = ApplicationStatusView::derive(&application, now);
    assert_eq!(view.status_label, ApplicationStatus::Interview.display_label());
    assert_eq!(view.days_since_submission, Some(3));
    assert!(!view.follow_up_due);

    let expired = CertificationStatusView::derive(
        &certification(1, "PMP", Some(now - Duration::days(4))),
        now,
    );
    assert_eq!(expired.bucket, ExpiryBucket::Expired { days_ago: 4 });
    assert_eq!(expired.display_text.as_deref(), Some("expired 4 days ago"));

    let json = serde_json::to_value(&expired).expect("serializes");
    assert_eq!(json["bucket"], "expired");
    assert_eq!(json["days_ago"], 4);
}
