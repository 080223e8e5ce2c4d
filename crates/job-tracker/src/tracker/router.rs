use std::io::Cursor;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::domain::{
    ApplicationDraft, ApplicationId, ApplicationRecord, CertificationDraft, CertificationId,
};
use super::reminders::{ApplicationStatusView, ReminderAction};
use super::repository::{NotificationPublisher, RepositoryError, TrackerRepository};
use super::service::{SearchQuery, TrackerService, TrackerServiceError};
use super::transfer::{strip_bom, ImportPayload};

type SharedService<R, N> = State<Arc<TrackerService<R, N>>>;

/// Router builder exposing the tracker's REST endpoints.
pub fn tracker_router<R, N>(service: Arc<TrackerService<R, N>>) -> Router
where
    R: TrackerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route(
            "/api/applications",
            get(list_applications::<R, N>).post(create_application::<R, N>),
        )
        .route("/api/applications/search", get(search_applications::<R, N>))
        .route(
            "/api/applications/:application_id",
            get(get_application::<R, N>)
                .put(update_application::<R, N>)
                .delete(delete_application::<R, N>),
        )
        .route(
            "/api/applications/:application_id/follow-ups",
            post(record_follow_up::<R, N>),
        )
        .route(
            "/api/certifications",
            get(list_certifications::<R, N>).post(create_certification::<R, N>),
        )
        .route(
            "/api/certifications/status",
            get(certification_statuses::<R, N>),
        )
        .route(
            "/api/certifications/:certification_id",
            delete(delete_certification::<R, N>),
        )
        .route(
            "/api/skills",
            get(list_skills::<R, N>).post(add_skill::<R, N>),
        )
        .route("/api/skills/reset", post(reset_skills::<R, N>))
        .route("/api/skills/:name", delete(remove_skill::<R, N>))
        .route("/api/stats", get(stats::<R, N>))
        .route("/api/stats/advanced", get(advanced_stats::<R, N>))
        .route("/api/reminders", get(reminders::<R, N>))
        .route("/api/reminders/dispatch", post(dispatch_reminder::<R, N>))
        .route("/api/export/csv", get(export_csv::<R, N>))
        .route("/api/export/json", get(export_json::<R, N>))
        .route("/api/template/csv", get(csv_template::<R, N>))
        .route("/api/import/csv", post(import_csv::<R, N>))
        .route("/api/import/json", post(import_json::<R, N>))
        .with_state(service)
}

impl IntoResponse for TrackerServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            TrackerServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            TrackerServiceError::Transfer(_) => StatusCode::BAD_REQUEST,
            TrackerServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            TrackerServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
            TrackerServiceError::Repository(RepositoryError::Unavailable(_))
            | TrackerServiceError::Notification(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "tracker request failed");
        }

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// Application record plus the derived status badge and day count.
#[derive(Debug, Serialize)]
pub struct ApplicationView {
    #[serde(flatten)]
    pub record: ApplicationRecord,
    pub display: ApplicationStatusView,
}

impl ApplicationView {
    pub fn new(record: ApplicationRecord, today: NaiveDate) -> Self {
        let display = ApplicationStatusView::derive(&record, today);
        Self { record, display }
    }
}

fn views(records: Vec<ApplicationRecord>, today: NaiveDate) -> Vec<ApplicationView> {
    records
        .into_iter()
        .map(|record| ApplicationView::new(record, today))
        .collect()
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DateQuery {
    #[serde(default)]
    today: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FollowUpRequest {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SkillRequest {
    name: String,
}

pub(crate) async fn list_applications<R, N>(
    State(service): SharedService<R, N>,
) -> Result<Json<Vec<ApplicationView>>, TrackerServiceError>
where
    R: TrackerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let records = service.list()?;
    Ok(Json(views(records, service.today())))
}

pub(crate) async fn create_application<R, N>(
    State(service): SharedService<R, N>,
    Json(draft): Json<ApplicationDraft>,
) -> Result<impl IntoResponse, TrackerServiceError>
where
    R: TrackerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let record = service.submit(draft)?;
    let view = ApplicationView::new(record, service.today());
    Ok((StatusCode::CREATED, Json(view)))
}

pub(crate) async fn search_applications<R, N>(
    State(service): SharedService<R, N>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<ApplicationView>>, TrackerServiceError>
where
    R: TrackerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let records = service.search(&query)?;
    Ok(Json(views(records, service.today())))
}

pub(crate) async fn get_application<R, N>(
    State(service): SharedService<R, N>,
    Path(application_id): Path<u64>,
) -> Result<Json<ApplicationView>, TrackerServiceError>
where
    R: TrackerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let record = service.get(ApplicationId(application_id))?;
    Ok(Json(ApplicationView::new(record, service.today())))
}

pub(crate) async fn update_application<R, N>(
    State(service): SharedService<R, N>,
    Path(application_id): Path<u64>,
    Json(draft): Json<ApplicationDraft>,
) -> Result<Json<ApplicationView>, TrackerServiceError>
where
    R: TrackerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let record = service.update(ApplicationId(application_id), draft)?;
    Ok(Json(ApplicationView::new(record, service.today())))
}

pub(crate) async fn delete_application<R, N>(
    State(service): SharedService<R, N>,
    Path(application_id): Path<u64>,
) -> Result<StatusCode, TrackerServiceError>
where
    R: TrackerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    service.delete(ApplicationId(application_id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn record_follow_up<R, N>(
    State(service): SharedService<R, N>,
    Path(application_id): Path<u64>,
    Json(request): Json<FollowUpRequest>,
) -> Result<Json<ApplicationView>, TrackerServiceError>
where
    R: TrackerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let record = service.record_follow_up(ApplicationId(application_id), request.message)?;
    Ok(Json(ApplicationView::new(record, service.today())))
}

pub(crate) async fn list_certifications<R, N>(
    State(service): SharedService<R, N>,
) -> Result<impl IntoResponse, TrackerServiceError>
where
    R: TrackerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    Ok(Json(service.certifications()?))
}

pub(crate) async fn create_certification<R, N>(
    State(service): SharedService<R, N>,
    Json(draft): Json<CertificationDraft>,
) -> Result<impl IntoResponse, TrackerServiceError>
where
    R: TrackerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let certification = service.add_certification(draft)?;
    Ok((StatusCode::CREATED, Json(certification)))
}

pub(crate) async fn certification_statuses<R, N>(
    State(service): SharedService<R, N>,
    Query(query): Query<DateQuery>,
) -> Result<impl IntoResponse, TrackerServiceError>
where
    R: TrackerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let today = query.today.unwrap_or_else(|| service.today());
    Ok(Json(service.certification_statuses(today)?))
}

pub(crate) async fn delete_certification<R, N>(
    State(service): SharedService<R, N>,
    Path(certification_id): Path<u64>,
) -> Result<StatusCode, TrackerServiceError>
where
    R: TrackerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    service.delete_certification(CertificationId(certification_id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn list_skills<R, N>(
    State(service): SharedService<R, N>,
) -> Result<Json<Vec<String>>, TrackerServiceError>
where
    R: TrackerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    Ok(Json(service.skills()?))
}

pub(crate) async fn add_skill<R, N>(
    State(service): SharedService<R, N>,
    Json(request): Json<SkillRequest>,
) -> Result<impl IntoResponse, TrackerServiceError>
where
    R: TrackerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    service.add_skill(&request.name)?;
    Ok((StatusCode::CREATED, Json(service.skills()?)))
}

pub(crate) async fn remove_skill<R, N>(
    State(service): SharedService<R, N>,
    Path(name): Path<String>,
) -> Result<StatusCode, TrackerServiceError>
where
    R: TrackerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    service.remove_skill(&name)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn reset_skills<R, N>(
    State(service): SharedService<R, N>,
) -> Result<Json<Vec<String>>, TrackerServiceError>
where
    R: TrackerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    Ok(Json(service.reset_skills()?))
}

pub(crate) async fn stats<R, N>(
    State(service): SharedService<R, N>,
) -> Result<impl IntoResponse, TrackerServiceError>
where
    R: TrackerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    Ok(Json(service.stats()?))
}

pub(crate) async fn advanced_stats<R, N>(
    State(service): SharedService<R, N>,
) -> Result<impl IntoResponse, TrackerServiceError>
where
    R: TrackerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    Ok(Json(service.advanced_stats()?))
}

pub(crate) async fn reminders<R, N>(
    State(service): SharedService<R, N>,
    Query(query): Query<DateQuery>,
) -> Result<impl IntoResponse, TrackerServiceError>
where
    R: TrackerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let today = query.today.unwrap_or_else(|| service.today());
    Ok(Json(service.reminders(today)?))
}

pub(crate) async fn dispatch_reminder<R, N>(
    State(service): SharedService<R, N>,
    Json(action): Json<ReminderAction>,
) -> Result<impl IntoResponse, TrackerServiceError>
where
    R: TrackerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    Ok(Json(service.dispatch(action)?))
}

fn attachment(filename: String) -> String {
    format!("attachment; filename=\"{filename}\"")
}

pub(crate) async fn export_csv<R, N>(
    State(service): SharedService<R, N>,
) -> Result<Response, TrackerServiceError>
where
    R: TrackerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let csv = service.export_csv()?;
    let stamp = service.now().format("%Y%m%d_%H%M%S");
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                attachment(format!("applications_{stamp}.csv")),
            ),
        ],
        csv,
    )
        .into_response())
}

pub(crate) async fn export_json<R, N>(
    State(service): SharedService<R, N>,
) -> Result<Response, TrackerServiceError>
where
    R: TrackerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let bundle = service.export_bundle()?;
    let filename = format!(
        "applications_export_{}.json",
        bundle.exported_at.format("%Y%m%d_%H%M%S")
    );
    Ok((
        StatusCode::OK,
        [(header::CONTENT_DISPOSITION, attachment(filename))],
        Json(bundle),
    )
        .into_response())
}

pub(crate) async fn csv_template<R, N>(
    State(service): SharedService<R, N>,
) -> Result<Response, TrackerServiceError>
where
    R: TrackerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let template = service.csv_template()?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                attachment("applications_template.csv".to_string()),
            ),
        ],
        template,
    )
        .into_response())
}

pub(crate) async fn import_csv<R, N>(
    State(service): SharedService<R, N>,
    body: String,
) -> Result<impl IntoResponse, TrackerServiceError>
where
    R: TrackerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let content = strip_bom(&body);
    let summary = service.import_csv(Cursor::new(content.as_bytes()))?;
    Ok((StatusCode::CREATED, Json(summary)))
}

pub(crate) async fn import_json<R, N>(
    State(service): SharedService<R, N>,
    Json(payload): Json<ImportPayload>,
) -> Result<impl IntoResponse, TrackerServiceError>
where
    R: TrackerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let summary = service.import_json(payload)?;
    Ok((StatusCode::CREATED, Json(summary)))
}
