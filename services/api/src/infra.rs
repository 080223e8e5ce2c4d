use axum::extract::{Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::Response;
use job_tracker::error::AppError;
use job_tracker::tracker::{
    ApplicationId, ExportBundle, FollowUpNotification, InMemoryTrackerRepository,
    NotificationError, NotificationPublisher, TrackerService,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

pub(crate) type AppService = TrackerService<InMemoryTrackerRepository, LogNotifier>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Writes follow-up notifications to the log, once per application and
/// notification day.
#[derive(Default)]
pub(crate) struct LogNotifier {
    sent: Mutex<HashSet<(ApplicationId, i64)>>,
}

impl NotificationPublisher for LogNotifier {
    fn publish(&self, notification: FollowUpNotification) -> Result<(), NotificationError> {
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| NotificationError::Transport("notifier lock poisoned".to_string()))?;
        let key = (
            notification.application_id,
            notification.days_since_submission,
        );
        if !sent.insert(key) {
            debug!(application_id = %notification.application_id, "notification already sent");
            return Ok(());
        }

        info!(
            application_id = %notification.application_id,
            days = notification.days_since_submission,
            title = %notification.title,
            "{}",
            notification.message
        );
        Ok(())
    }
}

pub(crate) fn build_service() -> Arc<AppService> {
    Arc::new(TrackerService::new(
        Arc::new(InMemoryTrackerRepository::with_default_skills()),
        Arc::new(LogNotifier::default()),
    ))
}

/// JSON snapshot of the whole tracker kept on disk. Clones share one write lock.
#[derive(Debug, Clone)]
pub(crate) struct DataFile {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl DataFile {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// `None` when the file does not exist yet.
    pub(crate) fn load(&self) -> Result<Option<ExportBundle>, AppError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Written to a sibling temp file, then renamed over the snapshot. Callers
    /// hold the write lock.
    fn save(&self, bundle: &ExportBundle) -> Result<(), AppError> {
        let payload = serde_json::to_vec_pretty(bundle)?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, payload)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }
}

/// Load the data file into the service, if one is configured.
pub(crate) fn restore_from(service: &AppService, data_file: &DataFile) -> Result<usize, AppError> {
    match data_file.load()? {
        Some(bundle) => {
            let count = bundle.applications.len();
            service.restore(bundle)?;
            info!(path = %data_file.path().display(), count, "tracker data restored");
            Ok(count)
        }
        None => {
            info!(path = %data_file.path().display(), "no data file yet, starting empty");
            Ok(0)
        }
    }
}

/// Export and write while holding the data file lock.
pub(crate) fn save_to(service: &AppService, data_file: &DataFile) -> Result<(), AppError> {
    let _guard = data_file.lock();
    let bundle = service.export_bundle()?;
    data_file.save(&bundle)
}

#[derive(Clone)]
pub(crate) struct Persistence {
    pub(crate) service: Arc<AppService>,
    pub(crate) data_file: DataFile,
}

/// Rewrite the data file after every successful mutating request.
pub(crate) async fn persist_changes(
    State(persistence): State<Persistence>,
    request: Request,
    next: Next,
) -> Response {
    let mutating = !matches!(*request.method(), Method::GET | Method::HEAD | Method::OPTIONS);
    let response = next.run(request).await;

    if mutating && response.status().is_success() {
        if let Err(err) = save_to(&persistence.service, &persistence.data_file) {
            error!(
                error = %err,
                path = %persistence.data_file.path().display(),
                "failed to persist tracker data"
            );
        }
    }

    response
}

/// Evaluate due follow-up notifications on a fixed interval.
pub(crate) fn spawn_reminder_dispatcher(
    service: Arc<AppService>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let today = service.today();
            match service.notify_due(today) {
                Ok(count) => debug!(count, %today, "reminder sweep finished"),
                Err(err) => warn!(error = %err, "reminder sweep failed"),
            }
        }
    })
}
