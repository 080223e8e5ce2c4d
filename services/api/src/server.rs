use crate::cli::ServeArgs;
use crate::infra::{build_service, restore_from, spawn_reminder_dispatcher, AppState, DataFile};
use crate::routes::with_application_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use job_tracker::config::AppConfig;
use job_tracker::error::AppError;
use job_tracker::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(data_file) = args.data_file.take() {
        config.tracker.data_file = Some(data_file);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let service = build_service();
    let data_file = config.tracker.data_file.clone().map(DataFile::new);
    if let Some(data_file) = &data_file {
        restore_from(&service, data_file)?;
    }

    let dispatcher = spawn_reminder_dispatcher(service.clone(), config.tracker.reminder_interval);

    let app = with_application_routes(service, data_file)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        interval_secs = config.tracker.reminder_interval.as_secs(),
        persistent = config.tracker.data_file.is_some(),
        "job tracker ready"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    dispatcher.abort();
    info!("job tracker stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
