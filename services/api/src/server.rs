use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_contest_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use concorso::backoffice::{Backoffice, BackofficeContext, StaticCredentials};
use concorso::config::AppConfig;
use concorso::error::AppError;
use concorso::intake::{FsSubmissionStore, SubmissionPipeline};
use concorso::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    std::fs::create_dir_all(&config.storage.submissions_root)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(FsSubmissionStore::new(&config.storage.submissions_root));
    let pipeline = Arc::new(SubmissionPipeline::new(store));
    let context = Arc::new(BackofficeContext {
        backoffice: Backoffice::new(&config.storage.submissions_root),
        credentials: Arc::new(StaticCredentials::new(&config.admin)),
    });

    let app = with_contest_routes(pipeline, context)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        submissions = %config.storage.submissions_root.display(),
        "contest intake service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
