use crate::cli::ServeArgs;
use crate::infra::{storage_handles, AppState, ConfiguredObjectStore};
use crate::routes::with_accreditation_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use pmo::accreditation::AccreditationService;
use pmo::config::AppConfig;
use pmo::error::AppError;
use pmo::telemetry;
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let (submissions, attachments) = storage_handles(&config.storage);
    let accreditation_service = Arc::new(AccreditationService::new(submissions, attachments));

    let policy = Arc::new(config.access.policy());
    if policy.is_enabled() {
        info!(domains = ?policy.allowed_domains(), "e-mail domain allow-list active");
    } else {
        warn!("PMO_ALLOWED_EMAIL_DOMAINS is empty; accreditation routes are unguarded");
    }

    let app = with_accreditation_routes(accreditation_service, policy)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        storage = %ConfiguredObjectStore::from_config(&config.storage).describe(),
        submissions = %config.storage.submissions_object,
        "pmo dashboard api ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
