use crate::cli::ServeArgs;
use crate::infra::{AppState, HtmlReportDirectory, InMemoryOverrideRepository};
use crate::routes::with_allocation_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use edupath::config::AppConfig;
use edupath::error::AppError;
use edupath::telemetry;
use edupath::workflows::allocation::{AllocationService, Catalog};
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

    let catalog = Catalog::from_path(&config.allocation.catalog_path)?;
    info!(
        path = %config.allocation.catalog_path.display(),
        universities = catalog.universities().len(),
        courses = catalog.course_count(),
        "course catalog loaded"
    );

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let publisher = Arc::new(HtmlReportDirectory::new(&config.allocation.report_dir));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        report_dir: Arc::new(publisher.root().to_path_buf()),
    };

    let overrides = Arc::new(InMemoryOverrideRepository::default());
    let allocation_service = Arc::new(AllocationService::new(
        catalog,
        config.allocation.roster.clone(),
        overrides,
        publisher,
    ));

    let app = with_allocation_routes(allocation_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "edupath allocation service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
