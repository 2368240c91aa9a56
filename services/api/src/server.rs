use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_campus_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use campus_erp::config::AppConfig;
use campus_erp::error::AppError;
use campus_erp::telemetry;
use campus_erp::Campus;
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

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let campus = Campus::open(&config, Arc::new(mockable::DefaultClock))?;
    info!(
        erp = %config.database.erp_path.display(),
        auth = %config.database.auth_path.display(),
        drop_cutoff = %config.enrollment.drop_cutoff,
        course_drop_mode = ?config.enrollment.course_drop_mode,
        "databases opened"
    );

    let app = with_campus_routes(&campus)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "campus ERP API ready");

    axum::serve(listener, app).await?;
    Ok(())
}
