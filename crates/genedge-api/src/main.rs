//! GenEdge 인증/세션 API 서버.
//!
//! Axum 기반 REST API 서버를 시작합니다.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{http::StatusCode, middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use genedge_api::auth::{hash_password, prepare_dummy_hash, TokenService};
use genedge_api::metrics::setup_metrics_recorder;
use genedge_api::middleware::metrics_layer;
use genedge_api::openapi::{openapi_router, ApiDoc};
use genedge_api::repository::{
    FailoverDirectory, MemoryPrincipalDirectory, PgPrincipalDirectory,
};
use genedge_api::routes::create_api_router;
use genedge_api::state::AppState;
use genedge_core::{
    init_logging, AppConfig, BootstrapAdminConfig, CircuitBreakerConfig, DatabaseConfig,
    NewPrincipal, PrincipalDirectory, Role,
};

/// OpenAPI 스펙 내보내기 처리.
///
/// `--export-openapi` 플래그 또는 `EXPORT_OPENAPI` 환경변수가 설정되면
/// OpenAPI JSON 스펙을 stdout으로 출력하고 true를 반환합니다.
fn handle_export_openapi() -> anyhow::Result<bool> {
    use utoipa::OpenApi as _;

    let export_flag = std::env::args().any(|arg| arg == "--export-openapi");
    let export_env = std::env::var("EXPORT_OPENAPI")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    if export_flag || export_env {
        let json = serde_json::to_string_pretty(&ApiDoc::openapi())?;
        println!("{}", json);
        return Ok(true);
    }

    Ok(false)
}

/// 주 저장소 연결.
///
/// 연결은 지연 생성되므로 DB가 아직 떠 있지 않아도 서버는 시작되며,
/// 그동안의 요청은 대체 디렉터리가 처리합니다.
async fn connect_primary(
    config: &DatabaseConfig,
) -> anyhow::Result<Option<(sqlx::PgPool, Arc<dyn PrincipalDirectory>)>> {
    let Some(url) = config.url.as_deref() else {
        warn!("database.url not set, using in-memory directory only");
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect_lazy(url)
        .context("invalid database URL")?;

    let directory = PgPrincipalDirectory::new(pool.clone());
    match directory.ensure_schema().await {
        Ok(()) => info!("Connected to PostgreSQL, users table ready"),
        Err(e) => error!(
            error = %e,
            "PostgreSQL unreachable at startup, fallback directory will serve requests"
        ),
    }

    let primary: Arc<dyn PrincipalDirectory> = Arc::new(directory);
    Ok(Some((pool, primary)))
}

/// 부트스트랩 관리자를 메모리 디렉터리에 등록.
async fn seed_bootstrap_admin(
    fallback: &MemoryPrincipalDirectory,
    config: &BootstrapAdminConfig,
) -> anyhow::Result<()> {
    let Some(password) = config.password.as_deref() else {
        warn!(
            "bootstrap_admin.password not set, fallback directory starts without an administrator"
        );
        return Ok(());
    };

    let hash = hash_password(password).context("failed to hash bootstrap admin password")?;
    let admin = NewPrincipal::student(&config.name, &config.email, hash).with_role(Role::Admin);
    let admin = fallback.seed_admin(admin).await;
    info!(email = %admin.email, "Bootstrap administrator seeded in fallback directory");

    Ok(())
}

/// CORS 레이어 생성.
///
/// `CORS_ORIGINS`가 설정되면 해당 origin만 허용하고 쿠키 전송을 허용합니다.
fn cors_layer() -> CorsLayer {
    let origins: Vec<_> = std::env::var("CORS_ORIGINS")
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    if origins.is_empty() {
        warn!("CORS_ORIGINS not set, allowing any origin without credentials (development mode)");
        layer.allow_origin(AllowOrigin::any())
    } else {
        info!("CORS configured with {} allowed origins", origins.len());
        layer
            .allow_origin(AllowOrigin::list(origins))
            .allow_credentials(true)
    }
}

async fn metrics_handler(
    axum::extract::State(handle): axum::extract::State<PrometheusHandle>,
) -> String {
    handle.render()
}

/// 전체 라우터 생성.
fn create_router(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    Router::new()
        .merge(metrics_router)
        .merge(create_api_router().with_state(state))
        .merge(openapi_router())
        .layer(middleware::from_fn(metrics_layer))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(cors_layer())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    if handle_export_openapi()? {
        return Ok(());
    }

    let config = AppConfig::load_default().context("failed to load configuration")?;
    init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    // 서명 키가 없거나 짧으면 기동하지 않음
    if let Err(e) = config.validate() {
        error!(
            error = %e,
            "Invalid configuration, set JWT_SECRET (>= 32 bytes) and check config/default.toml"
        );
        return Err(e.into());
    }
    let secret = config.auth.signing_secret()?;

    info!("Starting GenEdge identity API server...");

    let metrics_handle = setup_metrics_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install metrics recorder: {e}"))?;
    info!("Prometheus metrics recorder initialized");

    let addr: SocketAddr = config.bind_address().parse().with_context(|| {
        format!(
            "invalid bind address {}, check API_HOST and API_PORT",
            config.bind_address()
        )
    })?;

    // 사용자 디렉터리 구성
    let fallback = Arc::new(MemoryPrincipalDirectory::new());
    seed_bootstrap_admin(&fallback, &config.bootstrap_admin).await?;
    prepare_dummy_hash().context("failed to prepare dummy password hash")?;

    let primary = connect_primary(&config.database).await?;
    let (db_pool, primary_directory) = match primary {
        Some((pool, directory)) => (Some(pool), Some(directory)),
        None => (None, None),
    };

    let directory = FailoverDirectory::new(
        primary_directory,
        fallback,
        CircuitBreakerConfig::from(&config.directory),
    )
    .with_fallback_enabled(config.directory.fallback_enabled);

    let tokens = TokenService::new(&secret);
    let mut state = AppState::new(Arc::new(directory), tokens, config.auth.cookie_secure);
    if let Some(pool) = db_pool {
        state = state.with_db_pool(pool);
    }
    let state = Arc::new(state);

    info!(
        version = %state.version,
        has_db = state.db_pool.is_some(),
        fallback_enabled = config.directory.fallback_enabled,
        cookie_secure = config.auth.cookie_secure,
        token_ttl_days = genedge_core::SESSION_TOKEN_TTL_DAYS,
        "Application state initialized"
    );

    let shutdown_token = CancellationToken::new();
    let app = create_router(state.clone(), metrics_handle);

    info!(%addr, "API server listening");
    info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);
    info!("Metrics available at http://{}/metrics", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_token.clone()))
        .await?;

    info!("Server shutdown initiated, cleaning up...");
    shutdown_token.cancel();

    if let Some(pool) = &state.db_pool {
        if tokio::time::timeout(Duration::from_secs(10), pool.close())
            .await
            .is_err()
        {
            warn!("Timed out closing database pool, forcing shutdown");
        }
    }

    info!("Server stopped gracefully");

    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 종료 토큰을 취소합니다.
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
        _ = shutdown_token.cancelled() => {}
    }

    shutdown_token.cancel();
}
