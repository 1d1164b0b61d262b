//! 헬스 체크 endpoint.
//!
//! 로드밸런서나 오케스트레이션 시스템(Kubernetes 등)에서 사용됩니다.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::repository::PrimaryStatus;
use crate::state::AppState;

/// 헬스 체크 응답 구조체.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// 전체 서비스 상태 ("healthy" | "degraded" | "unhealthy")
    pub status: String,

    /// API 버전
    pub version: String,

    /// 서버 업타임(초)
    pub uptime_secs: i64,

    /// 현재 시간 (ISO 8601)
    pub timestamp: String,

    /// 개별 컴포넌트 상태
    pub components: ComponentHealth,
}

/// 개별 컴포넌트 상태.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ComponentHealth {
    /// 주 저장소(PostgreSQL) 상태
    pub primary_store: ComponentStatus,

    /// 메모리 대체 디렉터리 상태
    pub fallback_directory: ComponentStatus,

    /// 주 저장소 circuit breaker 상태 ("closed" | "open" | "half_open")
    pub circuit: String,

    /// 주 저장소 누적 실패 횟수
    pub circuit_failures_total: u64,

    /// circuit Open 전이 횟수
    pub circuit_opens_total: u64,
}

/// 컴포넌트 상태.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ComponentStatus {
    /// 상태 ("up" | "down" | "disabled" | "not_configured")
    pub status: String,

    /// 추가 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentStatus {
    pub fn up() -> Self {
        Self {
            status: "up".to_string(),
            message: None,
        }
    }

    pub fn down(message: impl Into<String>) -> Self {
        Self {
            status: "down".to_string(),
            message: Some(message.into()),
        }
    }

    pub fn not_configured() -> Self {
        Self {
            status: "not_configured".to_string(),
            message: None,
        }
    }

    pub fn disabled() -> Self {
        Self {
            status: "disabled".to_string(),
            message: None,
        }
    }

    pub fn up_with_info(message: impl Into<String>) -> Self {
        Self {
            status: "up".to_string(),
            message: Some(message.into()),
        }
    }
}

/// 간단한 헬스 체크 (liveness probe용).
///
/// GET /health
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "서버 응답 가능"))
)]
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// 상세 헬스 체크 (readiness probe용).
///
/// 주 저장소가 다운되어도 대체 디렉터리가 활성화되어 있으면
/// `degraded`(200)이고, 사용할 수 있는 저장소가 없으면 `unhealthy`(503)입니다.
///
/// GET /health/ready
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "요청 처리 가능", body = HealthResponse),
        (status = 503, description = "사용 가능한 사용자 저장소 없음", body = HealthResponse)
    )
)]
pub async fn health_ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let directory = &state.directory;
    let mut overall_status = "healthy";
    let mut status_code = StatusCode::OK;

    let primary_store = match directory.primary_status().await {
        PrimaryStatus::Up => ComponentStatus::up(),
        PrimaryStatus::NotConfigured => ComponentStatus::not_configured(),
        PrimaryStatus::Down => {
            if directory.fallback_enabled() {
                overall_status = "degraded";
            } else {
                overall_status = "unhealthy";
                status_code = StatusCode::SERVICE_UNAVAILABLE;
            }
            ComponentStatus::down("connection failed")
        }
    };

    let fallback_directory = if directory.fallback_enabled() {
        ComponentStatus::up_with_info(format!(
            "{} users in memory",
            directory.fallback_size().await
        ))
    } else {
        ComponentStatus::disabled()
    };

    let (circuit_failures_total, circuit_opens_total) = directory.circuit_counters();
    let response = HealthResponse {
        status: overall_status.to_string(),
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        components: ComponentHealth {
            primary_store,
            fallback_directory,
            circuit: directory.circuit_state().to_string(),
            circuit_failures_total,
            circuit_opens_total,
        },
    };

    (status_code, Json(response))
}

/// 헬스 체크 라우터 생성.
pub fn health_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(health_ready))
}
