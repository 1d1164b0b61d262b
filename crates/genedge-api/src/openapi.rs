//! OpenAPI 문서화 설정.
//!
//! utoipa로 OpenAPI 3.0 스펙을 생성하고 `/api-docs/openapi.json`으로 제공합니다.
//!
//! 새 엔드포인트를 추가할 때:
//!
//! 1. 요청/응답 타입에 `#[derive(ToSchema)]` 추가
//! 2. 핸들러에 `#[utoipa::path(...)]` 어노테이션 추가
//! 3. 이 파일의 `paths(...)` 및 `components(schemas(...))`에 추가

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

use genedge_core::{Principal, Role};

use crate::error::ApiErrorResponse;
use crate::routes::{
    admin, auth, health, AuthResponse, ComponentHealth, ComponentStatus, HealthResponse,
    MessageResponse, SigninRequest, SignupRequest, UsersListResponse,
};

/// GenEdge Identity API 문서.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "GenEdge Identity API",
        description = r#"
# GenEdge 인증/세션 API

가입, 로그인, 로그아웃, 현재 사용자 조회 및 역할 기반 권한 검사를 제공합니다.

## 인증

로그인/가입 성공 시 HttpOnly `token` 쿠키가 발급됩니다.
보호된 엔드포인트는 이 쿠키로 사용자를 식별합니다.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "로컬 개발 서버"),
    ),
    tags(
        (name = "health", description = "헬스 체크 - 서버 상태 확인"),
        (name = "auth", description = "인증 - 가입/로그인/로그아웃/현재 사용자"),
        (name = "admin", description = "관리자 - 사용자 조회")
    ),
    paths(
        health::health_check,
        health::health_ready,
        auth::signup,
        auth::signin,
        auth::logout,
        auth::me,
        admin::list_users,
    ),
    components(
        schemas(
            // ===== Common =====
            ApiErrorResponse,
            Principal,
            Role,

            // ===== Health =====
            HealthResponse,
            ComponentHealth,
            ComponentStatus,

            // ===== Auth =====
            SignupRequest,
            SigninRequest,
            AuthResponse,
            MessageResponse,

            // ===== Admin =====
            UsersListResponse,
        )
    )
)]
pub struct ApiDoc;

/// OpenAPI JSON 라우터.
pub fn openapi_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let spec = Arc::new(ApiDoc::openapi());
    Router::new().route(
        "/api-docs/openapi.json",
        get(move || {
            let spec = spec.clone();
            async move { Json(spec.as_ref().clone()) }
        }),
    )
}
