//! REST API 라우트.
//!
//! - `/health`: 헬스 체크
//! - `/api/auth`: 가입, 로그인, 로그아웃, 현재 사용자
//! - `/api/admin`: 관리자 전용 조회

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod health;

pub use admin::{admin_router, UsersListResponse};
pub use auth::{auth_router, AuthResponse, MessageResponse, SigninRequest, SignupRequest};
pub use health::{health_router, ComponentHealth, ComponentStatus, HealthResponse};

/// API 라우터 생성 (상태 미적용).
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", health_router())
        .nest("/api/auth", auth_router())
        .nest("/api/admin", admin_router())
}
