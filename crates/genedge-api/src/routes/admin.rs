//! 관리자 endpoint.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use genedge_core::Principal;

use crate::auth::AdminPrincipal;
use crate::error::{ApiErrorResponse, ApiResult};
use crate::state::AppState;

/// 사용자 목록 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UsersListResponse {
    pub users: Vec<Principal>,
    pub total: usize,
}

/// 사용자 목록 (ADMIN 전용)
///
/// 현재 사용 중인 디렉터리의 사용자를 가입 순으로 반환합니다.
///
/// GET /api/admin/users
#[utoipa::path(
    get,
    path = "/api/admin/users",
    responses(
        (status = 200, description = "사용자 목록", body = UsersListResponse),
        (status = 401, description = "세션 없음", body = ApiErrorResponse),
        (status = 403, description = "ADMIN 권한 필요", body = ApiErrorResponse)
    ),
    tag = "admin"
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(admin): AdminPrincipal,
) -> ApiResult<Json<UsersListResponse>> {
    let users = state.directory.list().await?;
    tracing::debug!(admin_id = %admin.id, count = users.len(), "Listed users");

    Ok(Json(UsersListResponse {
        total: users.len(),
        users,
    }))
}

/// 관리자 라우터 생성.
pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new().route("/users", get(list_users))
}
