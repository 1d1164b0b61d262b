//! 인증 endpoint.
//!
//! 가입, 로그인, 로그아웃, 현재 사용자 조회를 제공합니다.
//! 세션은 HttpOnly `token` 쿠키로 전달됩니다.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

use genedge_core::{normalize_email, IdentityError, Principal};

use crate::auth::{
    expired_session_cookie, session_cookie, AuthenticatedPrincipal, MaybePrincipal,
};
use crate::error::{ApiError, ApiErrorResponse, ApiResult};
use crate::metrics::{record_signin, record_signup};
use crate::state::AppState;

// ==================== 요청/응답 타입 ====================

/// 가입 요청.
#[derive(Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// 로그인 요청.
#[derive(Deserialize, Validate, ToSchema)]
pub struct SigninRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// 가입/로그인 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: Principal,
    pub message: String,
}

/// 메시지만 담은 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl SignupRequest {
    fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: normalize_email(&self.email),
            password: self.password,
        }
    }
}

impl SigninRequest {
    fn normalized(self) -> Self {
        Self {
            email: normalize_email(&self.email),
            password: self.password,
        }
    }
}

/// JSON 본문 추출 실패를 400으로 변환.
fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| IdentityError::MalformedBody(rejection.body_text()).into())
}

// ==================== 핸들러 ====================

/// 가입
///
/// POST /api/auth/signup
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "가입 성공, 세션 쿠키 발급", body = AuthResponse),
        (status = 400, description = "입력 오류 또는 이미 가입된 이메일", body = ApiErrorResponse),
        (status = 503, description = "사용 가능한 사용자 저장소 없음", body = ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn signup(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, CookieJar, Json<AuthResponse>)> {
    let request = parse_body(payload)?.normalized();
    request.validate()?;

    let (user, store) = state
        .directory
        .register(&request.name, &request.email, &request.password)
        .await?;
    record_signup(store);
    info!(email = %user.email, store, "User signed up");

    let token = state
        .tokens
        .issue_for(&user)
        .map_err(|e| IdentityError::Internal(e.to_string()))?;
    let jar = jar.add(session_cookie(token, state.tokens.ttl(), state.cookie_secure));

    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            user,
            message: "User created successfully".to_string(),
        }),
    ))
}

/// 로그인
///
/// POST /api/auth/signin
#[utoipa::path(
    post,
    path = "/api/auth/signin",
    request_body = SigninRequest,
    responses(
        (status = 200, description = "로그인 성공, 세션 쿠키 발급", body = AuthResponse),
        (status = 400, description = "입력 오류", body = ApiErrorResponse),
        (status = 401, description = "이메일 또는 비밀번호 불일치", body = ApiErrorResponse),
        (status = 503, description = "사용 가능한 사용자 저장소 없음", body = ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn signin(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    payload: Result<Json<SigninRequest>, JsonRejection>,
) -> ApiResult<(CookieJar, Json<AuthResponse>)> {
    let request = parse_body(payload)?.normalized();
    request.validate()?;

    let user = match state
        .directory
        .authenticate(&request.email, &request.password)
        .await
    {
        Ok(user) => user,
        Err(e) => {
            record_signin(signin_outcome(&e));
            info!(email = %request.email, reason = e.code(), "Sign-in rejected");
            return Err(e.into());
        }
    };

    let token = state
        .tokens
        .issue_for(&user)
        .map_err(|e| IdentityError::Internal(e.to_string()))?;
    record_signin("success");
    info!(email = %user.email, "User signed in");

    let jar = jar.add(session_cookie(token, state.tokens.ttl(), state.cookie_secure));

    Ok((
        jar,
        Json(AuthResponse {
            user,
            message: "Login successful".to_string(),
        }),
    ))
}

fn signin_outcome(err: &IdentityError) -> &'static str {
    match err {
        IdentityError::InvalidCredentials => "invalid_credentials",
        IdentityError::StoreUnavailable => "unavailable",
        _ => "error",
    }
}

/// 로그아웃
///
/// 세션 쿠키를 만료시킵니다. 토큰 자체는 만료 시각까지 유효합니다.
///
/// POST /api/auth/logout
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "세션 쿠키 삭제", body = MessageResponse)),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    MaybePrincipal(principal): MaybePrincipal,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    if let Some(principal) = principal {
        info!(email = %principal.email, "User logged out");
    }
    let jar = jar.add(expired_session_cookie(state.cookie_secure));

    (
        jar,
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    )
}

/// 현재 사용자
///
/// GET /api/auth/me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "현재 로그인한 사용자", body = Principal),
        (status = 401, description = "세션 없음 또는 무효", body = ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn me(AuthenticatedPrincipal(principal): AuthenticatedPrincipal) -> Json<Principal> {
    Json(principal)
}

/// 인증 라우터 생성.
pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/logout", post(logout))
        .route("/me", get(me))
}
