//! Axum용 인증 추출기.
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! async fn protected_handler(
//!     AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
//! ) -> impl IntoResponse {
//!     format!("Authenticated user: {}", principal.email)
//! }
//! ```

use std::convert::Infallible;
use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;

use genedge_core::{Principal, Role};

use super::session::{current_principal, require_auth, require_role};
use crate::error::ApiError;
use crate::state::AppState;

/// 선택적 인증 추출기.
///
/// 세션이 없거나 무효이면 `None`이며 요청을 거부하지 않습니다.
#[derive(Debug, Clone)]
pub struct MaybePrincipal(pub Option<Principal>);

impl FromRequestParts<Arc<AppState>> for MaybePrincipal {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        Ok(MaybePrincipal(current_principal(state, &jar).await))
    }
}

/// 인증 필수 추출기 (401).
#[derive(Debug, Clone)]
pub struct AuthenticatedPrincipal(pub Principal);

impl FromRequestParts<Arc<AppState>> for AuthenticatedPrincipal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let principal = require_auth(state, &jar).await?;
        Ok(AuthenticatedPrincipal(principal))
    }
}

/// Admin 권한을 요구하는 추출기 (401 / 403).
#[derive(Debug, Clone)]
pub struct AdminPrincipal(pub Principal);

impl FromRequestParts<Arc<AppState>> for AdminPrincipal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let AuthenticatedPrincipal(principal) =
            AuthenticatedPrincipal::from_request_parts(parts, state).await?;
        require_role(Role::Admin, &principal)?;
        Ok(AdminPrincipal(principal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header::COOKIE, Request, StatusCode};
    use crate::state::create_test_state;
    use genedge_core::NewPrincipal;

    fn parts_with_cookie(cookie: Option<String>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        let (parts, _) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn test_maybe_principal_never_rejects() {
        let state = Arc::new(create_test_state());
        let mut parts = parts_with_cookie(Some("token=garbage".to_string()));

        let MaybePrincipal(principal) = MaybePrincipal::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert!(principal.is_none());
    }

    #[tokio::test]
    async fn test_authenticated_principal_rejects_anonymous() {
        let state = Arc::new(create_test_state());
        let mut parts = parts_with_cookie(None);

        let err = AuthenticatedPrincipal::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_principal() {
        let state = Arc::new(create_test_state());
        let admin = state
            .directory
            .fallback()
            .seed_admin(
                NewPrincipal::student("Admin User", "admin@genedge.ac", "hash")
                    .with_role(Role::Admin),
            )
            .await;
        let (student, _) = state
            .directory
            .register("Asha", "a@b.com", "secret1")
            .await
            .unwrap();

        let admin_cookie = format!("token={}", state.tokens.issue_for(&admin).unwrap());
        let mut parts = parts_with_cookie(Some(admin_cookie));
        let AdminPrincipal(resolved) = AdminPrincipal::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(resolved.id, "admin-1");

        let student_cookie = format!("token={}", state.tokens.issue_for(&student).unwrap());
        let mut parts = parts_with_cookie(Some(student_cookie));
        let err = AdminPrincipal::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }
}
