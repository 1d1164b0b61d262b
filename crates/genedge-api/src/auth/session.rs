//! 요청에서 인증 주체(Principal) 해석.
//!
//! 해석 실패는 모두 익명으로 처리하며, `require_*` 함수만 에러로 변환합니다.
//!
//! ```text
//! 쿠키 없음        -> 익명
//! 토큰 검증 실패   -> 익명
//! 토큰 유효        -> 디렉터리 조회 -> Principal / 익명(삭제된 사용자)
//! ```

use axum_extra::extract::cookie::CookieJar;

use genedge_core::{IdentityError, IdentityResult, Principal, Role};

use super::cookie::session_token;
use crate::state::AppState;

/// 현재 요청의 Principal.
///
/// 토큰에 담긴 역할이 아니라 디렉터리의 현재 레코드를 반환합니다.
pub async fn current_principal(state: &AppState, jar: &CookieJar) -> Option<Principal> {
    let token = session_token(jar)?;
    let claims = state.tokens.verify(token)?;

    match state.directory.resolve_session(&claims.sub, &claims.email).await {
        Ok(Some(principal)) => Some(principal),
        Ok(None) => {
            tracing::debug!(principal_id = %claims.sub, "Session principal no longer exists");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "Could not resolve session principal");
            None
        }
    }
}

/// 인증 필수.
///
/// # Errors
///
/// 세션이 없거나 무효이면 `IdentityError::AuthenticationRequired`.
pub async fn require_auth(state: &AppState, jar: &CookieJar) -> IdentityResult<Principal> {
    current_principal(state, jar)
        .await
        .ok_or(IdentityError::AuthenticationRequired)
}

/// 역할 확인.
///
/// 요구 역할과 같거나 ADMIN이면 통과합니다.
pub fn require_role(required: Role, principal: &Principal) -> IdentityResult<()> {
    if principal.role.satisfies(required) {
        Ok(())
    } else {
        tracing::debug!(
            principal_id = %principal.id,
            role = %principal.role,
            required = %required,
            "Role check failed"
        );
        Err(IdentityError::InsufficientRole { required })
    }
}
