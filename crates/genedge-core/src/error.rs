//! 인증 서비스 에러 타입.
//!
//! HTTP 경계에서 상태 코드로 변환되는 도메인 에러를 정의합니다.
//! 클라이언트에 내부 정보가 노출되지 않도록 메시지는 고정 문구를 사용합니다.

use thiserror::Error;
use validator::ValidationErrors;

use crate::domain::{DirectoryError, Role};

/// 인증/세션 에러.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// 입력 검증 실패 (필드별 상세 포함)
    #[error("Validation failed")]
    Validation(#[from] ValidationErrors),

    /// 요청 본문을 해석할 수 없음
    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    /// 이미 가입된 이메일
    #[error("User with this email already exists")]
    EmailTaken,

    /// 이메일 또는 비밀번호 불일치 (어느 쪽인지 구분하지 않음)
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// 세션 없음 또는 무효
    #[error("Authentication required")]
    AuthenticationRequired,

    /// 역할 부족
    #[error("Role {required} required")]
    InsufficientRole { required: Role },

    /// 주 저장소와 대체 디렉터리 모두 사용 불가
    #[error("User store unavailable")]
    StoreUnavailable,

    /// 내부 에러 (해싱/토큰 서명 실패 등)
    #[error("Internal server error")]
    Internal(String),
}

/// 인증 작업 Result 타입.
pub type IdentityResult<T> = Result<T, IdentityError>;

impl IdentityError {
    /// 클라이언트용 에러 코드.
    pub fn code(&self) -> &'static str {
        match self {
            IdentityError::Validation(_) => "VALIDATION_ERROR",
            IdentityError::MalformedBody(_) => "INVALID_BODY",
            IdentityError::EmailTaken => "EMAIL_TAKEN",
            IdentityError::InvalidCredentials => "INVALID_CREDENTIALS",
            IdentityError::AuthenticationRequired => "AUTHENTICATION_REQUIRED",
            IdentityError::InsufficientRole { .. } => "INSUFFICIENT_ROLE",
            IdentityError::StoreUnavailable => "STORE_UNAVAILABLE",
            IdentityError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 인증 관련 에러(401/403)인지 확인.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            IdentityError::InvalidCredentials
                | IdentityError::AuthenticationRequired
                | IdentityError::InsufficientRole { .. }
        )
    }
}

impl From<DirectoryError> for IdentityError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Duplicate(_) => IdentityError::EmailTaken,
            DirectoryError::Unavailable(_) => IdentityError::StoreUnavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_error_conversion() {
        let taken: IdentityError = DirectoryError::Duplicate("a@b.com".to_string()).into();
        assert!(matches!(taken, IdentityError::EmailTaken));

        let down: IdentityError = DirectoryError::Unavailable("pool timed out".to_string()).into();
        assert!(matches!(down, IdentityError::StoreUnavailable));
        // 내부 원인은 메시지에 포함되지 않음
        assert!(!down.to_string().contains("pool"));
    }

    #[test]
    fn test_invalid_credentials_message_is_generic() {
        assert_eq!(
            IdentityError::InvalidCredentials.to_string(),
            "Invalid email or password"
        );
    }

    #[test]
    fn test_insufficient_role_message() {
        let err = IdentityError::InsufficientRole { required: Role::Admin };
        assert_eq!(err.to_string(), "Role ADMIN required");
        assert_eq!(err.code(), "INSUFFICIENT_ROLE");
        assert!(err.is_auth_failure());
    }

    #[test]
    fn test_internal_hides_detail() {
        let err = IdentityError::Internal("argon2 params".to_string());
        assert_eq!(err.to_string(), "Internal server error");
        assert!(!err.is_auth_failure());
    }
}
