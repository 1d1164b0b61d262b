//! 인증 주체(Principal) 모델.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Role;

/// 인증된 사용자.
///
/// 클라이언트에 그대로 직렬화되므로 자격 증명은 포함하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    /// 불투명 식별자 (DB: UUID 문자열, 메모리 디렉터리: `user-N`)
    pub id: String,
    /// 표시 이름
    #[serde(rename = "name")]
    pub display_name: String,
    /// 이메일 (고유)
    pub email: String,
    /// 역할
    pub role: Role,
    /// 가입 시각
    pub created_at: DateTime<Utc>,
}

/// 저장소 레코드 (Principal + 비밀번호 해시).
#[derive(Clone)]
pub struct PrincipalRecord {
    pub principal: Principal,
    /// PHC 형식 해시
    pub password_hash: String,
}

impl PrincipalRecord {
    pub fn into_principal(self) -> Principal {
        self.principal
    }
}

impl std::fmt::Debug for PrincipalRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrincipalRecord")
            .field("principal", &self.principal)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

/// 신규 가입 입력.
///
/// 비밀번호는 호출자가 미리 해싱해서 전달합니다.
#[derive(Clone)]
pub struct NewPrincipal {
    pub display_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

impl NewPrincipal {
    /// 수강생 역할로 생성.
    pub fn student(
        display_name: impl Into<String>,
        email: &str,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            email: normalize_email(email),
            password_hash: password_hash.into(),
            role: Role::Student,
        }
    }

    /// 역할 지정 (부트스트랩 관리자 시드용).
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

impl std::fmt::Debug for NewPrincipal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewPrincipal")
            .field("display_name", &self.display_name)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// 이메일 정규화 (공백 제거 + 소문자).
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
