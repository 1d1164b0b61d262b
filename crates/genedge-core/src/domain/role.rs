//! 역할 기반 접근 제어 (RBAC).
//!
//! 수강생/관리자 역할과 역할 검사 규칙 정의.

use serde::{Deserialize, Serialize};

/// 사용자 역할.
///
/// 직렬화 시 `"STUDENT"`, `"ADMIN"` 형태를 사용합니다 (DB 저장 값과 동일).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// 수강생 - 가입 시 기본 역할
    #[default]
    Student,
    /// 관리자 - 모든 역할 검사를 통과
    Admin,
}

impl Role {
    /// 요구 역할을 충족하는지 확인.
    ///
    /// 역할이 정확히 일치하거나 관리자이면 통과합니다.
    pub fn satisfies(&self, required: Role) -> bool {
        *self == required || self.is_admin()
    }

    /// 관리자 여부.
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// 저장/전송용 문자열.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "STUDENT",
            Role::Admin => "ADMIN",
        }
    }

    /// 문자열에서 역할 파싱 (대소문자 무시).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STUDENT" => Some(Role::Student),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
