//! 사용자 디렉터리 추상화.
//!
//! 주 저장소(PostgreSQL)와 메모리 대체 디렉터리가 같은 인터페이스를
//! 구현하여 장애 시 교체 가능하도록 합니다.

use async_trait::async_trait;
use thiserror::Error;

use super::{NewPrincipal, Principal, PrincipalRecord};

// =============================================================================
// 에러 타입
// =============================================================================

/// 디렉터리 에러.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// 저장소에 접근할 수 없음 (연결 실패, 타임아웃 등)
    #[error("저장소 사용 불가: {0}")]
    Unavailable(String),

    /// 이미 가입된 이메일
    #[error("이미 등록된 이메일: {0}")]
    Duplicate(String),
}

impl DirectoryError {
    /// 대체 디렉터리로 넘어가야 하는 에러인지 확인.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, DirectoryError::Unavailable(_))
    }
}

// =============================================================================
// PrincipalDirectory Trait
// =============================================================================

/// 사용자 디렉터리 trait.
///
/// 조회 결과가 없으면 `Ok(None)`을 반환하고, 저장소 자체에 접근하지 못한
/// 경우에만 `DirectoryError::Unavailable`을 반환해야 합니다.
#[async_trait]
pub trait PrincipalDirectory: Send + Sync {
    /// ID로 조회.
    async fn find_by_id(&self, id: &str) -> Result<Option<Principal>, DirectoryError>;

    /// 이메일로 조회 (비밀번호 해시 포함).
    ///
    /// `email`은 정규화된 값이어야 합니다.
    async fn find_by_email(&self, email: &str) -> Result<Option<PrincipalRecord>, DirectoryError>;

    /// 신규 사용자 생성.
    ///
    /// # Errors
    ///
    /// - `DirectoryError::Duplicate`: 같은 이메일이 이미 존재
    /// - `DirectoryError::Unavailable`: 저장소 접근 실패
    async fn create(&self, new: NewPrincipal) -> Result<Principal, DirectoryError>;

    /// 전체 사용자 목록 (가입 순).
    async fn list(&self) -> Result<Vec<Principal>, DirectoryError>;

    /// 연결 상태 확인. 원격 저장소만 재정의합니다.
    async fn health_check(&self) -> Result<(), DirectoryError> {
        Ok(())
    }

    /// 로깅용 이름.
    fn name(&self) -> &'static str;
}
