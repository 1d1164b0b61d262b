//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! `Arc<AppState>`로 래핑되어 axum `State` extractor를 통해 주입됩니다.

use std::sync::Arc;

use secrecy::SecretString;

use crate::auth::TokenService;
use crate::repository::{FailoverDirectory, MemoryPrincipalDirectory};

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 사용자 디렉터리 (주 저장소 + 메모리 대체)
    pub directory: Arc<FailoverDirectory>,

    /// 세션 토큰 발급/검증기
    pub tokens: TokenService,

    /// 세션 쿠키 `Secure` 속성 여부
    pub cookie_secure: bool,

    /// PostgreSQL 연결 풀 (설정된 경우)
    pub db_pool: Option<sqlx::PgPool>,

    /// 서버 시작 시간
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// 서버 버전
    pub version: String,
}

impl AppState {
    pub fn new(
        directory: Arc<FailoverDirectory>,
        tokens: TokenService,
        cookie_secure: bool,
    ) -> Self {
        Self {
            directory,
            tokens,
            cookie_secure,
            db_pool: None,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// DB 연결 풀 설정.
    pub fn with_db_pool(mut self, pool: sqlx::PgPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// 서버 가동 시간 (초).
    pub fn uptime_secs(&self) -> i64 {
        (chrono::Utc::now() - self.started_at).num_seconds()
    }
}

/// 테스트용 AppState 생성 헬퍼.
///
/// 주 저장소 없이 메모리 디렉터리만 사용하며 고정 서명 키를 씁니다.
pub fn create_test_state() -> AppState {
    let secret = SecretString::new("test-secret-key-for-jwt-testing-minimum-32-chars".into());
    let directory = FailoverDirectory::memory_only(Arc::new(MemoryPrincipalDirectory::new()));

    AppState::new(Arc::new(directory), TokenService::new(&secret), false)
}
