//! 주 저장소 + 메모리 대체 디렉터리 조합.
//!
//! 주 저장소 호출은 circuit breaker를 거칩니다. 저장소 사용 불가 에러가
//! 임계값만큼 연속되면 Open 상태가 되어 reset timeout 동안 주 저장소를
//! 호출하지 않고 바로 메모리 디렉터리를 사용합니다.
//!
//! "사용자 없음"은 장애가 아니므로 circuit breaker에 실패로 기록하지 않지만,
//! 조회는 대체 디렉터리까지 이어집니다. 부트스트랩 관리자와 장애 중 가입한
//! 사용자는 대체 디렉터리에만 존재합니다.

use std::sync::Arc;

use genedge_core::{
    normalize_email, CircuitBreaker, CircuitBreakerConfig, CircuitState, DirectoryError,
    IdentityError, IdentityResult, NewPrincipal, Principal, PrincipalDirectory, PrincipalRecord,
};

use super::MemoryPrincipalDirectory;
use crate::auth::password::{burn_verification, hash_password, verify_password};
use crate::metrics::record_directory_fallback;

/// 주 저장소 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryStatus {
    /// 설정되지 않음 (메모리 전용)
    NotConfigured,
    Up,
    Down,
}

/// 장애 전환 디렉터리.
pub struct FailoverDirectory {
    primary: Option<Arc<dyn PrincipalDirectory>>,
    fallback: Arc<MemoryPrincipalDirectory>,
    fallback_enabled: bool,
    breaker: CircuitBreaker,
}

impl FailoverDirectory {
    pub fn new(
        primary: Option<Arc<dyn PrincipalDirectory>>,
        fallback: Arc<MemoryPrincipalDirectory>,
        breaker_config: CircuitBreakerConfig,
    ) -> Self {
        Self {
            primary,
            fallback,
            fallback_enabled: true,
            breaker: CircuitBreaker::new("principal-directory", breaker_config),
        }
    }

    /// 메모리 전용 디렉터리 (주 저장소 없음).
    pub fn memory_only(fallback: Arc<MemoryPrincipalDirectory>) -> Self {
        Self::new(None, fallback, CircuitBreakerConfig::default())
    }

    /// 대체 디렉터리 사용 여부 설정.
    #[must_use]
    pub fn with_fallback_enabled(mut self, enabled: bool) -> Self {
        self.fallback_enabled = enabled;
        self
    }

    pub fn fallback(&self) -> &Arc<MemoryPrincipalDirectory> {
        &self.fallback
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }

    /// 주 저장소 누적 실패 횟수와 circuit Open 전이 횟수.
    pub fn circuit_counters(&self) -> (u64, u64) {
        (self.breaker.total_failures(), self.breaker.open_count())
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    pub fn fallback_enabled(&self) -> bool {
        self.fallback_enabled
    }

    // ==================== 내부 헬퍼 ====================

    /// 호출 가능한 주 저장소 (설정되어 있고 circuit이 Open이 아닐 때).
    fn available_primary(
        &self,
        operation: &'static str,
    ) -> Option<&Arc<dyn PrincipalDirectory>> {
        let primary = self.primary.as_ref()?;
        if self.breaker.is_allowed() {
            Some(primary)
        } else {
            tracing::debug!(operation, "Circuit open, skipping primary store");
            None
        }
    }

    /// 주 저장소 호출 결과를 circuit breaker에 반영.
    ///
    /// 사용 불가 에러는 `None`으로 바꿔 대체 디렉터리로 넘어가게 합니다.
    fn observe<T>(
        &self,
        operation: &'static str,
        result: Result<T, DirectoryError>,
    ) -> Option<Result<T, DirectoryError>> {
        match result {
            Err(DirectoryError::Unavailable(reason)) => {
                self.breaker.record_failure();
                tracing::warn!(operation, %reason, "Primary store unavailable");
                None
            }
            other => {
                self.breaker.record_success();
                Some(other)
            }
        }
    }

    /// 대체 디렉터리 사용 (비활성화된 경우 `StoreUnavailable`).
    fn use_fallback(
        &self,
        operation: &'static str,
    ) -> Result<&MemoryPrincipalDirectory, DirectoryError> {
        if self.has_primary() {
            if !self.fallback_enabled {
                return Err(DirectoryError::Unavailable(
                    "primary store down and fallback disabled".to_string(),
                ));
            }
            record_directory_fallback(operation);
            tracing::info!(operation, "Using fallback directory");
        }
        Ok(&self.fallback)
    }

    /// 주 저장소에 없는 사용자를 찾을 대체 디렉터리 (비활성화 시 `None`).
    fn fallback_for_miss(&self) -> Option<&MemoryPrincipalDirectory> {
        self.fallback_enabled.then_some(&*self.fallback)
    }

    // ==================== 조회 ====================

    /// 세션 토큰의 주체를 현재 레코드로 해석.
    ///
    /// 주 저장소는 ID로 조회하고, 대체 디렉터리는 이메일로 조회한 뒤
    /// ID가 일치할 때만 인정합니다.
    pub async fn resolve_session(
        &self,
        principal_id: &str,
        email: &str,
    ) -> Result<Option<Principal>, DirectoryError> {
        const OP: &str = "resolve_session";

        if let Some(primary) = self.available_primary(OP) {
            if let Some(result) = self.observe(OP, primary.find_by_id(principal_id).await) {
                if let Some(principal) = result? {
                    return Ok(Some(principal));
                }
                return match self.fallback_for_miss() {
                    Some(fallback) => fallback_session(fallback, principal_id, email).await,
                    None => Ok(None),
                };
            }
        }

        fallback_session(self.use_fallback(OP)?, principal_id, email).await
    }

    async fn find_credentials(
        &self,
        email: &str,
    ) -> Result<Option<PrincipalRecord>, DirectoryError> {
        const OP: &str = "find_by_email";

        if let Some(primary) = self.available_primary(OP) {
            if let Some(result) = self.observe(OP, primary.find_by_email(email).await) {
                if let Some(record) = result? {
                    return Ok(Some(record));
                }
                return match self.fallback_for_miss() {
                    Some(fallback) => fallback.find_by_email(email).await,
                    None => Ok(None),
                };
            }
        }

        self.use_fallback(OP)?.find_by_email(email).await
    }

    /// 이메일/비밀번호 인증.
    ///
    /// 가입되지 않은 이메일과 비밀번호 불일치는 같은 에러를 반환합니다.
    pub async fn authenticate(&self, email: &str, password: &str) -> IdentityResult<Principal> {
        let email = normalize_email(email);

        match self.find_credentials(&email).await? {
            Some(record) if verify_password(password, &record.password_hash) => {
                Ok(record.into_principal())
            }
            Some(_) => Err(IdentityError::InvalidCredentials),
            None => {
                burn_verification(password);
                Err(IdentityError::InvalidCredentials)
            }
        }
    }

    // ==================== 생성 ====================

    /// 신규 수강생 등록.
    ///
    /// 생성된 Principal과 실제로 저장된 디렉터리 이름을 반환합니다.
    pub async fn register(
        &self,
        display_name: &str,
        email: &str,
        password: &str,
    ) -> IdentityResult<(Principal, &'static str)> {
        const OP: &str = "create";

        let password_hash =
            hash_password(password).map_err(|e| IdentityError::Internal(e.to_string()))?;
        let new = NewPrincipal::student(display_name.trim(), email, password_hash);

        if let Some(primary) = self.available_primary(OP) {
            // 대체 디렉터리에만 있는 사용자를 주 저장소 계정이 가리지 않도록 함
            if let Some(fallback) = self.fallback_for_miss() {
                if fallback.find_by_email(&new.email).await?.is_some() {
                    return Err(IdentityError::EmailTaken);
                }
            }
            if let Some(result) = self.observe(OP, primary.create(new.clone()).await) {
                return Ok((result?, primary.name()));
            }
        }

        let fallback = self.use_fallback(OP)?;
        let principal = fallback.create(new).await?;
        Ok((principal, fallback.name()))
    }

    // ==================== 관리 ====================

    /// 현재 사용 중인 디렉터리의 전체 사용자 목록.
    pub async fn list(&self) -> Result<Vec<Principal>, DirectoryError> {
        const OP: &str = "list";

        if let Some(primary) = self.available_primary(OP) {
            if let Some(result) = self.observe(OP, primary.list().await) {
                return result;
            }
        }

        self.use_fallback(OP)?.list().await
    }

    /// 주 저장소 상태 확인 (readiness 용).
    pub async fn primary_status(&self) -> PrimaryStatus {
        let Some(primary) = self.primary.as_ref() else {
            return PrimaryStatus::NotConfigured;
        };

        match primary.health_check().await {
            Ok(()) => PrimaryStatus::Up,
            Err(e) => {
                tracing::debug!(error = %e, "Primary store health check failed");
                PrimaryStatus::Down
            }
        }
    }

    /// 대체 디렉터리에 저장된 사용자 수.
    pub async fn fallback_size(&self) -> usize {
        self.fallback.len().await
    }
}

/// 대체 디렉터리에서 세션 주체 조회.
///
/// 이메일로 찾은 레코드의 ID가 토큰의 `sub`와 같을 때만 인정합니다.
async fn fallback_session(
    fallback: &MemoryPrincipalDirectory,
    principal_id: &str,
    email: &str,
) -> Result<Option<Principal>, DirectoryError> {
    let record = fallback.find_by_email(&normalize_email(email)).await?;
    Ok(record
        .map(PrincipalRecord::into_principal)
        .filter(|p| p.id == principal_id))
}
