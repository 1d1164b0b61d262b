//! 주 저장소 장애 감지용 Circuit Breaker.
//!
//! # 상태 전이
//!
//! ```text
//! Closed ──[연속 실패 임계치 도달]──> Open
//!    ↑                                 │
//!    │                        [reset_timeout 경과]
//!    │                                 ↓
//!    └──[연속 성공]── HalfOpen ──[실패]──> Open
//! ```
//!
//! Open 상태에서는 주 저장소 호출을 건너뛰고 곧바로 대체 디렉터리를 사용합니다.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::config::DirectoryConfig;

/// Circuit Breaker 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// 정상 - 주 저장소 사용
    Closed,
    /// 장애 - 주 저장소 호출 생략
    Open,
    /// 복구 확인 중
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half_open"),
        }
    }
}

/// Circuit Breaker 설정.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub reset_timeout: Duration,
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self::from(&DirectoryConfig::default())
    }
}

impl From<&DirectoryConfig> for CircuitBreakerConfig {
    fn from(config: &DirectoryConfig) -> Self {
        Self {
            failure_threshold: config.failure_threshold.max(1),
            reset_timeout: Duration::from_secs(config.reset_timeout_secs),
            success_threshold: config.success_threshold.max(1),
        }
    }
}

struct Inner {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    opened_at: Option<Instant>,
}

/// Circuit Breaker.
///
/// # Example
///
/// ```ignore
/// if breaker.is_allowed() {
///     match primary.find_by_id(id).await {
///         Err(e) if e.is_unavailable() => breaker.record_failure(),
///         _ => breaker.record_success(),
///     }
/// }
/// ```
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
    total_failures: AtomicU64,
    open_count: AtomicU64,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                failure_count: 0,
                success_count: 0,
                opened_at: None,
            }),
            total_failures: AtomicU64::new(0),
            open_count: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // 상태 갱신 중 패닉이 나도 카운터는 일관성을 유지함
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Open 상태에서 타임아웃이 지났으면 HalfOpen으로 전이.
    fn maybe_half_open(&self, inner: &mut Inner) {
        if inner.state == CircuitState::Open {
            let elapsed = inner.opened_at.map(|t| t.elapsed()).unwrap_or_default();
            if elapsed >= self.config.reset_timeout {
                inner.state = CircuitState::HalfOpen;
                inner.success_count = 0;
                tracing::info!(breaker = %self.name, "Circuit half-open, probing primary store");
            }
        }
    }

    /// 현재 상태.
    pub fn state(&self) -> CircuitState {
        let mut inner = self.lock();
        self.maybe_half_open(&mut inner);
        inner.state
    }

    /// 주 저장소 호출 허용 여부.
    pub fn is_allowed(&self) -> bool {
        self.state() != CircuitState::Open
    }

    /// 성공 기록.
    pub fn record_success(&self) {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => inner.failure_count = 0,
            CircuitState::HalfOpen => {
                inner.success_count += 1;
                if inner.success_count >= self.config.success_threshold {
                    inner.state = CircuitState::Closed;
                    inner.failure_count = 0;
                    inner.opened_at = None;
                    tracing::info!(breaker = %self.name, "Circuit closed, primary store recovered");
                }
            }
            CircuitState::Open => {}
        }
    }

    /// 실패 기록.
    pub fn record_failure(&self) {
        self.total_failures.fetch_add(1, Ordering::Relaxed);
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => {
                inner.failure_count += 1;
                if inner.failure_count >= self.config.failure_threshold {
                    self.trip(&mut inner);
                }
            }
            CircuitState::HalfOpen => self.trip(&mut inner),
            CircuitState::Open => {}
        }
    }

    fn trip(&self, inner: &mut Inner) {
        inner.state = CircuitState::Open;
        inner.opened_at = Some(Instant::now());
        inner.success_count = 0;
        self.open_count.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(
            breaker = %self.name,
            failures = inner.failure_count,
            reset_timeout_secs = self.config.reset_timeout.as_secs(),
            "Circuit opened, routing to fallback directory"
        );
    }

    /// 누적 실패 횟수.
    pub fn total_failures(&self) -> u64 {
        self.total_failures.load(Ordering::Relaxed)
    }

    /// Open 전이 횟수.
    pub fn open_count(&self) -> u64 {
        self.open_count.load(Ordering::Relaxed)
    }
}
