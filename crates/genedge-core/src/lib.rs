//! # GenEdge Core
//!
//! 인증 서비스의 핵심 도메인 모델 및 공통 인프라를 제공합니다:
//! - 사용자(Principal)와 역할(Role)
//! - 사용자 디렉터리 trait (주 저장소 / 메모리 대체 디렉터리)
//! - 인증 에러 분류
//! - 설정 관리
//! - 로깅 인프라
//! - 주 저장소 장애 감지용 circuit breaker

pub mod circuit_breaker;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
