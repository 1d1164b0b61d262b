//! # GenEdge API
//!
//! GenEdge 인증/세션 서비스의 REST API 서버입니다.
//!
//! ## 모듈 구조
//!
//! - `auth`: 비밀번호 해싱, 세션 토큰, 쿠키, Principal 해석, 추출기
//! - `repository`: 사용자 디렉터리 (PostgreSQL, 메모리, 장애 전환)
//! - `routes`: HTTP 엔드포인트
//! - `middleware`: HTTP 메트릭 미들웨어
//! - `metrics`: Prometheus 메트릭
//! - `error`: API 에러 응답
//! - `state`: 공유 애플리케이션 상태
//! - `openapi`: OpenAPI 문서

pub mod auth;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod openapi;
pub mod repository;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiErrorResponse, ApiResult};
pub use state::{create_test_state, AppState};
