//! 인증 및 세션 모듈.
//!
//! - 비밀번호 해싱 (Argon2id)
//! - 세션 토큰 발급/검증 (JWT, HS256)
//! - 세션 쿠키
//! - 요청별 Principal 해석 및 역할 검사
//! - Axum 추출기

pub mod cookie;
pub mod extractors;
pub mod jwt;
pub mod password;
pub mod session;

pub use cookie::{expired_session_cookie, session_cookie, session_token, SESSION_COOKIE};
pub use extractors::{AdminPrincipal, AuthenticatedPrincipal, MaybePrincipal};
pub use genedge_core::Role;
pub use jwt::{Claims, JwtError, TokenService};
pub use password::{hash_password, prepare_dummy_hash, verify_password, PasswordError};
pub use session::{current_principal, require_auth, require_role};
