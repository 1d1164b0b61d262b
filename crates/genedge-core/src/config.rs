//! 설정 관리.
//!
//! 기본값 → 설정 파일 → `GENEDGE__*` 환경 변수 → 관례적 환경 변수
//! (`JWT_SECRET`, `DATABASE_URL`, `API_HOST`, `API_PORT`) 순서로 덮어씁니다.

use std::path::Path;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 기본 설정 파일 경로.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// 서명 키 최소 길이 (바이트).
pub const MIN_SECRET_LEN: usize = 32;

/// 세션 토큰 수명 (일). 설정으로 바꿀 수 없습니다.
pub const SESSION_TOKEN_TTL_DAYS: i64 = 15;

/// 설정 에러.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("설정 로드 실패: {0}")]
    Load(#[from] config::ConfigError),

    #[error("필수 설정 누락: {0}")]
    Missing(&'static str),

    #[error("{key} 값이 너무 짧습니다 (최소 {min}바이트)")]
    TooShort { key: &'static str, min: usize },

    #[error("잘못된 설정 값: {0}")]
    Invalid(String),
}

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// 서버 설정
    pub server: ServerConfig,
    /// 데이터베이스 설정
    pub database: DatabaseConfig,
    /// 인증 설정
    pub auth: AuthConfig,
    /// 부트스트랩 관리자
    pub bootstrap_admin: BootstrapAdminConfig,
    /// 디렉터리 장애 전환 설정
    pub directory: DirectoryConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// 데이터베이스 설정.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL 접속 URL (없으면 메모리 디렉터리만 사용)
    pub url: Option<String>,
    /// 최대 연결 수
    pub max_connections: u32,
    /// 연결 획득 타임아웃 (초)
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            acquire_timeout_secs: 5,
        }
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // URL에 비밀번호가 포함될 수 있음
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_ref().map(|_| "[REDACTED]"))
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .finish()
    }
}

/// 인증 설정.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// JWT 서명 키
    pub jwt_secret: Option<String>,
    /// 쿠키 `Secure` 속성 (운영 환경에서 true)
    pub cookie_secure: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            cookie_secure: false,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[REDACTED]"))
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}

impl AuthConfig {
    /// 검증된 서명 키 반환.
    ///
    /// 키가 없거나 짧으면 에러 (기본값으로 대체하지 않음).
    pub fn signing_secret(&self) -> Result<SecretString, ConfigError> {
        let secret = self
            .jwt_secret
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("auth.jwt_secret (JWT_SECRET)"))?;

        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::TooShort {
                key: "auth.jwt_secret",
                min: MIN_SECRET_LEN,
            });
        }

        Ok(SecretString::new(secret.into()))
    }
}

/// 부트스트랩 관리자 설정.
///
/// 비밀번호가 설정된 경우에만 메모리 디렉터리에 관리자 계정을 시드합니다.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BootstrapAdminConfig {
    pub email: String,
    pub name: String,
    pub password: Option<String>,
}

impl Default for BootstrapAdminConfig {
    fn default() -> Self {
        Self {
            email: "admin@genedge.ac".to_string(),
            name: "Admin User".to_string(),
            password: None,
        }
    }
}

impl std::fmt::Debug for BootstrapAdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdminConfig")
            .field("email", &self.email)
            .field("name", &self.name)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// 디렉터리 장애 전환 (circuit breaker) 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Open 전이까지 연속 실패 횟수
    pub failure_threshold: u32,
    /// Open 유지 시간 (초)
    pub reset_timeout_secs: u64,
    /// HalfOpen → Closed 전이에 필요한 연속 성공 횟수
    pub success_threshold: u32,
    /// 주 저장소 장애 시 메모리 디렉터리 사용 여부
    pub fallback_enabled: bool,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            reset_timeout_secs: 30,
            success_threshold: 1,
            fallback_enabled: true,
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨 필터
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "genedge_api=info,genedge_core=info,tower_http=info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일은 없어도 됩니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("GENEDGE")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("auth.jwt_secret", std::env::var("JWT_SECRET").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("server.host", std::env::var("API_HOST").ok())?
            .set_override_option("server.port", std::env::var("API_PORT").ok())?;

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// `GENEDGE_CONFIG` 또는 기본 경로에서 로드합니다.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path =
            std::env::var("GENEDGE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load(path)
    }

    /// 기동 전 필수 값 검증.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.auth.signing_secret()?;

        if self.directory.failure_threshold == 0 {
            return Err(ConfigError::Invalid(
                "directory.failure_threshold must be at least 1".to_string(),
            ));
        }
        if self.database.url.is_none() && !self.directory.fallback_enabled {
            return Err(ConfigError::Invalid(
                "database.url is required when directory.fallback_enabled is false".to_string(),
            ));
        }
        Ok(())
    }

    /// 소켓 주소 문자열.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
