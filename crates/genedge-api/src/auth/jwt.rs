//! 세션 토큰(JWT) 처리.
//!
//! HS256 서명, 고정 수명(기본 15일)의 상태 없는 토큰을 발급/검증합니다.
//! 서버 측 폐기 목록은 없으며 유효성은 서명 + 만료 검사로만 판단합니다.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use genedge_core::{Principal, Role, SESSION_TOKEN_TTL_DAYS};

/// 세션 토큰 페이로드.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - 사용자 ID
    pub sub: String,
    /// 발급 시점의 이메일
    pub email: String,
    /// 발급 시점의 역할
    pub role: Role,
    /// Issued At (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// 현재 시각 기준으로 Claims 생성.
    pub fn new(
        principal_id: impl Into<String>,
        email: impl Into<String>,
        role: Role,
        ttl: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: principal_id.into(),
            email: email.into(),
            role,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }
}

/// JWT 처리 에러.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("토큰 인코딩 실패: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),
    #[error("토큰이 만료되었습니다")]
    TokenExpired,
    #[error("서명이 유효하지 않습니다")]
    InvalidSignature,
    #[error("잘못된 토큰 형식")]
    InvalidToken,
}

/// 세션 토큰 발급/검증기.
///
/// 프로세스 전역 서명 키를 보관하며 `AppState`를 통해 공유됩니다.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    /// 서명 키로 생성. 토큰 수명은 15일로 고정됩니다.
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(bytes),
            decoding_key: DecodingKey::from_secret(bytes),
            validation,
            ttl: Duration::days(SESSION_TOKEN_TTL_DAYS),
        }
    }

    /// 토큰 수명.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 세션 토큰 발급.
    ///
    /// `iat = now`, `exp = now + ttl`.
    pub fn issue(&self, principal_id: &str, email: &str, role: Role) -> Result<String, JwtError> {
        self.encode_claims(&Claims::new(principal_id, email, role, self.ttl))
    }

    /// Principal에 대한 세션 토큰 발급.
    pub fn issue_for(&self, principal: &Principal) -> Result<String, JwtError> {
        self.issue(&principal.id, &principal.email, principal.role)
    }

    /// 임의의 Claims 서명.
    pub fn encode_claims(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key).map_err(JwtError::from)
    }

    /// 토큰 디코딩 및 검증 (실패 사유 포함).
    pub fn decode(&self, token: &str) -> Result<Claims, JwtError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::InvalidToken,
            })
    }

    /// 토큰 검증.
    ///
    /// 형식 오류, 만료, 서명 불일치 등 어떤 실패든 `None`을 반환합니다.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        match self.decode(token) {
            Ok(claims) => Some(claims),
            Err(e) => {
                tracing::debug!(reason = %e, "Session token rejected");
                None
            }
        }
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl_days", &self.ttl.num_days())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";

    fn service() -> TokenService {
        TokenService::new(&SecretString::new(TEST_SECRET.into()))
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = service();
        let token = tokens.issue("user-1", "a@b.com", Role::Student).unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email, "a@b.com");
        assert_eq!(claims.role, Role::Student);
    }

    #[test]
    fn test_lifetime_is_fifteen_days() {
        let tokens = service();
        let token = tokens.issue("user-1", "a@b.com", Role::Admin).unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 15 * 24 * 60 * 60);
        assert!(claims.exp > Utc::now().timestamp());
        assert_eq!(tokens.ttl(), Duration::days(15));
    }

    #[test]
    fn test_expired_token_fails_even_with_valid_signature() {
        let tokens = service();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "user-1".to_string(),
            email: "a@b.com".to_string(),
            role: Role::Admin,
            iat: now - 16 * 24 * 60 * 60,
            exp: now - 1,
        };
        let token = tokens.encode_claims(&claims).unwrap();

        assert!(matches!(tokens.decode(&token), Err(JwtError::TokenExpired)));
        assert!(tokens.verify(&token).is_none());
    }

    #[test]
    fn test_wrong_secret() {
        let token = service().issue("user-1", "a@b.com", Role::Student).unwrap();
        let other = TokenService::new(
            &SecretString::new("wrong-secret-key-for-testing-minimum-32-chars".into()),
        );

        assert!(matches!(other.decode(&token), Err(JwtError::InvalidSignature)));
        assert!(other.verify(&token).is_none());
    }

    #[test]
    fn test_malformed_token() {
        let tokens = service();
        assert!(tokens.verify("").is_none());
        assert!(tokens.verify("invalid.token.here").is_none());
        assert!(tokens.verify("not-a-jwt").is_none());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let tokens = service();
        let token = tokens.issue("user-1", "a@b.com", Role::Student).unwrap();

        // 서명은 그대로 두고 페이로드만 교체
        let forged = tokens.issue("user-1", "a@b.com", Role::Admin).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);

        assert!(tokens.verify(&spliced).is_none());
    }

    #[test]
    fn test_debug_hides_keys() {
        let debug = format!("{:?}", service());
        assert!(!debug.contains(TEST_SECRET));
        assert!(debug.contains("ttl_days: 15"));
    }

    proptest::proptest! {
        #[test]
        fn prop_issue_verify_round_trip(
            id in "[a-z0-9-]{1,36}",
            email in "[a-z0-9]{1,12}@[a-z]{1,8}\\.com",
            admin in proptest::bool::ANY,
        ) {
            let tokens = service();
            let role = if admin { Role::Admin } else { Role::Student };
            let token = tokens.issue(&id, &email, role).unwrap();
            let claims = tokens.verify(&token).unwrap();

            proptest::prop_assert_eq!(claims.sub, id);
            proptest::prop_assert_eq!(claims.email, email);
            proptest::prop_assert_eq!(claims.role, role);
        }
    }
}
