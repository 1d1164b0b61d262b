//! 비밀번호 해싱 유틸리티.
//!
//! Argon2id 기반 비밀번호 해싱 및 검증.

use std::sync::OnceLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// 비밀번호 처리 에러.
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("비밀번호 해싱 실패")]
    HashingFailed,
}

/// 비밀번호 해싱.
///
/// Argon2id 기본 파라미터(m=19456, t=2, p=1)와 무작위 솔트를 사용합니다.
///
/// # Returns
///
/// PHC 형식의 해시 문자열 (솔트 포함)
///
/// # Example
///
/// ```rust,ignore
/// let hash = hash_password("secret1").unwrap();
/// // "$argon2id$v=19$m=19456,t=2,p=1$..."
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| PasswordError::HashingFailed)?;

    Ok(hash.to_string())
}

/// 비밀번호 검증.
///
/// 해시 형식이 잘못된 경우에도 에러 대신 `false`를 반환합니다.
/// 해시 비교는 argon2 내부에서 상수 시간으로 수행됩니다.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        tracing::debug!("Stored password hash is not a valid PHC string");
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

static DUMMY_HASH: OnceLock<String> = OnceLock::new();

/// 더미 해시를 미리 생성합니다. 서버 기동 시 한 번 호출합니다.
pub fn prepare_dummy_hash() -> Result<(), PasswordError> {
    if DUMMY_HASH.get().is_none() {
        let hash = hash_password("genedge-dummy-password")?;
        let _ = DUMMY_HASH.set(hash);
    }
    Ok(())
}

/// 가입되지 않은 이메일로 로그인할 때 더미 해시 검증을 수행합니다.
pub fn burn_verification(password: &str) {
    if DUMMY_HASH.get().is_none() {
        tracing::warn!("Dummy hash not prepared at startup, generating on demand");
        if let Err(e) = prepare_dummy_hash() {
            tracing::error!(error = %e, "Failed to prepare dummy hash");
            return;
        }
    }
    if let Some(hash) = DUMMY_HASH.get() {
        let _ = verify_password(password, hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("secret1").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("secret1", &hash));
        assert!(!verify_password("secret2", &hash));
        assert!(!verify_password("Secret1", &hash));
        assert!(!verify_password("", &hash));
    }

    #[test]
    fn test_same_password_different_salts() {
        let hash1 = hash_password("secret1").unwrap();
        let hash2 = hash_password("secret1").unwrap();

        assert_ne!(hash1, hash2);
        assert!(verify_password("secret1", &hash1));
        assert!(verify_password("secret1", &hash2));
    }

    #[test]
    fn test_malformed_hash_returns_false() {
        assert!(!verify_password("secret1", "not-a-valid-hash"));
        assert!(!verify_password("secret1", ""));
        // bcrypt 형식은 지원하지 않음
        assert!(!verify_password(
            "admin123",
            "$2a$12$R9h/cIPz0gi.URNNX3kh2OPST9/PgBkqquzi.Ss7KIUgO2t0jWMUW"
        ));
    }

    #[test]
    fn test_unicode_password() {
        let password = "पासवर्ड-१२३";
        let hash = hash_password(password).unwrap();
        assert!(verify_password(password, &hash));
    }

    #[test]
    fn test_dummy_hash_prepared_once() {
        prepare_dummy_hash().unwrap();
        let first = DUMMY_HASH.get().cloned().unwrap();
        assert!(first.starts_with("$argon2id$"));

        prepare_dummy_hash().unwrap();
        assert_eq!(DUMMY_HASH.get(), Some(&first));

        burn_verification("anything");
        assert_eq!(DUMMY_HASH.get(), Some(&first));
    }

    proptest::proptest! {
        #![proptest_config(proptest::prelude::ProptestConfig::with_cases(8))]

        #[test]
        fn prop_mutated_password_fails(password in "[a-zA-Z0-9]{6,16}", suffix in "[a-z]{1,3}") {
            let hash = hash_password(&password).unwrap();
            proptest::prop_assert!(verify_password(&password, &hash));

            let mutated = format!("{password}{suffix}");
            proptest::prop_assert!(!verify_password(&mutated, &hash));
        }
    }
}
