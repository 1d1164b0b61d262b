//! 세션 쿠키 생성/삭제.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

/// 세션 토큰 쿠키 이름.
pub const SESSION_COOKIE: &str = "token";

/// 세션 쿠키 생성.
///
/// `HttpOnly`, `SameSite=Lax`, `Path=/`, 토큰 수명과 같은 `Max-Age`.
/// `secure`가 true이면 `Secure` 속성을 추가합니다.
pub fn session_cookie(token: String, max_age: chrono::Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::seconds(max_age.num_seconds()))
        .build()
}

/// 세션 쿠키 만료용 쿠키 (`Max-Age=0`).
pub fn expired_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}

/// 요청 쿠키에서 세션 토큰 추출.
pub fn session_token(jar: &CookieJar) -> Option<&str> {
    jar.get(SESSION_COOKIE)
        .map(|c| c.value())
        .filter(|v| !v.is_empty())
}
