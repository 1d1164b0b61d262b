//! 인증 흐름 통합 테스트.
//!
//! 메모리 디렉터리만 사용하는 상태로 전체 API 라우터를 구성해
//! 가입, 로그인, 현재 사용자 조회, 로그아웃, 관리자 권한을 확인합니다.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use genedge_api::auth::Claims;
use genedge_api::routes::create_api_router;
use genedge_api::state::{create_test_state, AppState};
use genedge_core::{NewPrincipal, Role};

// ==================== 헬퍼 ====================

fn app(state: Arc<AppState>) -> Router {
    create_api_router().with_state(state)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_with_cookie(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// 응답의 `Set-Cookie` 헤더 원문.
fn set_cookie(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("Set-Cookie header")
        .to_str()
        .unwrap()
        .to_string()
}

/// `Set-Cookie` 원문에서 요청용 `token=...` 쌍만 추출.
fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap().trim().to_string()
}

async fn signup(app: &Router, name: &str, email: &str, password: &str) -> Response<Body> {
    app.clone()
        .oneshot(post_json(
            "/api/auth/signup",
            json!({ "name": name, "email": email, "password": password }),
        ))
        .await
        .unwrap()
}

async fn signin(app: &Router, email: &str, password: &str) -> Response<Body> {
    app.clone()
        .oneshot(post_json(
            "/api/auth/signin",
            json!({ "email": email, "password": password }),
        ))
        .await
        .unwrap()
}

// ==================== 가입/로그인 ====================

#[tokio::test]
async fn signup_then_signin_issues_session_cookie() {
    let app = app(Arc::new(create_test_state()));

    let response = signup(&app, "Asha", "a@b.com", "secret1").await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = set_cookie(&response);
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Max-Age=1296000"));

    let body = json_body(response).await;
    assert_eq!(body["message"], "User created successfully");
    assert_eq!(body["user"]["email"], "a@b.com");
    assert_eq!(body["user"]["role"], "STUDENT");
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("passwordHash").is_none());

    let response = signin(&app, "a@b.com", "secret1").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response).starts_with("token="));

    let body = json_body(response).await;
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["user"]["name"], "Asha");
    assert_eq!(body["user"]["role"], "STUDENT");
}

#[tokio::test]
async fn signin_normalizes_email() {
    let app = app(Arc::new(create_test_state()));
    signup(&app, "Asha", "Asha@Example.com", "secret1").await;

    let response = signin(&app, "  ASHA@example.COM ", "secret1").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn wrong_password_is_rejected_with_generic_message() {
    let app = app(Arc::new(create_test_state()));
    signup(&app, "Asha", "a@b.com", "secret1").await;

    let response = signin(&app, "a@b.com", "secret2").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    let wrong_password = json_body(response).await;

    let response = signin(&app, "nobody@b.com", "secret1").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let unknown_email = json_body(response).await;

    assert_eq!(wrong_password["message"], "Invalid email or password");
    assert_eq!(wrong_password["message"], unknown_email["message"]);
    assert_eq!(wrong_password["code"], unknown_email["code"]);
}

#[tokio::test]
async fn duplicate_signup_is_bad_request() {
    let app = app(Arc::new(create_test_state()));
    signup(&app, "Asha", "a@b.com", "secret1").await;

    let response = signup(&app, "Other", "A@B.com", "secret2").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["code"], "EMAIL_TAKEN");
    assert_eq!(body["message"], "User with this email already exists");
}

#[tokio::test]
async fn signup_validation_errors() {
    let app = app(Arc::new(create_test_state()));

    let response = signup(&app, "A", "not-an-email", "12345").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["details"].get("name").is_some());
    assert!(body["details"].get("email").is_some());
    assert_eq!(
        body["details"]["password"][0],
        "Password must be at least 6 characters"
    );
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let app = app(Arc::new(create_test_state()));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/signin")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"email\":"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], "INVALID_BODY");
}

// ==================== 현재 사용자 ====================

#[tokio::test]
async fn me_returns_current_user() {
    let app = app(Arc::new(create_test_state()));
    let response = signup(&app, "Asha", "a@b.com", "secret1").await;
    let cookie = cookie_pair(&set_cookie(&response));

    let response = app
        .clone()
        .oneshot(get_with_cookie("/api/auth/me", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["email"], "a@b.com");
    assert_eq!(body["role"], "STUDENT");
}

#[tokio::test]
async fn me_without_cookie_is_unauthorized() {
    let app = app(Arc::new(create_test_state()));

    let response = app
        .oneshot(get_with_cookie("/api/auth/me", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["code"], "AUTHENTICATION_REQUIRED");
}

#[tokio::test]
async fn me_with_expired_token_is_unauthorized() {
    let state = Arc::new(create_test_state());
    let app = app(state.clone());
    let response = signup(&app, "Asha", "a@b.com", "secret1").await;
    let user = json_body(response).await["user"].clone();

    let now = chrono::Utc::now().timestamp();
    let expired = state
        .tokens
        .encode_claims(&Claims {
            sub: user["id"].as_str().unwrap().to_string(),
            email: "a@b.com".to_string(),
            role: Role::Student,
            iat: now - 16 * 24 * 60 * 60,
            exp: now - 60,
        })
        .unwrap();

    let response = app
        .oneshot(get_with_cookie(
            "/api/auth/me",
            Some(&format!("token={expired}")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_with_deleted_principal_is_unauthorized() {
    let state = Arc::new(create_test_state());
    let app = app(state.clone());
    let response = signup(&app, "Asha", "a@b.com", "secret1").await;
    let cookie = cookie_pair(&set_cookie(&response));

    assert!(state.directory.fallback().remove("a@b.com").await);

    let response = app
        .oneshot(get_with_cookie("/api/auth/me", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_signed_with_other_secret_is_unauthorized() {
    let state = Arc::new(create_test_state());
    let app = app(state.clone());
    let response = signup(&app, "Asha", "a@b.com", "secret1").await;
    let user = json_body(response).await["user"].clone();

    let other = genedge_api::auth::TokenService::new(
        &secrecy::SecretString::new("another-secret-key-that-is-long-enough-32".into()),
    );
    let forged = other
        .issue(user["id"].as_str().unwrap(), "a@b.com", Role::Admin)
        .unwrap();

    let response = app
        .oneshot(get_with_cookie(
            "/api/auth/me",
            Some(&format!("token={forged}")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ==================== 로그아웃 ====================

#[tokio::test]
async fn logout_clears_cookie() {
    let app = app(Arc::new(create_test_state()));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = set_cookie(&response);
    assert!(cookie.starts_with("token=;") || cookie.starts_with("token=\"\""));
    assert!(cookie.contains("Max-Age=0"));
    assert_eq!(
        json_body(response).await["message"],
        "Logged out successfully"
    );
}

// ==================== 관리자 ====================

#[tokio::test]
async fn admin_users_requires_admin_role() {
    let state = Arc::new(create_test_state());
    let hash = genedge_api::auth::hash_password("admin123").unwrap();
    let admin = NewPrincipal::student("Admin User", "admin@genedge.ac", hash).with_role(Role::Admin);
    state.directory.fallback().seed_admin(admin).await;
    let app = app(state);

    // 익명
    let response = app
        .clone()
        .oneshot(get_with_cookie("/api/admin/users", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // 수강생
    let response = signup(&app, "Asha", "a@b.com", "secret1").await;
    let student_cookie = cookie_pair(&set_cookie(&response));
    let response = app
        .clone()
        .oneshot(get_with_cookie("/api/admin/users", Some(&student_cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["code"], "INSUFFICIENT_ROLE");

    // 관리자
    let response = signin(&app, "admin@genedge.ac", "admin123").await;
    assert_eq!(response.status(), StatusCode::OK);
    let admin_cookie = cookie_pair(&set_cookie(&response));
    let response = app
        .oneshot(get_with_cookie("/api/admin/users", Some(&admin_cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["users"].as_array().unwrap().len(), 2);
}
