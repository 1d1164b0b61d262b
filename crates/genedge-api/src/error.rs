//! 통합 API 에러 응답 타입.
//!
//! 모든 엔드포인트는 같은 JSON 형식으로 에러를 반환합니다.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use validator::ValidationErrors;

use genedge_core::{DirectoryError, IdentityError};

/// 통합 API 에러 응답.
///
/// ```json
/// {
///   "code": "INVALID_CREDENTIALS",
///   "message": "Invalid email or password",
///   "timestamp": 1738300800
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "VALIDATION_ERROR", "EMAIL_TAKEN")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 필드별 상세 정보 (검증 실패 시)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }

    /// 상세 정보 포함 에러 생성.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            details: Some(details),
            ..Self::new(code, message)
        }
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

// ==================== ApiError ====================

/// 핸들러/추출기 에러.
///
/// 도메인 에러를 상태 코드와 `ApiErrorResponse` 본문으로 변환합니다.
#[derive(Debug)]
pub struct ApiError(pub IdentityError);

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// HTTP 상태 코드.
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            IdentityError::Validation(_)
            | IdentityError::MalformedBody(_)
            | IdentityError::EmailTaken => StatusCode::BAD_REQUEST,
            IdentityError::InvalidCredentials | IdentityError::AuthenticationRequired => {
                StatusCode::UNAUTHORIZED
            }
            IdentityError::InsufficientRole { .. } => StatusCode::FORBIDDEN,
            IdentityError::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            IdentityError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 응답 본문.
    pub fn body(&self) -> ApiErrorResponse {
        let err = &self.0;
        match err {
            IdentityError::Validation(errors) => {
                ApiErrorResponse::with_details(err.code(), err.to_string(), field_errors(errors))
            }
            IdentityError::MalformedBody(reason) => ApiErrorResponse::with_details(
                err.code(),
                "Malformed request body",
                Value::from(reason.as_str()),
            ),
            _ => ApiErrorResponse::new(err.code(), err.to_string()),
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        Self(err)
    }
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        Self(err.into())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(err: ValidationErrors) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self.0 {
            IdentityError::Internal(detail) => {
                tracing::error!(detail = %detail, "Internal error while handling request");
            }
            IdentityError::StoreUnavailable => {
                tracing::error!("No user store available");
            }
            err if err.is_auth_failure() => {
                tracing::debug!(code = err.code(), "Request rejected");
            }
            _ => {}
        }

        (status, Json(self.body())).into_response()
    }
}

/// 검증 에러를 `{ field: [message, ...] }` 형태로 변환.
fn field_errors(errors: &ValidationErrors) -> Value {
    let mut fields = Map::new();
    for (field, errs) in errors.field_errors() {
        let messages: Vec<Value> = errs
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| Value::from(m.to_string()))
                    .unwrap_or_else(|| Value::from(e.code.to_string()))
            })
            .collect();
        fields.insert(field.to_string(), Value::Array(messages));
    }
    Value::Object(fields)
}
