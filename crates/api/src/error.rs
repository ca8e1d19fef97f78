use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use crm_domain::CrmError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("业务错误: {0}")]
    Domain(#[from] CrmError),

    #[error("调用方身份缺失: {0}")]
    MissingCaller(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, error_type, suggestions) = match &self {
            ApiError::Domain(CrmError::Validation { field, message }) => (
                StatusCode::BAD_REQUEST,
                format!("字段 {field} 校验失败: {message}"),
                "VALIDATION_ERROR".to_string(),
                vec!["请检查请求体中的必填字段".to_string()],
            ),
            ApiError::Domain(CrmError::UserNotFound { id }) => (
                StatusCode::NOT_FOUND,
                format!("用户 {id} 不存在"),
                "USER_NOT_FOUND".to_string(),
                vec![
                    "请检查用户ID是否正确".to_string(),
                    "使用 GET /api/users 查看所有用户".to_string(),
                ],
            ),
            ApiError::Domain(CrmError::EmailAlreadyExists { email }) => (
                StatusCode::CONFLICT,
                format!("邮箱 {email} 已被占用"),
                "EMAIL_ALREADY_EXISTS".to_string(),
                vec!["同一邮箱只能注册一个用户".to_string()],
            ),
            ApiError::Domain(CrmError::Serialization(detail)) => (
                StatusCode::BAD_REQUEST,
                "请求数据格式错误".to_string(),
                "SERIALIZATION_ERROR".to_string(),
                vec![
                    "请检查JSON格式是否正确".to_string(),
                    format!("详细错误: {detail}"),
                ],
            ),
            ApiError::MissingCaller(detail) => (
                StatusCode::UNAUTHORIZED,
                format!("无法识别调用方: {detail}"),
                "MISSING_CALLER".to_string(),
                vec!["请在请求头中携带 X-User-Id".to_string()],
            ),
            ApiError::Domain(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "系统内部错误".to_string(),
                "INTERNAL_ERROR".to_string(),
                vec![
                    "系统遇到内部错误，请稍后重试".to_string(),
                    format!("错误详情: {err}"),
                ],
            ),
        };

        let body = Json(json!({
            "error": {
                "message": error_message,
                "type": error_type,
                "code": status.as_u16(),
                "suggestions": suggestions,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
