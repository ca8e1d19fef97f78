use axum::{extract::State, http::HeaderMap, Json};
use serde::Deserialize;
use uuid::Uuid;

use crm_domain::Client;
use crm_durable::Operation;

use crate::{
    error::{ApiError, ApiResult},
    response::{created, success},
    routes::AppState,
};

/// 客户资料提交请求
///
/// 客户标识符不在请求体里，始终取自认证后的调用方身份。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddClientRequest {
    pub first_name: String,
    pub last_name: String,
    pub contact_email: String,
    pub phone_number: String,
}

/// 从 X-User-Id 请求头取调用方标识（令牌校验由网关完成）
fn caller_id(headers: &HeaderMap) -> Result<Uuid, ApiError> {
    let value = headers
        .get("X-User-Id")
        .ok_or_else(|| ApiError::MissingCaller("缺少 X-User-Id 请求头".to_string()))?;
    let raw = value
        .to_str()
        .map_err(|_| ApiError::MissingCaller("X-User-Id 不是合法的字符串".to_string()))?;
    Uuid::parse_str(raw).map_err(|_| ApiError::MissingCaller("X-User-Id 不是合法的UUID".to_string()))
}

/// 提交客户资料（幂等覆盖写）
pub async fn add_client(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AddClientRequest>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let id = caller_id(&headers)?;
    let client = Client::new(
        id,
        request.first_name,
        request.last_name,
        request.contact_email,
        request.phone_number,
    );

    let stored: Client = state
        .dispatcher
        .execute(Operation::AddClient, &id.to_string(), &client)
        .await?;
    Ok(created(stored))
}

/// 查询调用方自己的客户资料
pub async fn get_client(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl axum::response::IntoResponse> {
    let id = caller_id(&headers)?;
    let client: Client = state
        .dispatcher
        .query(Operation::GetClient, &id.to_string(), &id)
        .await?;
    Ok(success(client))
}
