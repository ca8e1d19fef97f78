use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crm_application::{
    CreateUserCommand, DeleteUserCommand, GetUserQuery, UpdateUserCommand,
};
use crm_domain::User;
use crm_durable::Operation;

use crate::{
    error::ApiResult,
    response::{created, no_content, success},
    routes::AppState,
};

/// 用户更新请求（标识符取自路径）
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

/// 创建用户
pub async fn create_user(
    State(state): State<AppState>,
    Json(command): Json<CreateUserCommand>,
) -> ApiResult<impl axum::response::IntoResponse> {
    // 邮箱是创建操作的自然幂等键
    let key = command.email.clone();
    let user: User = state
        .dispatcher
        .execute(Operation::CreateUser, &key, &command)
        .await?;
    Ok(created(user))
}

/// 获取用户列表
pub async fn list_users(
    State(state): State<AppState>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let users: Vec<User> = state
        .dispatcher
        .query(Operation::ListUsers, "all", &Value::Null)
        .await?;
    Ok(success(users))
}

/// 获取单个用户
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let user: User = state
        .dispatcher
        .query(Operation::GetUser, &id.to_string(), &GetUserQuery { id })
        .await?;
    Ok(success(user))
}

/// 更新用户
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let command = UpdateUserCommand {
        id,
        email: request.email,
        first_name: request.first_name,
        last_name: request.last_name,
        role: request.role,
    };
    let user: User = state
        .dispatcher
        .execute(Operation::UpdateUser, &id.to_string(), &command)
        .await?;
    Ok(success(user))
}

/// 删除用户
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl axum::response::IntoResponse> {
    state
        .dispatcher
        .execute::<_, ()>(Operation::DeleteUser, &id.to_string(), &DeleteUserCommand { id })
        .await?;
    Ok(no_content())
}
