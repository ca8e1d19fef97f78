use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crm_durable::DurableDispatcher;

use crate::handlers::{
    clients::{add_client, get_client},
    health::health_check,
    users::{create_user, delete_user, get_user, list_users, update_user},
};

/// API应用状态
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<DurableDispatcher>,
}

/// 创建API路由
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        // 健康检查
        .route("/api/health", get(health_check))
        // 客户管理API（调用方身份来自 X-User-Id 请求头）
        .route("/api/clients", post(add_client).get(get_client))
        // 用户管理API
        .route("/api/users", post(create_user).get(list_users))
        .route(
            "/api/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .with_state(state)
}
