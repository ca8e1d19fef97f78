//! # CRM API
//!
//! 基于 Axum 的 HTTP 边界层：把请求体解码成命令对象，交给双路径
//! 调度器执行，并把领域错误映射成 HTTP 状态码。本层不包含任何
//! 领域逻辑。
//!
//! ## API 端点
//!
//! ### 客户管理（调用方身份来自 X-User-Id 请求头）
//! - `POST /api/clients` - 提交客户资料（幂等覆盖写）
//! - `GET /api/clients` - 查询自己的客户资料
//!
//! ### 用户管理
//! - `POST /api/users` - 创建用户
//! - `GET /api/users` - 获取用户列表
//! - `GET /api/users/{id}` - 获取用户详情
//! - `PUT /api/users/{id}` - 更新用户
//! - `DELETE /api/users/{id}` - 删除用户
//!
//! ### 系统
//! - `GET /api/health` - 健康检查
//!
//! ## 错误映射
//!
//! - 校验失败 → 400
//! - 用户不存在 → 404
//! - 邮箱已占用 → 409
//! - 其余领域错误 → 500

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;

use axum::Router;
use tower::ServiceBuilder;

use middleware::{cors_layer, request_logging, trace_layer};
pub use routes::AppState;
use routes::create_routes;

/// 创建完整的API应用
pub fn create_app(state: AppState) -> Router {
    create_routes(state).layer(
        ServiceBuilder::new()
            .layer(trace_layer())
            .layer(cors_layer())
            .layer(axum::middleware::from_fn(request_logging)),
    )
}
