//! 领域仓储抽象
//!
//! 定义数据访问的抽象接口，具体实现（PostgreSQL / 内存）在
//! 基础设施层按配置选择，处理器只依赖这里的抽象。

use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::{Client, User};
use crate::errors::CrmResult;

/// 客户仓储抽象
///
/// `save` 是幂等覆盖写：同一标识符重复写入只会覆盖属性并刷新
/// 更新时间，永远不会产生重复键错误。
#[async_trait]
pub trait ClientRepository: Send + Sync {
    async fn save(&self, client: &Client) -> CrmResult<()>;
    async fn find_by_id(&self, id: Uuid) -> CrmResult<Option<Client>>;
}

/// 用户仓储抽象
///
/// 写入时同时保证主键唯一和邮箱唯一；`list` 按创建时间倒序返回。
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> CrmResult<()>;
    async fn update(&self, user: &User) -> CrmResult<()>;
    async fn delete(&self, id: Uuid) -> CrmResult<()>;
    async fn get_by_id(&self, id: Uuid) -> CrmResult<Option<User>>;
    async fn get_by_email(&self, email: &str) -> CrmResult<Option<User>>;
    async fn list(&self) -> CrmResult<Vec<User>>;
}
