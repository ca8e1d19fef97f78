//! 活动适配层
//!
//! 把应用层处理器包装成编排器可调用的重试单元。输入输出统一
//! 用 JSON 值编码（编排器的载荷格式），领域错误原样透传，由
//! 重试策略按可重试性分类处理。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crm_application::{
    ClientService, CreateUserCommand, CreateUserHandler, DeleteUserCommand, DeleteUserHandler,
    GetUserHandler, GetUserQuery, ListUsersHandler, ListUsersQuery, UpdateUserCommand,
    UpdateUserHandler,
};
use crm_domain::{Client, CrmError, CrmResult};

use crate::operations::Operation;
use crate::policy::ActivityOptions;

/// 操作处理器：直接执行路径的执行单元
///
/// 实现必须无状态且确定：编排器可能对同一输入重试任意多次，
/// 校验逻辑不得产生副作用。
#[async_trait]
pub trait OperationHandler: Send + Sync {
    async fn call(&self, input: Value) -> CrmResult<Value>;
}

/// 活动适配器
///
/// 在处理器外面加一层开始/成功/失败日志；不改变任何重试决策，
/// 错误原样向编排器传播。
pub struct ActivityAdapter {
    operation: Operation,
    inner: Arc<dyn OperationHandler>,
}

impl ActivityAdapter {
    pub fn new(operation: Operation, inner: Arc<dyn OperationHandler>) -> Self {
        Self { operation, inner }
    }
}

#[async_trait]
impl OperationHandler for ActivityAdapter {
    async fn call(&self, input: Value) -> CrmResult<Value> {
        debug!(operation = %self.operation, "活动开始执行");
        match self.inner.call(input).await {
            Ok(output) => {
                debug!(operation = %self.operation, "活动执行成功");
                Ok(output)
            }
            Err(err) => {
                warn!(operation = %self.operation, error = %err, "活动执行失败");
                Err(err)
            }
        }
    }
}

/// 操作注册表
///
/// 启动时把每个 [`Operation`] 映射到对应的处理器。编排器的
/// worker 通过 [`activity_for`](Self::activity_for) 取带日志的
/// 活动包装；调度器的回退路径通过
/// [`invoke_direct`](Self::invoke_direct) 直接调用处理器。
pub struct OperationRegistry {
    handlers: HashMap<Operation, Arc<dyn OperationHandler>>,
    options: ActivityOptions,
}

impl OperationRegistry {
    pub fn new(options: ActivityOptions) -> Self {
        Self {
            handlers: HashMap::new(),
            options,
        }
    }

    pub fn register(&mut self, operation: Operation, handler: Arc<dyn OperationHandler>) {
        self.handlers.insert(operation, handler);
    }

    /// 用应用层处理器装配全部操作
    pub fn for_services(
        client_service: Arc<ClientService>,
        create_user: Arc<CreateUserHandler>,
        update_user: Arc<UpdateUserHandler>,
        delete_user: Arc<DeleteUserHandler>,
        get_user: Arc<GetUserHandler>,
        list_users: Arc<ListUsersHandler>,
        options: ActivityOptions,
    ) -> Self {
        let mut registry = Self::new(options);
        registry.register(
            Operation::AddClient,
            Arc::new(AddClientOperation {
                service: client_service.clone(),
            }),
        );
        registry.register(
            Operation::GetClient,
            Arc::new(GetClientOperation {
                service: client_service,
            }),
        );
        registry.register(
            Operation::CreateUser,
            Arc::new(CreateUserOperation {
                handler: create_user,
            }),
        );
        registry.register(
            Operation::UpdateUser,
            Arc::new(UpdateUserOperation {
                handler: update_user,
            }),
        );
        registry.register(
            Operation::DeleteUser,
            Arc::new(DeleteUserOperation {
                handler: delete_user,
            }),
        );
        registry.register(
            Operation::GetUser,
            Arc::new(GetUserOperation { handler: get_user }),
        );
        registry.register(
            Operation::ListUsers,
            Arc::new(ListUsersOperation {
                handler: list_users,
            }),
        );
        registry
    }

    pub fn options(&self) -> &ActivityOptions {
        &self.options
    }

    /// 取操作对应的活动（带日志包装），供编排器 worker 执行
    pub fn activity_for(&self, operation: Operation) -> Option<Arc<dyn OperationHandler>> {
        self.handlers
            .get(&operation)
            .map(|handler| {
                Arc::new(ActivityAdapter::new(operation, handler.clone()))
                    as Arc<dyn OperationHandler>
            })
    }

    /// 直接调用处理器（回退路径）
    pub async fn invoke_direct(&self, operation: Operation, input: Value) -> CrmResult<Value> {
        let handler = self
            .handlers
            .get(&operation)
            .ok_or_else(|| CrmError::Internal(format!("操作未注册: {operation}")))?;
        handler.call(input).await
    }
}

struct AddClientOperation {
    service: Arc<ClientService>,
}

#[async_trait]
impl OperationHandler for AddClientOperation {
    async fn call(&self, input: Value) -> CrmResult<Value> {
        let client: Client = serde_json::from_value(input)?;
        self.service.add_client(&client).await?;
        // 返回保存后的完整实体
        let stored = self.service.get_client(client.id).await?;
        Ok(serde_json::to_value(stored)?)
    }
}

struct GetClientOperation {
    service: Arc<ClientService>,
}

#[async_trait]
impl OperationHandler for GetClientOperation {
    async fn call(&self, input: Value) -> CrmResult<Value> {
        let id: Uuid = serde_json::from_value(input)?;
        let client = self.service.get_client(id).await?;
        Ok(serde_json::to_value(client)?)
    }
}

struct CreateUserOperation {
    handler: Arc<CreateUserHandler>,
}

#[async_trait]
impl OperationHandler for CreateUserOperation {
    async fn call(&self, input: Value) -> CrmResult<Value> {
        let cmd: CreateUserCommand = serde_json::from_value(input)?;
        let user = self.handler.handle(cmd).await?;
        Ok(serde_json::to_value(user)?)
    }
}

struct UpdateUserOperation {
    handler: Arc<UpdateUserHandler>,
}

#[async_trait]
impl OperationHandler for UpdateUserOperation {
    async fn call(&self, input: Value) -> CrmResult<Value> {
        let cmd: UpdateUserCommand = serde_json::from_value(input)?;
        let user = self.handler.handle(cmd).await?;
        Ok(serde_json::to_value(user)?)
    }
}

struct DeleteUserOperation {
    handler: Arc<DeleteUserHandler>,
}

#[async_trait]
impl OperationHandler for DeleteUserOperation {
    async fn call(&self, input: Value) -> CrmResult<Value> {
        let cmd: DeleteUserCommand = serde_json::from_value(input)?;
        self.handler.handle(cmd).await?;
        Ok(Value::Null)
    }
}

struct GetUserOperation {
    handler: Arc<GetUserHandler>,
}

#[async_trait]
impl OperationHandler for GetUserOperation {
    async fn call(&self, input: Value) -> CrmResult<Value> {
        let query: GetUserQuery = serde_json::from_value(input)?;
        let user = self.handler.handle(query).await?;
        Ok(serde_json::to_value(user)?)
    }
}

struct ListUsersOperation {
    handler: Arc<ListUsersHandler>,
}

#[async_trait]
impl OperationHandler for ListUsersOperation {
    async fn call(&self, _input: Value) -> CrmResult<Value> {
        let users = self.handler.handle(ListUsersQuery).await?;
        Ok(serde_json::to_value(users)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::registry_with_memory_repos;
    use crm_domain::User;

    #[tokio::test]
    async fn test_registry_covers_all_operations() {
        let (registry, _, _) = registry_with_memory_repos();
        for op in Operation::all() {
            assert!(registry.activity_for(op).is_some(), "missing {op}");
        }
    }

    #[tokio::test]
    async fn test_activity_passes_domain_error_through_unchanged() {
        let (registry, _, _) = registry_with_memory_repos();
        let cmd = serde_json::json!({
            "email": "a@x.com", "firstName": "A", "lastName": "B", "role": "user"
        });

        let activity = registry.activity_for(Operation::CreateUser).unwrap();
        activity.call(cmd.clone()).await.unwrap();

        let err = activity.call(cmd).await.unwrap_err();
        assert!(matches!(err, CrmError::EmailAlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_create_user_activity_round_trips_entity() {
        let (registry, _, _) = registry_with_memory_repos();
        let cmd = serde_json::json!({
            "email": "a@x.com", "firstName": "A", "lastName": "B", "role": "user"
        });

        let output = registry
            .invoke_direct(Operation::CreateUser, cmd)
            .await
            .unwrap();
        let user: User = serde_json::from_value(output).unwrap();
        assert!(!user.id.is_nil());
        assert!(user.active);
    }

    #[tokio::test]
    async fn test_malformed_input_is_a_serialization_error() {
        let (registry, _, _) = registry_with_memory_repos();
        let err = registry
            .invoke_direct(Operation::GetClient, serde_json::json!({"not": "a uuid"}))
            .await
            .unwrap_err();
        assert!(matches!(err, CrmError::Serialization(_)));
    }
}
