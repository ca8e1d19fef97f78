//! 用户命令/查询处理器
//!
//! 每个命令对应一个处理器：校验 → 存在性/唯一性检查 → 仓储操作。
//! 这些处理器同时是非持久化执行路径（直接调用）的执行单元。

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crm_domain::{CrmError, CrmResult, User, UserRepository};

/// 创建用户命令
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserCommand {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

/// 更新用户命令
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserCommand {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

/// 删除用户命令
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserCommand {
    pub id: Uuid,
}

/// 按标识符查询用户
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetUserQuery {
    pub id: Uuid,
}

/// 用户列表查询
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListUsersQuery;

pub struct CreateUserHandler {
    user_repo: Arc<dyn UserRepository>,
}

impl CreateUserHandler {
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self { user_repo }
    }

    /// 创建用户
    ///
    /// 重复提交同一邮箱不是幂等操作：第二次返回 `EmailAlreadyExists`，
    /// 属终态冲突，不参与重试。
    pub async fn handle(&self, cmd: CreateUserCommand) -> CrmResult<User> {
        require(&cmd.email, "email", "email is required")?;
        require(&cmd.first_name, "firstName", "first name is required")?;
        require(&cmd.last_name, "lastName", "last name is required")?;
        require(&cmd.role, "role", "role is required")?;

        if self.user_repo.get_by_email(&cmd.email).await?.is_some() {
            return Err(CrmError::email_already_exists(cmd.email));
        }

        let user = User::new(cmd.email, cmd.first_name, cmd.last_name, cmd.role);
        self.user_repo.create(&user).await?;
        debug!(user_id = %user.id, "用户已创建");
        Ok(user)
    }
}

pub struct UpdateUserHandler {
    user_repo: Arc<dyn UserRepository>,
}

impl UpdateUserHandler {
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self { user_repo }
    }

    pub async fn handle(&self, cmd: UpdateUserCommand) -> CrmResult<User> {
        if cmd.id.is_nil() {
            return Err(CrmError::validation("id", "id is required"));
        }
        require(&cmd.email, "email", "email is required")?;
        require(&cmd.first_name, "firstName", "first name is required")?;
        require(&cmd.last_name, "lastName", "last name is required")?;
        require(&cmd.role, "role", "role is required")?;

        let mut user = self
            .user_repo
            .get_by_id(cmd.id)
            .await?
            .ok_or(CrmError::UserNotFound { id: cmd.id })?;

        // 换邮箱时需确认新邮箱未被其他标识符占用
        if user.email != cmd.email {
            if let Some(existing) = self.user_repo.get_by_email(&cmd.email).await? {
                if existing.id != cmd.id {
                    return Err(CrmError::email_already_exists(cmd.email));
                }
            }
        }

        user.apply_update(cmd.email, cmd.first_name, cmd.last_name, cmd.role);
        self.user_repo.update(&user).await?;
        Ok(user)
    }
}

pub struct DeleteUserHandler {
    user_repo: Arc<dyn UserRepository>,
}

impl DeleteUserHandler {
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self { user_repo }
    }

    pub async fn handle(&self, cmd: DeleteUserCommand) -> CrmResult<()> {
        if cmd.id.is_nil() {
            return Err(CrmError::validation("id", "id is required"));
        }
        if self.user_repo.get_by_id(cmd.id).await?.is_none() {
            return Err(CrmError::UserNotFound { id: cmd.id });
        }
        self.user_repo.delete(cmd.id).await
    }
}

pub struct GetUserHandler {
    user_repo: Arc<dyn UserRepository>,
}

impl GetUserHandler {
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self { user_repo }
    }

    /// 与客户查询不同，缺失的用户标识符是显式错误
    pub async fn handle(&self, query: GetUserQuery) -> CrmResult<User> {
        if query.id.is_nil() {
            return Err(CrmError::validation("id", "id is required"));
        }
        self.user_repo
            .get_by_id(query.id)
            .await?
            .ok_or(CrmError::UserNotFound { id: query.id })
    }
}

pub struct ListUsersHandler {
    user_repo: Arc<dyn UserRepository>,
}

impl ListUsersHandler {
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self { user_repo }
    }

    pub async fn handle(&self, _query: ListUsersQuery) -> CrmResult<Vec<User>> {
        self.user_repo.list().await
    }
}

fn require(value: &str, field: &str, message: &str) -> CrmResult<()> {
    if value.trim().is_empty() {
        return Err(CrmError::validation(field, message));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crm_infrastructure::database::memory::MemoryUserRepository;

    fn repo() -> Arc<dyn UserRepository> {
        Arc::new(MemoryUserRepository::new())
    }

    fn create_cmd(email: &str) -> CreateUserCommand {
        CreateUserCommand {
            email: email.to_string(),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            role: "user".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_user_assigns_id_and_defaults() {
        let repo = repo();
        let handler = CreateUserHandler::new(repo);

        let user = handler.handle(create_cmd("a@x.com")).await.unwrap();
        assert!(!user.id.is_nil());
        assert!(user.active);
        assert_eq!(user.email, "a@x.com");
    }

    #[tokio::test]
    async fn test_create_duplicate_email_is_terminal_conflict() {
        let repo = repo();
        let handler = CreateUserHandler::new(repo);

        handler.handle(create_cmd("a@x.com")).await.unwrap();
        let err = handler.handle(create_cmd("a@x.com")).await.unwrap_err();
        assert!(matches!(err, CrmError::EmailAlreadyExists { .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_validation_happens_before_any_side_effect() {
        let repo = repo();
        let handler = CreateUserHandler::new(repo.clone());

        let mut cmd = create_cmd("a@x.com");
        cmd.role = "  ".to_string();
        let err = handler.handle(cmd).await.unwrap_err();
        assert!(matches!(err, CrmError::Validation { ref field, .. } if field == "role"));
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_checks_email_against_other_ids() {
        let repo = repo();
        let create = CreateUserHandler::new(repo.clone());
        let update = UpdateUserHandler::new(repo.clone());

        let first = create.handle(create_cmd("a@x.com")).await.unwrap();
        let second = create.handle(create_cmd("b@x.com")).await.unwrap();

        // 改成其他用户的邮箱 → 冲突
        let err = update
            .handle(UpdateUserCommand {
                id: second.id,
                email: "a@x.com".to_string(),
                first_name: "C".to_string(),
                last_name: "D".to_string(),
                role: "admin".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CrmError::EmailAlreadyExists { .. }));

        // 保留自己的邮箱 → 允许
        let updated = update
            .handle(UpdateUserCommand {
                id: first.id,
                email: "a@x.com".to_string(),
                first_name: "C".to_string(),
                last_name: "D".to_string(),
                role: "admin".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(updated.role, "admin");
        assert!(updated.updated_at >= updated.created_at);
    }

    #[tokio::test]
    async fn test_delete_then_get_yields_not_found() {
        let repo = repo();
        let create = CreateUserHandler::new(repo.clone());
        let delete = DeleteUserHandler::new(repo.clone());
        let get = GetUserHandler::new(repo.clone());

        let user = create.handle(create_cmd("a@x.com")).await.unwrap();
        delete.handle(DeleteUserCommand { id: user.id }).await.unwrap();

        let err = get.handle(GetUserQuery { id: user.id }).await.unwrap_err();
        assert_eq!(err, CrmError::UserNotFound { id: user.id });

        let err = delete
            .handle(DeleteUserCommand { id: user.id })
            .await
            .unwrap_err();
        assert_eq!(err, CrmError::UserNotFound { id: user.id });
    }
}
