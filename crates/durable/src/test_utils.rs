//! 测试辅助：可编程的操作处理器和预装配的注册表

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crm_application::{
    ClientService, CreateUserHandler, DeleteUserHandler, GetUserHandler, ListUsersHandler,
    UpdateUserHandler,
};
use crm_domain::{CrmError, CrmResult};
use crm_infrastructure::database::memory::{MemoryClientRepository, MemoryUserRepository};

use crate::activity::{OperationHandler, OperationRegistry};
use crate::policy::ActivityOptions;

enum FailureMode {
    /// 前 n 次返回可重试的存储错误，之后成功
    Retryable(u32),
    /// 每次都返回可重试的存储错误
    AlwaysRetryable,
    /// 返回终态领域冲突
    Domain,
}

/// 按预设失败模式响应的处理器
pub struct FlakyHandler {
    mode: FailureMode,
    calls: AtomicU32,
}

impl FlakyHandler {
    pub fn failing_times(n: u32) -> Self {
        Self {
            mode: FailureMode::Retryable(n),
            calls: AtomicU32::new(0),
        }
    }

    pub fn always_failing() -> Self {
        Self {
            mode: FailureMode::AlwaysRetryable,
            calls: AtomicU32::new(0),
        }
    }

    pub fn domain_failing() -> Self {
        Self {
            mode: FailureMode::Domain,
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OperationHandler for FlakyHandler {
    async fn call(&self, _input: Value) -> CrmResult<Value> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        match self.mode {
            FailureMode::Retryable(n) if attempt <= n => {
                Err(CrmError::database_error("simulated storage failure"))
            }
            FailureMode::Retryable(_) => Ok(Value::String(format!("attempt-{attempt}"))),
            FailureMode::AlwaysRetryable => {
                Err(CrmError::database_error("simulated storage failure"))
            }
            FailureMode::Domain => Err(CrmError::email_already_exists("dup@x.com")),
        }
    }
}

/// 固定延迟后成功的处理器
pub struct SlowHandler {
    delay: Duration,
    calls: AtomicU32,
}

impl SlowHandler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OperationHandler for SlowHandler {
    async fn call(&self, _input: Value) -> CrmResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(Value::String("slow-done".to_string()))
    }
}

/// 内存仓储上的完整操作注册表
pub fn registry_with_memory_repos() -> (
    Arc<OperationRegistry>,
    Arc<MemoryClientRepository>,
    Arc<MemoryUserRepository>,
) {
    let client_repo = Arc::new(MemoryClientRepository::new());
    let user_repo = Arc::new(MemoryUserRepository::new());

    let registry = OperationRegistry::for_services(
        Arc::new(ClientService::new(client_repo.clone())),
        Arc::new(CreateUserHandler::new(user_repo.clone())),
        Arc::new(UpdateUserHandler::new(user_repo.clone())),
        Arc::new(DeleteUserHandler::new(user_repo.clone())),
        Arc::new(GetUserHandler::new(user_repo.clone())),
        Arc::new(ListUsersHandler::new(user_repo.clone())),
        ActivityOptions::default(),
    );

    (Arc::new(registry), client_repo, user_repo)
}
