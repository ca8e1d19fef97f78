//! 持久化编排器契约
//!
//! 核心只依赖这里的窄接口：提交工作流拿到句柄，在句柄上等待
//! 终态结果。编排器层面的失败（不可用、启动被拒、结果丢失）
//! 永远不会直接暴露给 API 调用方，只会触发回退。

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Notify;

use crm_domain::CrmError;

use crate::operations::Operation;
use crate::policy::ActivityOptions;

/// 编排器层面的错误，触发回退而非上抛
#[derive(Error, Debug, Clone)]
pub enum OrchestrationError {
    #[error("编排器不可用: {0}")]
    Unavailable(String),
    #[error("工作流启动被拒绝: {0}")]
    StartRejected(String),
    #[error("工作流执行结果丢失: {0}")]
    ExecutionLost(String),
}

pub type OrchestrationResult<T> = Result<T, OrchestrationError>;

/// 工作流终态
///
/// 领域失败是终态结果，必须原样返回给调用方；重试耗尽属于
/// 编排器层面的结局，由调度器决定转入回退。
#[derive(Debug, Clone)]
pub enum WorkflowOutcome {
    Completed(Value),
    DomainFailed(CrmError),
    RetriesExhausted(CrmError),
}

/// 工作流启动请求
///
/// 工作流标识由操作名和实体键确定性派生，重复提交同一逻辑
/// 操作会被编排器识别为同一次执行。
#[derive(Debug, Clone)]
pub struct StartWorkflowRequest {
    pub workflow_id: String,
    pub operation: Operation,
    pub input: Value,
    pub options: ActivityOptions,
}

/// 编排器客户端接口
///
/// 连接是进程级共享的长生命周期资源，必须支持任意多个并发的
/// 提交/等待调用。
#[async_trait]
pub trait Orchestrator: Send + Sync {
    async fn start(&self, request: StartWorkflowRequest) -> OrchestrationResult<WorkflowHandle>;
}

/// 一次工作流执行的句柄
///
/// 同一 workflow_id 的并发提交共享同一个执行单元，所有等待者
/// 收到相同的终态。
#[derive(Debug, Clone)]
pub struct WorkflowHandle {
    cell: Arc<ExecutionCell>,
}

impl WorkflowHandle {
    pub(crate) fn new(cell: Arc<ExecutionCell>) -> Self {
        Self { cell }
    }

    /// 构造一个已完成的句柄（测试用）
    pub fn ready(outcome: OrchestrationResult<WorkflowOutcome>) -> Self {
        let cell = Arc::new(ExecutionCell::new());
        cell.fulfill(outcome);
        Self { cell }
    }

    /// 等待工作流终态
    ///
    /// 这里是预期中唯一会长时间挂起的等待点；调用方负责用总时限
    /// 包裹它，超时后转入回退路径。
    pub async fn outcome(&self) -> OrchestrationResult<WorkflowOutcome> {
        self.cell.wait().await
    }
}

/// 执行单元：单次工作流执行的共享终态存储
#[derive(Debug)]
pub(crate) struct ExecutionCell {
    notify: Notify,
    outcome: OnceLock<OrchestrationResult<WorkflowOutcome>>,
}

impl ExecutionCell {
    pub(crate) fn new() -> Self {
        Self {
            notify: Notify::new(),
            outcome: OnceLock::new(),
        }
    }

    /// 写入终态并唤醒所有等待者；只有第一次写入生效
    pub(crate) fn fulfill(&self, outcome: OrchestrationResult<WorkflowOutcome>) {
        let _ = self.outcome.set(outcome);
        self.notify.notify_waiters();
    }

    pub(crate) async fn wait(&self) -> OrchestrationResult<WorkflowOutcome> {
        loop {
            // 先注册再检查，避免错过 fulfill 与 notified 之间的唤醒
            let notified = self.notify.notified();
            if let Some(outcome) = self.outcome.get() {
                return outcome.clone();
            }
            notified.await;
        }
    }
}
