//! 双路径调度器
//!
//! 每个操作先尝试提交给持久化编排器执行；当编排器不可用、
//! 启动被拒、等待超时或重试耗尽时，转入直接执行路径，在请求
//! 自身的上下文里调用同一个处理器。领域错误是终态结果，两条
//! 路径都原样上抛，绝不触发回退。

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crm_domain::{CrmError, CrmResult};

use crate::activity::OperationRegistry;
use crate::operations::Operation;
use crate::orchestrator::{Orchestrator, StartWorkflowRequest, WorkflowOutcome};
use crate::workflow::derive_workflow_id;

/// 持久化路径单次尝试的结局
enum DurableAttempt {
    Completed(serde_json::Value),
    DomainFailed(CrmError),
    Fallback(FallbackReason),
}

/// 转入回退路径的原因，进入日志
enum FallbackReason {
    StartFailed(String),
    AwaitTimeout,
    RetriesExhausted(String),
    OutcomeLost(String),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartFailed(detail) => write!(f, "工作流启动失败: {detail}"),
            Self::AwaitTimeout => write!(f, "等待工作流结果超时"),
            Self::RetriesExhausted(detail) => write!(f, "工作流重试耗尽: {detail}"),
            Self::OutcomeLost(detail) => write!(f, "工作流结果不可达: {detail}"),
        }
    }
}

/// 双路径调度器
///
/// 编排器为 None 时退化为纯直接执行模式（部署时未配置编排器），
/// 所有操作的可见结果与持久化路径一致。
pub struct DurableDispatcher {
    orchestrator: Option<Arc<dyn Orchestrator>>,
    registry: Arc<OperationRegistry>,
    await_timeout: Duration,
}

impl DurableDispatcher {
    pub fn new(
        orchestrator: Option<Arc<dyn Orchestrator>>,
        registry: Arc<OperationRegistry>,
        await_timeout: Duration,
    ) -> Self {
        Self {
            orchestrator,
            registry,
            await_timeout,
        }
    }

    /// 执行写操作
    ///
    /// `key` 是操作的幂等键（实体标识或自然键），与操作名一起
    /// 派生确定性的工作流标识。
    pub async fn execute<I, O>(&self, operation: Operation, key: &str, input: &I) -> CrmResult<O>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        let input = serde_json::to_value(input)?;
        let output = self.dispatch(operation, key, input).await?;
        Ok(serde_json::from_value(output)?)
    }

    /// 执行读操作，路径选择规则与写操作相同
    pub async fn query<I, O>(&self, operation: Operation, key: &str, input: &I) -> CrmResult<O>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        self.execute(operation, key, input).await
    }

    async fn dispatch(
        &self,
        operation: Operation,
        key: &str,
        input: serde_json::Value,
    ) -> CrmResult<serde_json::Value> {
        let mut fell_back = false;

        if let Some(orchestrator) = &self.orchestrator {
            let workflow_id = derive_workflow_id(operation, key);
            match self
                .attempt_durable(orchestrator.as_ref(), &workflow_id, operation, input.clone())
                .await
            {
                DurableAttempt::Completed(output) => {
                    debug!(operation = %operation, workflow_id = %workflow_id, "持久化路径执行完成");
                    return Ok(output);
                }
                DurableAttempt::DomainFailed(err) => return Err(err),
                DurableAttempt::Fallback(reason) => {
                    warn!(
                        operation = %operation,
                        workflow_id = %workflow_id,
                        reason = %reason,
                        "持久化路径不可用，转入直接执行"
                    );
                    fell_back = true;
                }
            }
        }

        let result = self.registry.invoke_direct(operation, input).await;

        // 回退后撞上唯一性冲突，很可能是放弃等待的那次工作流
        // 已经落库；冲突仍按原样上抛
        if fell_back {
            if let Err(CrmError::EmailAlreadyExists { email }) = &result {
                warn!(
                    operation = %operation,
                    email = %email,
                    "回退执行遇到已存在的实体，原持久化执行可能已生效"
                );
            }
        }

        result
    }

    async fn attempt_durable(
        &self,
        orchestrator: &dyn Orchestrator,
        workflow_id: &str,
        operation: Operation,
        input: serde_json::Value,
    ) -> DurableAttempt {
        let request = StartWorkflowRequest {
            workflow_id: workflow_id.to_string(),
            operation,
            input,
            options: self.registry.options().clone(),
        };

        let handle = match orchestrator.start(request).await {
            Ok(handle) => handle,
            Err(err) => return DurableAttempt::Fallback(FallbackReason::StartFailed(err.to_string())),
        };

        match tokio::time::timeout(self.await_timeout, handle.outcome()).await {
            Ok(Ok(WorkflowOutcome::Completed(output))) => DurableAttempt::Completed(output),
            Ok(Ok(WorkflowOutcome::DomainFailed(err))) => DurableAttempt::DomainFailed(err),
            Ok(Ok(WorkflowOutcome::RetriesExhausted(err))) => {
                DurableAttempt::Fallback(FallbackReason::RetriesExhausted(err.to_string()))
            }
            Ok(Err(err)) => DurableAttempt::Fallback(FallbackReason::OutcomeLost(err.to_string())),
            Err(_) => DurableAttempt::Fallback(FallbackReason::AwaitTimeout),
        }
    }
}
