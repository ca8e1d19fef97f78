//! 工作流定义
//!
//! 每个工作流是一个确定性的编排函数：恰好执行一次活动调用，
//! 按声明的重试策略和单次超时处理失败。本系统不做多步 saga。

use serde_json::Value;
use std::sync::Arc;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crm_domain::CrmError;

use crate::activity::OperationHandler;
use crate::operations::Operation;
use crate::orchestrator::WorkflowOutcome;
use crate::policy::ActivityOptions;

/// 工作流定义：操作 + 活动选项
#[derive(Debug, Clone)]
pub struct WorkflowDefinition {
    pub operation: Operation,
    pub options: ActivityOptions,
}

impl WorkflowDefinition {
    pub fn new(operation: Operation, options: ActivityOptions) -> Self {
        Self { operation, options }
    }
}

/// 从操作名和实体键确定性派生工作流标识
///
/// 同一逻辑操作重复提交得到同一标识，编排器据此识别为同一次
/// 执行（提交边界上的 exactly-once）。
pub fn derive_workflow_id(operation: Operation, key: &str) -> String {
    format!("{operation}-{key}")
}

/// 执行一个工作流定义
///
/// 重试决策完全由错误分类驱动：不可重试的领域错误立即终止并
/// 作为领域失败返回；可重试错误按策略退避重试，直到次数耗尽。
pub async fn run_workflow(
    definition: &WorkflowDefinition,
    activity: Arc<dyn OperationHandler>,
    input: Value,
) -> WorkflowOutcome {
    let operation = definition.operation;
    let policy = &definition.options.retry_policy;
    let max_attempts = policy.maximum_attempts.max(1);

    info!(workflow = %operation, "工作流开始执行");

    let mut last_error = CrmError::Internal("workflow did not run".to_string());
    for attempt in 1..=max_attempts {
        let result = timeout(
            definition.options.start_to_close_timeout,
            activity.call(input.clone()),
        )
        .await;

        match result {
            Ok(Ok(output)) => {
                info!(workflow = %operation, attempt, "工作流执行完成");
                return WorkflowOutcome::Completed(output);
            }
            Ok(Err(err)) if !err.is_retryable() => {
                info!(workflow = %operation, attempt, error = %err, "工作流以领域失败终止");
                return WorkflowOutcome::DomainFailed(err);
            }
            Ok(Err(err)) => {
                warn!(workflow = %operation, attempt, error = %err, "活动失败，等待重试");
                last_error = err;
            }
            Err(_) => {
                warn!(workflow = %operation, attempt, "活动超过单次执行时限");
                last_error = CrmError::Timeout(format!(
                    "activity {operation} exceeded start-to-close timeout"
                ));
            }
        }

        if attempt < max_attempts {
            let backoff = policy.backoff_for(attempt);
            debug!(workflow = %operation, attempt, backoff_ms = backoff.as_millis() as u64, "退避等待");
            sleep(backoff).await;
        }
    }

    warn!(workflow = %operation, attempts = max_attempts, error = %last_error, "工作流重试耗尽");
    WorkflowOutcome::RetriesExhausted(last_error)
}
