//! 内嵌编排引擎
//!
//! 外部持久化编排服务的进程内替身，满足同一契约：按工作流
//! 标识去重的提交、任务队列、带重试策略的活动执行。提交后的
//! 执行不依赖等待者存活，调用方放弃等待后工作流照常跑完。

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::activity::OperationRegistry;
use crate::operations::Operation;
use crate::orchestrator::{
    ExecutionCell, OrchestrationError, OrchestrationResult, Orchestrator, StartWorkflowRequest,
    WorkflowHandle,
};
use crate::policy::ActivityOptions;
use crate::workflow::{run_workflow, WorkflowDefinition};

/// 在飞执行表：workflow_id → 执行单元
///
/// 终态写入后条目即被移除，同一标识可再次提交（对齐编排器
/// 完成后允许复用标识的行为）；去重只作用于在飞执行。
type ExecutionMap = Arc<Mutex<HashMap<String, Arc<ExecutionCell>>>>;

struct WorkflowTask {
    workflow_id: String,
    operation: Operation,
    input: serde_json::Value,
    options: ActivityOptions,
    cell: Arc<ExecutionCell>,
}

/// 内嵌编排器客户端
pub struct EmbeddedOrchestrator {
    executions: ExecutionMap,
    task_tx: mpsc::UnboundedSender<WorkflowTask>,
}

impl EmbeddedOrchestrator {
    /// 建立编排器连接并启动其 worker 运行时
    ///
    /// 返回的 JoinHandle 对应 worker 循环；worker 在收到关闭
    /// 信号或任务队列关闭后退出，此后的提交以不可用失败。
    pub fn connect(
        registry: Arc<OperationRegistry>,
        task_queue: &str,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> (Arc<Self>, JoinHandle<()>) {
        let (task_tx, task_rx) = mpsc::unbounded_channel();
        let executions: ExecutionMap = Arc::new(Mutex::new(HashMap::new()));

        let worker = WorkflowWorker {
            registry,
            task_queue: task_queue.to_string(),
            executions: executions.clone(),
        };
        let worker_handle = tokio::spawn(worker.run(task_rx, shutdown_rx));

        (
            Arc::new(Self {
                executions,
                task_tx,
            }),
            worker_handle,
        )
    }
}

#[async_trait]
impl Orchestrator for EmbeddedOrchestrator {
    async fn start(&self, request: StartWorkflowRequest) -> OrchestrationResult<WorkflowHandle> {
        let mut executions = self
            .executions
            .lock()
            .map_err(|_| OrchestrationError::Unavailable("execution table poisoned".to_string()))?;

        // 同一工作流标识的在飞执行只启动一次，后来者拿到同一句柄
        if let Some(cell) = executions.get(&request.workflow_id) {
            debug!(workflow_id = %request.workflow_id, "复用在飞的工作流执行");
            return Ok(WorkflowHandle::new(cell.clone()));
        }

        let cell = Arc::new(ExecutionCell::new());
        let task = WorkflowTask {
            workflow_id: request.workflow_id.clone(),
            operation: request.operation,
            input: request.input,
            options: request.options,
            cell: cell.clone(),
        };
        self.task_tx
            .send(task)
            .map_err(|_| OrchestrationError::Unavailable("工作流 worker 已停止".to_string()))?;

        executions.insert(request.workflow_id, cell.clone());
        Ok(WorkflowHandle::new(cell))
    }
}

/// 工作流 worker 运行时
///
/// 消费任务队列并执行注册表中的工作流；每个工作流独立 spawn，
/// 互不阻塞。
struct WorkflowWorker {
    registry: Arc<OperationRegistry>,
    task_queue: String,
    executions: ExecutionMap,
}

impl WorkflowWorker {
    async fn run(
        self,
        mut task_rx: mpsc::UnboundedReceiver<WorkflowTask>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        info!(task_queue = %self.task_queue, "工作流 worker 启动");
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!(task_queue = %self.task_queue, "收到关闭信号，工作流 worker 退出");
                    break;
                }
                task = task_rx.recv() => {
                    let Some(task) = task else {
                        info!(task_queue = %self.task_queue, "任务队列已关闭，工作流 worker 退出");
                        break;
                    };
                    let registry = self.registry.clone();
                    let executions = self.executions.clone();
                    tokio::spawn(Self::execute(registry, executions, task));
                }
            }
        }
    }

    async fn execute(registry: Arc<OperationRegistry>, executions: ExecutionMap, task: WorkflowTask) {
        let outcome = match registry.activity_for(task.operation) {
            Some(activity) => {
                let definition = WorkflowDefinition::new(task.operation, task.options);
                Ok(run_workflow(&definition, activity, task.input).await)
            }
            None => {
                error!(operation = %task.operation, "操作未在注册表中，无法执行工作流");
                Err(OrchestrationError::StartRejected(format!(
                    "操作未注册: {}",
                    task.operation
                )))
            }
        };

        task.cell.fulfill(outcome);
        if let Ok(mut executions) = executions.lock() {
            executions.remove(&task.workflow_id);
        }
    }
}
