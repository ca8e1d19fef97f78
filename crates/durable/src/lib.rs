//! 持久化命令执行层
//!
//! 每个读写操作既可以提交给持久化编排器（带重试、超时和幂等
//! 工作流标识）执行，也可以在编排器不可用或失败时在请求自身
//! 上下文中直接执行。两条路径在仓储边界上语义等价。

pub mod activity;
pub mod dispatcher;
pub mod embedded;
pub mod operations;
pub mod orchestrator;
pub mod policy;
pub mod workflow;

#[cfg(test)]
mod test_utils;

pub use activity::{ActivityAdapter, OperationHandler, OperationRegistry};
pub use dispatcher::DurableDispatcher;
pub use embedded::EmbeddedOrchestrator;
pub use operations::Operation;
pub use orchestrator::{
    OrchestrationError, Orchestrator, StartWorkflowRequest, WorkflowHandle, WorkflowOutcome,
};
pub use policy::{ActivityOptions, RetryPolicy};
pub use workflow::{derive_workflow_id, WorkflowDefinition};
