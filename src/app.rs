use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, sync::broadcast, task::JoinHandle};
use tracing::info;

use crm_api::{create_app, AppState};
use crm_application::{
    ClientService, CreateUserHandler, DeleteUserHandler, GetUserHandler, ListUsersHandler,
    UpdateUserHandler,
};
use crm_domain::{ClientRepository, UserRepository};
use crm_durable::{
    ActivityOptions, DurableDispatcher, EmbeddedOrchestrator, OperationRegistry, Orchestrator,
    RetryPolicy,
};
use crm_infrastructure::config::OrchestratorConfig;
use crm_infrastructure::database::memory::{MemoryClientRepository, MemoryUserRepository};
use crm_infrastructure::database::postgres::{PostgresClientRepository, PostgresUserRepository};
use crm_infrastructure::{database::create_pool, AppConfig};

/// 主应用程序
///
/// 按配置装配仓储、操作注册表、内嵌编排器和 HTTP 服务。
pub struct Application {
    config: AppConfig,
    router: axum::Router,
    worker_handle: Option<JoinHandle<()>>,
}

impl Application {
    /// 创建新的应用实例
    ///
    /// `worker_shutdown_rx` 传递给编排器 worker，与 HTTP 服务共用
    /// 同一个关闭广播。
    pub async fn new(
        config: AppConfig,
        worker_shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<Self> {
        info!(driver = %config.database.driver, "初始化应用程序");

        let (client_repo, user_repo) = build_repositories(&config).await?;

        let registry = Arc::new(OperationRegistry::for_services(
            Arc::new(ClientService::new(client_repo)),
            Arc::new(CreateUserHandler::new(user_repo.clone())),
            Arc::new(UpdateUserHandler::new(user_repo.clone())),
            Arc::new(DeleteUserHandler::new(user_repo.clone())),
            Arc::new(GetUserHandler::new(user_repo.clone())),
            Arc::new(ListUsersHandler::new(user_repo)),
            activity_options(&config.orchestrator),
        ));

        let (orchestrator, worker_handle) = if config.orchestrator.enabled {
            let (orchestrator, handle) = EmbeddedOrchestrator::connect(
                registry.clone(),
                &config.orchestrator.task_queue,
                worker_shutdown_rx,
            );
            info!(task_queue = %config.orchestrator.task_queue, "内嵌编排器已启动");
            (Some(orchestrator as Arc<dyn Orchestrator>), Some(handle))
        } else {
            info!("编排器未启用，所有操作走直接执行路径");
            (None, None)
        };

        let dispatcher = Arc::new(DurableDispatcher::new(
            orchestrator,
            registry,
            Duration::from_millis(config.orchestrator.await_timeout_ms),
        ));

        let router = create_app(AppState { dispatcher });

        Ok(Self {
            config,
            router,
            worker_handle,
        })
    }

    /// 运行应用程序，直到收到关闭信号
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let addr = format!("{}:{}", self.config.server.host, self.config.server.port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("绑定监听地址失败: {addr}"))?;
        info!("HTTP服务监听于 {addr}");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await
            .context("HTTP服务运行失败")?;

        // worker 订阅了同一个关闭广播，等它把在飞的工作流收尾
        if let Some(handle) = self.worker_handle {
            let _ = handle.await;
        }

        info!("应用已停止");
        Ok(())
    }
}

/// 按配置的存储驱动装配仓储
async fn build_repositories(
    config: &AppConfig,
) -> Result<(Arc<dyn ClientRepository>, Arc<dyn UserRepository>)> {
    match config.database.driver.as_str() {
        "memory" => Ok((
            Arc::new(MemoryClientRepository::new()),
            Arc::new(MemoryUserRepository::new()),
        )),
        "postgres" => {
            let pool = create_pool(&config.database)
                .await
                .context("创建数据库连接池失败")?;
            Ok((
                Arc::new(PostgresClientRepository::new(pool.clone())),
                Arc::new(PostgresUserRepository::new(pool)),
            ))
        }
        other => Err(anyhow::anyhow!("不支持的存储驱动: {other}")),
    }
}

/// 把配置的重试参数换算成活动选项
fn activity_options(config: &OrchestratorConfig) -> ActivityOptions {
    let maximum_interval = if config.retry.max_interval_ms == 0 {
        None
    } else {
        Some(Duration::from_millis(config.retry.max_interval_ms))
    };

    ActivityOptions {
        start_to_close_timeout: Duration::from_secs(config.start_to_close_seconds),
        retry_policy: RetryPolicy {
            initial_interval: Duration::from_millis(config.retry.initial_interval_ms),
            backoff_coefficient: config.retry.backoff_coefficient,
            maximum_interval,
            maximum_attempts: config.retry.max_attempts,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_options_from_config_defaults() {
        let options = activity_options(&OrchestratorConfig::default());
        assert_eq!(options.start_to_close_timeout, Duration::from_secs(10));
        assert_eq!(options.retry_policy.initial_interval, Duration::from_secs(1));
        assert_eq!(
            options.retry_policy.maximum_interval,
            Some(Duration::from_secs(60))
        );
        assert_eq!(options.retry_policy.maximum_attempts, 3);
    }

    #[test]
    fn test_zero_max_interval_means_uncapped() {
        let mut config = OrchestratorConfig::default();
        config.retry.max_interval_ms = 0;
        let options = activity_options(&config);
        assert_eq!(options.retry_policy.maximum_interval, None);
    }

    #[tokio::test]
    async fn test_unknown_driver_is_rejected() {
        let mut config = AppConfig::default();
        config.database.driver = "sqlite".to_string();
        assert!(build_repositories(&config).await.is_err());
    }
}
