//! 活动重试与超时策略

use std::time::Duration;

/// 重试策略
///
/// 指数退避：第 n 次失败后的等待间隔为
/// `initial_interval * backoff_coefficient^(n-1)`，可选上限封顶。
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// 首次重试前的等待间隔
    pub initial_interval: Duration,
    /// 指数退避倍数
    pub backoff_coefficient: f64,
    /// 重试间隔上限，None 表示不封顶
    pub maximum_interval: Option<Duration>,
    /// 最大执行次数（含首次）
    pub maximum_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(1),
            backoff_coefficient: 2.0,
            maximum_interval: Some(Duration::from_secs(60)),
            maximum_attempts: 3,
        }
    }
}

impl RetryPolicy {
    /// 第 `attempt` 次执行失败后的退避间隔（attempt 从 1 开始）
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(63);
        let interval =
            self.initial_interval.as_secs_f64() * self.backoff_coefficient.powi(exponent as i32);
        let capped = match self.maximum_interval {
            Some(max) => interval.min(max.as_secs_f64()),
            None => interval,
        };
        Duration::from_secs_f64(capped.max(0.0))
    }
}

/// 单次活动调用的选项
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityOptions {
    /// 活动单次执行的超时
    pub start_to_close_timeout: Duration,
    pub retry_policy: RetryPolicy,
}

impl Default for ActivityOptions {
    fn default() -> Self {
        Self {
            start_to_close_timeout: Duration::from_secs(10),
            retry_policy: RetryPolicy::default(),
        }
    }
}
