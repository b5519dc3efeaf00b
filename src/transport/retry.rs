use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::{Instant, sleep, sleep_until};
use tracing::{debug, warn};

use crate::{
    common::{MigrateError, Result, RetryConfig},
    policy::{FixedPause, PauseStrategy, RetryContext},
};

/// 带重试的远程调用包装器
///
/// - 暂时性错误 (`MigrateError::is_retryable`) 等待一个间隔后重试。
/// - 永久性错误或成功立即返回。
/// - 整个循环受总预算约束，预算从第一次调用开始计时；
///   预算耗尽时，最后一次暂时性错误被包装成 `Timeout` 返回。
#[derive(Clone)]
pub struct RetryingTransport {
    pause: Arc<dyn PauseStrategy>,
    timeout: Duration,
}

impl RetryingTransport {
    pub fn new<S: PauseStrategy>(pause: S, timeout: Duration) -> Self {
        Self {
            pause: Arc::new(pause),
            timeout,
        }
    }

    /// 按配置创建固定间隔的传输层
    pub fn from_config(cfg: &RetryConfig) -> Self {
        Self::new(FixedPause::new(cfg.pause()), cfg.timeout())
    }

    /// 重试总预算
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// 执行一次远程调用 (带重试)
    ///
    /// `op` 每次重试都会被重新调用，因此必须可以重复执行。
    pub async fn call<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let start = Instant::now();
        let deadline = start + self.timeout;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if !err.is_retryable() {
                return Err(err);
            }

            let pause = self
                .pause
                .pause_for(&RetryContext::new(attempt, start.elapsed()));
            debug!(attempt, ?pause, error = %err, "[Transport] Transient failure, retrying");

            // 截止时间优先：间隔与预算同时到期时判定为超时
            tokio::select! {
                biased;
                _ = sleep_until(deadline) => {
                    let elapsed = start.elapsed();
                    warn!(attempt, ?elapsed, error = %err, "[Transport] Retry budget exhausted");
                    return Err(MigrateError::Timeout {
                        elapsed,
                        source: Box::new(err),
                    });
                }
                _ = sleep(pause) => {}
            }
        }
    }
}

impl Default for RetryingTransport {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl std::fmt::Debug for RetryingTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingTransport")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryingTransport {
        RetryingTransport::new(FixedPause::from_millis(3), Duration::from_millis(100))
    }

    #[tokio::test(start_paused = true)]
    async fn always_transient_times_out_after_budget_over_pause_attempts() {
        let transport = fast();
        let attempts = AtomicU32::new(0);

        let result: Result<()> = transport
            .call(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(MigrateError::http(503, "unavailable")) }
            })
            .await;

        let err = result.unwrap_err();
        assert!(err.is_timeout());
        match err {
            MigrateError::Timeout { source, .. } => {
                assert!(matches!(*source, MigrateError::Http { status: 503, .. }))
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let n = attempts.load(Ordering::SeqCst);
        assert!((33..=35).contains(&n), "attempts = {n}");
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_error_is_returned_without_retry() {
        let transport = fast();
        let attempts = AtomicU32::new(0);

        let result: Result<()> = transport
            .call(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(MigrateError::http(404, "missing")) }
            })
            .await;

        assert!(matches!(result, Err(MigrateError::Http { status: 404, .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_transient_failures() {
        let transport = fast();
        let attempts = AtomicU32::new(0);

        let value = transport
            .call(|| {
                let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        Err(MigrateError::Resolve("api.example.com".into()))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(value, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_first_attempt_does_not_sleep() {
        let transport = fast();
        let start = Instant::now();
        let value = transport.call(|| async { Ok::<_, MigrateError>(7) }).await.unwrap();
        assert_eq!(value, 7);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
