use std::time::Duration;

use crate::policy::{PauseStrategy, RetryContext};

/// 固定间隔策略
///
/// - 无论第几次重试，都等待同样的时长。
/// - 不带抖动：大量并发请求同时失败时，它们会在同一时刻一起重试 (惊群)。
///   这是已知限制，需要错峰的调用方应自行实现 `PauseStrategy`。
#[derive(Debug, Clone)]
pub struct FixedPause {
    interval: Duration,
}

impl FixedPause {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }
}

impl PauseStrategy for FixedPause {
    fn pause_for(&self, _ctx: &RetryContext) -> Duration {
        self.interval
    }
}

impl Default for FixedPause {
    fn default() -> Self {
        Self::from_millis(3_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pause_ignores_attempt_number() {
        let policy = FixedPause::from_millis(3);
        let first = RetryContext::new(1, Duration::ZERO);
        let tenth = RetryContext::new(10, Duration::from_millis(27));
        assert_eq!(policy.pause_for(&first), Duration::from_millis(3));
        assert_eq!(policy.pause_for(&tenth), Duration::from_millis(3));
    }
}
