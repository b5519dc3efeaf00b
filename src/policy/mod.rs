pub mod fixed;

use std::time::Duration;

pub use fixed::FixedPause;

/// 重试策略上下文
///
/// - 包含了当前重试循环的运行状态，供策略层决策时参考。
#[derive(Debug, Clone)]
pub struct RetryContext {
    /// 已经失败的次数 (1 表示第一次调用刚失败)
    pub attempt: u32,
    /// 从第一次调用开始到现在的耗时
    pub elapsed: Duration,
}

impl RetryContext {
    pub fn new(attempt: u32, elapsed: Duration) -> Self {
        Self { attempt, elapsed }
    }
}

/// 重试间隔策略接口
///
/// - 决定了暂时性失败之后要等待多久再发起下一次调用。
/// - 总预算由传输层控制，策略只负责单次间隔。
pub trait PauseStrategy: Send + Sync + 'static {
    fn pause_for(&self, ctx: &RetryContext) -> Duration;
}
