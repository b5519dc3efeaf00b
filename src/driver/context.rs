use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{common::ProcessorConfig, driver::ProcessorMetrics};

/// 运行上下文 (Run Context)
///
/// **职责**:
/// 每次 `execute_query` / `execute_page_query` 调用生成一个，
/// 打包了这次运行共享的资源，交给插件钩子使用。
#[derive(Clone)]
pub struct ProcessorContext {
    /// 本次运行的短 ID，同时挂在 tracing span 上
    pub run_id: String,

    /// 处理器配置 (并发上限等)
    pub config: Arc<ProcessorConfig>,

    /// 全局统计指标 (跨多次运行累积)
    pub metrics: Arc<ProcessorMetrics>,

    /// 取消信号
    pub cancel: CancellationToken,
}

impl ProcessorContext {
    pub fn new(
        run_id: String,
        config: Arc<ProcessorConfig>,
        metrics: Arc<ProcessorMetrics>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            run_id,
            config,
            metrics,
            cancel,
        }
    }

    /// 是否已收到取消信号
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
