use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    common::ProcessorConfig,
    driver::{ProcessorMetrics, ProcessorPlugin, QueryProcessor, plugins::MetricsPlugin},
    report::Summary,
};

/// 查询处理器构造器 (Builder Pattern)
/// - `T`: 工作条目类型
pub struct QueryProcessorBuilder<T> {
    /// 处理器配置
    config: Option<ProcessorConfig>,
    /// 插件列表
    plugins: Vec<Box<dyn ProcessorPlugin<T>>>,
    /// 运行耗时写入的汇总
    summary: Option<Arc<Summary>>,
    /// 全局统计指标
    metrics: Arc<ProcessorMetrics>,

    cancel: Option<CancellationToken>,
}

impl<T> Default for QueryProcessorBuilder<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// 创建一个新的构造器
    ///
    /// **默认行为**:
    /// - Config: Default (并发上限 5)
    /// - Summary: None (不记录耗时)
    /// - Cancel: 新建一个永不触发的 Token
    /// - Metrics: 0 (全新计数器)
    fn default() -> Self {
        Self {
            config: None,
            plugins: Vec::new(),
            summary: None,
            metrics: Arc::new(ProcessorMetrics::default()),
            cancel: None,
        }
    }
}

impl<T> QueryProcessorBuilder<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置处理器配置
    pub fn with_config(mut self, config: ProcessorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// 只设置并发上限
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.config = Some(ProcessorConfig {
            concurrency_limit: limit,
        });
        self
    }

    /// 添加插件 (支持链式调用)
    ///
    /// **注意**: 插件的执行顺序与添加顺序一致 (FIFO)，内置的 MetricsPlugin 总在最前。
    pub fn with_plugin<PL>(mut self, plugin: PL) -> Self
    where
        PL: ProcessorPlugin<T> + 'static,
    {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// 每次运行结束后把总耗时写入这个汇总
    pub fn with_summary(mut self, summary: Arc<Summary>) -> Self {
        self.summary = Some(summary);
        self
    }

    /// 使用外部取消信号 (例如 Ctrl-C 处理)
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// 构建处理器
    pub fn build(mut self) -> QueryProcessor<T> {
        let config = self.config.unwrap_or_default();
        debug!(
            concurrency_limit = config.concurrency_limit,
            plugins = self.plugins.len(),
            "[Processor] Building query processor"
        );

        // 自动注入 MetricsPlugin
        let metrics_plugin = Box::new(MetricsPlugin::new(self.metrics.clone()));
        self.plugins.insert(0, metrics_plugin);

        let token = self.cancel.unwrap_or_default();

        QueryProcessor::new_with_components(config, self.metrics, self.plugins, self.summary, token)
    }
}
