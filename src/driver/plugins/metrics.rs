use std::{marker::PhantomData, sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::{
    common::ProcessOutcome,
    driver::{ProcessorContext, ProcessorMetrics, ProcessorPlugin},
};

/// 内置指标插件，构建处理器时自动放在插件列表的第一位
pub struct MetricsPlugin<T> {
    metrics: Arc<ProcessorMetrics>,
    _marker: PhantomData<fn(T)>,
}

impl<T> MetricsPlugin<T> {
    pub fn new(metrics: Arc<ProcessorMetrics>) -> Self {
        Self {
            metrics,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T> ProcessorPlugin<T> for MetricsPlugin<T>
where
    T: Send + Sync + 'static,
{
    async fn after_page(&self, _ctx: &ProcessorContext, _page: usize, _items: usize) {
        self.metrics.inc_pages();
    }

    // 开始处理 -> active+1
    async fn before_process(&self, _ctx: &ProcessorContext, _item: &T) {
        self.metrics.inc_active();
    }

    // 结束 -> active-1, success/failure+1
    async fn after_process(
        &self,
        _ctx: &ProcessorContext,
        outcome: &ProcessOutcome<T>,
        _elapsed: Duration,
    ) {
        self.metrics.dec_active();
        if outcome.is_success() {
            self.metrics.inc_success();
        } else {
            self.metrics.inc_failure();
        }
    }
}
