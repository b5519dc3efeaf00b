use std::time::Duration;

use async_trait::async_trait;

use crate::{
    common::{ProcessOutcome, QueryStats},
    driver::ProcessorContext,
};

/// 处理器插件/钩子接口
///
/// 用户可以通过实现此 Trait 来介入一次查询运行的生命周期。
/// 常见用途：
/// - 进度条 / 进度日志
/// - 自定义指标
/// - 失败告警
///
/// 钩子在 Worker 任务内顺序调用，耗时操作会直接拖慢处理。
#[async_trait]
pub trait ProcessorPlugin<T>: Send + Sync + 'static
where
    T: Send + Sync + 'static,
{
    /// [生命周期] 运行开始，第一次查询之前
    async fn on_start(&self, _ctx: &ProcessorContext) {}

    /// [查询] 一页查询返回之后 (空页也会调用)
    async fn after_page(&self, _ctx: &ProcessorContext, _page: usize, _items: usize) {}

    /// [条目] 处理函数调用之前
    async fn before_process(&self, _ctx: &ProcessorContext, _item: &T) {}

    /// [条目] 处理结束 (成功、失败、Panic 都会调用)
    async fn after_process(
        &self,
        _ctx: &ProcessorContext,
        _outcome: &ProcessOutcome<T>,
        _elapsed: Duration,
    ) {
    }

    /// [生命周期] 所有 Worker 退出之后
    async fn on_finish(&self, _ctx: &ProcessorContext, _stats: &QueryStats) {}
}
