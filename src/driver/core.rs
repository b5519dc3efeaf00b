use std::{
    future::Future,
    panic::AssertUnwindSafe,
    pin::Pin,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    task::{Context, Poll},
};

use futures::{FutureExt, Stream};
use tokio::{
    sync::mpsc,
    task::{JoinHandle, JoinSet},
    time::Instant,
};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info_span, trace, warn};

use crate::{
    common::{
        ItemProcessor, MigrateError, ProcessOutcome, ProcessorConfig, QueryStats, Result,
        new_run_id, panic_message,
    },
    driver::{
        ProcessorContext, ProcessorMetrics, ProcessorPlugin, QueryProcessorBuilder,
        ResultsCollector,
    },
    report::Summary,
};

/// 处理器 Inner 结构体
struct ProcessorInner<T> {
    config: Arc<ProcessorConfig>,
    metrics: Arc<ProcessorMetrics>,
    /// 插件系统 (第一个总是 MetricsPlugin)
    plugins: Vec<Box<dyn ProcessorPlugin<T>>>,
    /// 运行耗时写到这里
    summary: Option<Arc<Summary>>,
    /// 取消信号，所有运行共享
    cancel: CancellationToken,
}

impl<T> ProcessorInner<T>
where
    T: Send + Sync + 'static,
{
    async fn on_start(&self, ctx: &ProcessorContext) {
        for p in self.plugins.iter() {
            p.on_start(ctx).await;
        }
    }

    async fn after_page(&self, ctx: &ProcessorContext, page: usize, items: usize) {
        for p in self.plugins.iter() {
            p.after_page(ctx, page, items).await;
        }
    }

    async fn on_finish(&self, ctx: &ProcessorContext, stats: &QueryStats) {
        for p in self.plugins.iter() {
            p.on_finish(ctx, stats).await;
        }
    }
}

/// 有界查询处理器 (Bounded Query Processor)
///
/// 把查询函数产出的条目扇出给固定大小的 Worker 池，
/// 再把每个条目的处理结果按完成顺序汇入同一个输出流。
///
/// - 每批 Worker 数 = `min(收集器容量, 本批条目数)`。
/// - 条目失败 (含 Panic) 只产生一个带错误的结果，不影响其他条目。
/// - 查询失败是致命的：不再请求后续页面，已入队的条目照常处理完。
pub struct QueryProcessor<T> {
    inner: Arc<ProcessorInner<T>>,
}

impl<T> Clone for QueryProcessor<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> QueryProcessor<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn builder() -> QueryProcessorBuilder<T> {
        QueryProcessorBuilder::default()
    }

    /// 构造函数
    pub(crate) fn new_with_components(
        config: ProcessorConfig,
        metrics: Arc<ProcessorMetrics>,
        plugins: Vec<Box<dyn ProcessorPlugin<T>>>,
        summary: Option<Arc<Summary>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            inner: Arc::new(ProcessorInner {
                config: Arc::new(config),
                metrics,
                plugins,
                summary,
                cancel,
            }),
        }
    }

    /// 按并发上限创建一个收集器
    pub fn new_collector(&self) -> Arc<ResultsCollector<T>> {
        ResultsCollector::new(self.inner.config.concurrency_limit)
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.inner.config
    }

    /// 暴露全局指标
    pub fn metrics(&self) -> Arc<ProcessorMetrics> {
        self.inner.metrics.clone()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }

    /// 触发取消
    ///
    /// 不再请求新页面，空闲 Worker 不再取条目，还在缓冲区里的条目被放弃，
    /// 挂起在 `add_result` 上的写入者收到 `ChannelClosed`。
    /// 正在处理的条目会处理完。取消后这个处理器上的后续运行都会立即以 `Cancelled` 结束。
    pub fn cancel(&self) {
        trace!("[Processor] Cancel triggered.");
        self.inner.cancel.cancel();
    }

    fn new_context(&self) -> ProcessorContext {
        ProcessorContext::new(
            new_run_id(),
            self.inner.config.clone(),
            self.inner.metrics.clone(),
            self.inner.cancel.clone(),
        )
    }

    // ==========================================
    // 1. 单次查询
    // ==========================================

    /// 执行单次查询
    ///
    /// 1. 调用 `query(collector)` 一次。查询失败直接返回该错误。
    /// 2. 返回 0 个条目：关闭收集器，返回 `EmptyWorkSet`。
    /// 3. 否则启动 `min(容量, 条目数)` 个 Worker；写入总数达到报告的数量后关闭收集器。
    ///
    /// 查询函数可以在后台任务里继续写入，但报告的数量必须等于最终写入的数量，
    /// 否则收集器不会关闭，输出流也不会结束。
    pub async fn execute_query<Q, Fut, P>(
        &self,
        collector: Arc<ResultsCollector<T>>,
        query: Q,
        processor: P,
    ) -> Result<OutcomeStream<T>>
    where
        Q: FnOnce(Arc<ResultsCollector<T>>) -> Fut,
        Fut: Future<Output = Result<usize>>,
        P: ItemProcessor<T>,
    {
        let ctx = self.new_context();
        let span = info_span!("query", run_id = %ctx.run_id);

        async move {
            if ctx.is_cancelled() {
                collector.shutdown().await;
                return Err(MigrateError::Cancelled);
            }

            let start = Instant::now();
            self.inner.on_start(&ctx).await;

            let count = match query(collector.clone()).await {
                Ok(n) => n,
                Err(e) => {
                    warn!(error = %e, "[Processor] Query failed");
                    collector.close();
                    return Err(e);
                }
            };
            self.inner.after_page(&ctx, 1, count).await;

            if count == 0 {
                collector.close();
                return Err(MigrateError::EmptyWorkSet);
            }
            trace!(items = count, "[Processor] Query returned");

            let (tx, rx) = mpsc::unbounded_channel();
            let run = Arc::new(Run {
                inner: self.inner.clone(),
                ctx,
                processor,
                collector,
                tx,
                spawned: AtomicUsize::new(0),
            });

            let mut workers = JoinSet::new();
            run.spawn_workers(&mut workers, count);

            let done = tokio::spawn(
                async move {
                    // 报告的数量全部写入后关闭收集器
                    tokio::select! {
                        biased;
                        _ = run.ctx.cancel.cancelled() => {}
                        _ = run.collector.wait_for_count(count) => {}
                    }
                    run.collector.close();
                    run.finish(workers, start, 1).await
                }
                .in_current_span(),
            );

            Ok(OutcomeStream { rx, done })
        }
        .instrument(span)
        .await
    }

    // ==========================================
    // 2. 分页查询
    // ==========================================

    /// 执行分页查询
    ///
    /// 立即返回输出流，分页在后台进行：
    /// - 依次调用 `page_query(page, collector)`，page 从 1 开始。
    /// - 每页返回后立刻为这一页启动一批 Worker，处理与下一页的查询重叠。
    /// - 某页返回 0 个条目时关闭收集器，分页结束。
    /// - 某页查询失败时停止分页并关闭收集器，错误由 `OutcomeStream::finish` 返回。
    ///
    /// 所有 Worker 退出后，本次运行的总耗时写入 `Summary`。
    pub fn execute_page_query<Q, Fut, P>(
        &self,
        collector: Arc<ResultsCollector<T>>,
        mut page_query: Q,
        processor: P,
    ) -> OutcomeStream<T>
    where
        Q: FnMut(usize, Arc<ResultsCollector<T>>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<usize>> + Send + 'static,
        P: ItemProcessor<T>,
    {
        let ctx = self.new_context();
        let span = info_span!("page_query", run_id = %ctx.run_id);
        let (tx, rx) = mpsc::unbounded_channel();
        let run = Arc::new(Run {
            inner: self.inner.clone(),
            ctx,
            processor,
            collector,
            tx,
            spawned: AtomicUsize::new(0),
        });

        let done = tokio::spawn(
            async move {
                let start = Instant::now();
                run.inner.on_start(&run.ctx).await;

                let mut workers = JoinSet::new();
                let mut page = 0;
                let mut fatal = None;

                loop {
                    if run.ctx.is_cancelled() {
                        break;
                    }
                    page += 1;

                    let result = tokio::select! {
                        biased;
                        _ = run.ctx.cancel.cancelled() => break,
                        r = page_query(page, run.collector.clone()) => r,
                    };

                    match result {
                        Ok(n) => {
                            run.inner.after_page(&run.ctx, page, n).await;
                            if n == 0 {
                                trace!(page, "[Processor] Empty page, pagination complete");
                                break;
                            }
                            trace!(page, items = n, "[Processor] Page returned");
                            run.spawn_workers(&mut workers, n);
                        }
                        Err(e) => {
                            warn!(page, error = %e, "[Processor] Page query failed, stopping pagination");
                            fatal = Some(e);
                            break;
                        }
                    }
                }

                // 已入队的条目照常处理完
                run.collector.close();
                let stats = run.finish(workers, start, page).await;
                match fatal {
                    Some(e) => Err(e),
                    None => stats,
                }
            }
            .instrument(span),
        );

        OutcomeStream { rx, done }
    }
}

// ==========================================
// Core Logic: Worker 池
// ==========================================

/// 一次运行的共享状态 (所有 Worker 持有同一个 Arc)
struct Run<T, P> {
    inner: Arc<ProcessorInner<T>>,
    ctx: ProcessorContext,
    processor: P,
    collector: Arc<ResultsCollector<T>>,
    tx: mpsc::UnboundedSender<ProcessOutcome<T>>,
    /// 本次运行累计启动的 Worker 数
    spawned: AtomicUsize,
}

impl<T, P> Run<T, P>
where
    T: Clone + Send + Sync + 'static,
    P: ItemProcessor<T>,
{
    /// 为一批条目启动 `min(容量, available)` 个 Worker
    fn spawn_workers(self: &Arc<Self>, workers: &mut JoinSet<()>, available: usize) {
        let n = self.collector.results_per_page().min(available);
        self.spawned.fetch_add(n, Ordering::Relaxed);
        for _ in 0..n {
            let run = self.clone();
            workers.spawn(async move { run.work().await }.in_current_span());
        }
        trace!(workers = n, "[Processor] Spawned worker batch");
    }

    /// Worker 主循环：取条目 -> 处理 -> 发送结果，直到收集器关闭且取空
    async fn work(&self) {
        loop {
            let item = tokio::select! {
                biased;
                _ = self.ctx.cancel.cancelled() => break,
                next = self.collector.next() => match next {
                    Some(item) => item,
                    None => break,
                },
            };
            let outcome = self.process_one(item).await;
            // 接收端已被丢弃时结果直接丢弃，处理继续
            let _ = self.tx.send(outcome);
        }
    }

    /// 处理单个条目
    async fn process_one(&self, item: T) -> ProcessOutcome<T> {
        let plugins = &self.inner.plugins;
        // Hook: 处理前
        for p in plugins.iter() {
            p.before_process(&self.ctx, &item).await;
        }

        let started = Instant::now();
        let result = AssertUnwindSafe(self.processor.process(item.clone()))
            .catch_unwind()
            .await;
        let elapsed = started.elapsed();

        let outcome = match result {
            Ok(Ok(())) => ProcessOutcome::success(item),
            Ok(Err(e)) => {
                debug!(error = %e, "[Processor] Item failed");
                ProcessOutcome::failure(item, e)
            }
            Err(panic_err) => {
                let msg = panic_message(&*panic_err);
                error!("[Processor] Item processing panicked: {}", msg);
                ProcessOutcome::failure(item, MigrateError::Other(anyhow::anyhow!(msg)))
            }
        };

        // Hook: 处理后 (无论成功失败)
        for p in plugins.iter() {
            p.after_process(&self.ctx, &outcome, elapsed).await;
        }
        outcome
    }

    /// 等待所有 Worker 退出，写入耗时并汇总统计
    async fn finish(
        &self,
        mut workers: JoinSet<()>,
        start: Instant,
        pages: usize,
    ) -> Result<QueryStats> {
        // 取消后缓冲区不再有人读，挂起的写入者必须被释放
        if self.ctx.is_cancelled() {
            self.collector.shutdown().await;
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!("[Processor] Worker task failed: {:?}", e);
            }
        }

        let stats = QueryStats {
            pages,
            items: self.collector.result_count(),
            workers: self.spawned.load(Ordering::Relaxed),
            elapsed: start.elapsed(),
        };
        if let Some(summary) = &self.inner.summary {
            summary.set_duration(stats.elapsed);
        }
        self.inner.on_finish(&self.ctx, &stats).await;
        trace!(
            pages = stats.pages,
            items = stats.items,
            elapsed = ?stats.elapsed,
            "[Processor] Run finished"
        );

        if self.ctx.is_cancelled() {
            return Err(MigrateError::Cancelled);
        }
        Ok(stats)
    }
}

// ==========================================
// 输出流 (OutcomeStream)
// ==========================================

/// 处理结果流
///
/// 按完成顺序产出 `ProcessOutcome`，所有 Worker 退出后结束。
/// 读完之后调用 `finish` 拿到运行统计或致命错误。
pub struct OutcomeStream<T> {
    rx: mpsc::UnboundedReceiver<ProcessOutcome<T>>,
    done: JoinHandle<Result<QueryStats>>,
}

impl<T> OutcomeStream<T> {
    /// 下一个结果；流结束时返回 `None`
    pub async fn recv(&mut self) -> Option<ProcessOutcome<T>> {
        self.rx.recv().await
    }

    /// 等待运行结束
    ///
    /// 没读完的结果会被丢弃。分页查询的致命错误和取消都从这里返回。
    pub async fn finish(self) -> Result<QueryStats> {
        match self.done.await {
            Ok(result) => result,
            Err(e) => Err(anyhow::Error::new(e).into()),
        }
    }

    /// 读完所有结果，再等待运行结束
    pub async fn collect_all(mut self) -> (Vec<ProcessOutcome<T>>, Result<QueryStats>) {
        let mut outcomes = Vec::new();
        while let Some(outcome) = self.recv().await {
            outcomes.push(outcome);
        }
        (outcomes, self.finish().await)
    }
}

impl<T> Stream for OutcomeStream<T> {
    type Item = ProcessOutcome<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}
