use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, Notify, mpsc};

use crate::common::{MigrateError, Result};

/// 查询结果收集器 (Results Collector)
///
/// 查询函数把条目写进来，Worker 池从这里取走。
///
/// - 有界缓冲区，容量即 `results_per_page` (也是每批 Worker 的上限)。
/// - `result_count` 统计历史上写入过的条目总数，不随读取减少。
/// - 关闭后读者仍会先读完剩余条目，再观察到关闭；重复关闭是空操作。
/// - 关闭后写入返回 `ChannelClosed`。
///
/// **注意**: 缓冲区满时 `add_result` 会挂起，直到 Worker 取走条目。
/// 在 `execute_query` 中 Worker 要等查询函数返回之后才启动，
/// 所以一次查询同步写入的条目数不能超过容量 (超出部分应在后台任务里写入)。
pub struct ResultsCollector<T> {
    sender: Mutex<Option<mpsc::Sender<T>>>,
    receiver: AsyncMutex<mpsc::Receiver<T>>,
    count: AtomicUsize,
    added: Notify,
    per_page: usize,
}

impl<T: Send + 'static> ResultsCollector<T> {
    /// 创建收集器，容量至少为 1
    pub fn new(results_per_page: usize) -> Arc<Self> {
        let per_page = results_per_page.max(1);
        let (tx, rx) = mpsc::channel(per_page);
        Arc::new(Self {
            sender: Mutex::new(Some(tx)),
            receiver: AsyncMutex::new(rx),
            count: AtomicUsize::new(0),
            added: Notify::new(),
            per_page,
        })
    }

    /// 写入一个条目 (缓冲区满时等待)
    pub async fn add_result(&self, item: T) -> Result<()> {
        // 先把 Sender 克隆出来，不能持锁跨 await
        let sender = self
            .sender
            .lock()
            .as_ref()
            .cloned()
            .ok_or(MigrateError::ChannelClosed)?;
        sender.send(item).await?;
        self.count.fetch_add(1, Ordering::SeqCst);
        self.added.notify_waiters();
        Ok(())
    }

    /// 历史写入总数
    pub fn result_count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// 缓冲区容量
    pub fn results_per_page(&self) -> usize {
        self.per_page
    }

    /// 关闭写入端 (幂等)
    pub fn close(&self) {
        self.sender.lock().take();
    }

    /// 取消时使用：关闭写入端并关闭缓冲区
    ///
    /// 与 `close` 不同，缓冲区里剩下的条目不再被读取。
    /// 正挂起在 `add_result` 上的写入者会立刻得到 `ChannelClosed`，之后的写入同样失败。
    pub async fn shutdown(&self) {
        self.close();
        self.receiver.lock().await.close();
    }

    pub fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// 取下一个条目；缓冲区已空且写入端全部关闭时返回 `None`
    pub(crate) async fn next(&self) -> Option<T> {
        self.receiver.lock().await.recv().await
    }

    /// 等到历史写入总数达到 `n`
    pub(crate) async fn wait_for_count(&self, n: usize) {
        loop {
            let notified = self.added.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.result_count() >= n {
                return;
            }
            notified.await;
        }
    }
}
