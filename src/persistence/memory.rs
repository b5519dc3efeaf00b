use async_trait::async_trait;
use parking_lot::Mutex;

use crate::common::error::Result;
use crate::persistence::traits::{LedgerSnapshot, LedgerStore};

/// 内存账本存储
///
/// 单机测试和演练 (dry run) 用，进程退出即丢失。
#[derive(Default)]
pub struct MemoryLedgerStore {
    snapshot: Mutex<LedgerSnapshot>,
    saves: Mutex<usize>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以已有快照作为初始内容
    pub fn with_snapshot(snapshot: LedgerSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            saves: Mutex::new(0),
        }
    }

    /// 当前保存的内容 (副本)
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.snapshot.lock().clone()
    }

    /// `save` 被调用的次数
    pub fn save_count(&self) -> usize {
        *self.saves.lock()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn load(&self) -> Result<LedgerSnapshot> {
        Ok(self.snapshot.lock().clone())
    }

    async fn save(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        *self.snapshot.lock() = snapshot.clone();
        *self.saves.lock() += 1;
        Ok(())
    }
}
