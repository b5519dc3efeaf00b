use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::Serialize;

/// 处理器核心指标
// 使用 Atomic 保证高并发下的计数性能
#[derive(Debug, Default, Serialize)]
pub struct ProcessorMetrics {
    // --- 瞬时状态 (Gauges) ---
    /// 当前正在处理的条目数 (活跃并发数)
    pub active_items: AtomicUsize,

    // --- 累积计数 (Counters) ---
    /// 历史总成功条目数
    pub total_success: AtomicU64,

    /// 历史总失败条目数 (含 Panic)
    pub total_failure: AtomicU64,

    /// 历史总查询页数 (含最后的空页)
    pub total_pages: AtomicU64,
}

impl ProcessorMetrics {
    /// 增加活跃数 (开始处理)
    pub fn inc_active(&self) {
        self.active_items.fetch_add(1, Ordering::Relaxed);
    }

    /// 减少活跃数 (处理结束)
    pub fn dec_active(&self) {
        self.active_items.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn inc_success(&self) {
        self.total_success.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failure(&self) {
        self.total_failure.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_pages(&self) {
        self.total_pages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn active(&self) -> usize {
        self.active_items.load(Ordering::Relaxed)
    }

    pub fn successes(&self) -> u64 {
        self.total_success.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.total_failure.load(Ordering::Relaxed)
    }

    pub fn pages(&self) -> u64 {
        self.total_pages.load(Ordering::Relaxed)
    }

    /// 已处理完成的条目数 (进度展示用)
    pub fn completed(&self) -> u64 {
        self.successes() + self.failures()
    }
}
