use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::common::error::Result;

/// 账本的持久化形态
///
/// org 名 -> space 名 -> 条目名 -> RFC 3339 时间戳
pub type LedgerSnapshot = BTreeMap<String, BTreeMap<String, BTreeMap<String, String>>>;

// ==========================================
// 账本存储接口 (LedgerStore)
// ==========================================

/// 账本存储接口
///
/// **职责**: 在运行开始时加载上一次的账本快照，运行结束时整体写回。
/// **特点**:
/// - 低频调用 (每次运行各一次)
/// - 整体读写，没有增量更新
/// - 实现灵活 (本地 JSON 文件、内存，也可以是对象存储)
#[async_trait]
pub trait LedgerStore: Send + Sync + 'static {
    /// 加载快照
    ///
    /// 存储中还没有任何数据时应返回空快照，而不是错误。
    async fn load(&self) -> Result<LedgerSnapshot>;

    /// 保存快照 (整体覆盖)
    async fn save(&self, snapshot: &LedgerSnapshot) -> Result<()>;
}
