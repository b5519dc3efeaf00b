use std::{
    collections::BTreeMap,
    io::{Read, Write},
};

use chrono::{DateTime, SubsecRound, Utc};
use parking_lot::RwLock;
use tracing::trace;

use crate::{
    common::{LedgerConfig, Result, ScopePath, TimeUtils},
    persistence::{
        JsonFileStore, LedgerSnapshot, LedgerStore,
        file::{read_snapshot, write_snapshot},
    },
};

type Entries = BTreeMap<String, BTreeMap<String, BTreeMap<String, DateTime<Utc>>>>;

/// 变更账本 (Change Ledger)
///
/// 记录每个条目上一次被成功处理时的远端时间戳，用来判断下一次运行是否需要重新处理。
///
/// - 三级键: org 名 -> space 名 -> 条目名。
/// - 时间戳统一规范化为 UTC、秒级精度。
/// - 缺失条目等价于零点时间 (比任何真实时间都早)。
/// - 比较在两个方向上都是严格的: 时间相等时两个判断都返回 false。
///
/// 中间层级只在写入时创建，读路径不修改结构。
#[derive(Default)]
pub struct ChangeLedger {
    entries: RwLock<Entries>,
}

impl ChangeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================
    // 1. 读写
    // ==========================================

    /// 记录条目最近一次被看到的时间 (覆盖旧值)
    pub fn record_seen(&self, path: &ScopePath, ts: DateTime<Utc>) {
        let ts = ts.trunc_subsecs(0);
        self.entries
            .write()
            .entry(path.org.clone())
            .or_default()
            .entry(path.space.clone())
            .or_default()
            .insert(path.item.clone(), ts);
        trace!(path = %path, ts = %TimeUtils::format(&ts), "[Ledger] Recorded");
    }

    /// [严格] 以 RFC 3339 字符串记录，解析失败返回 `InvalidTimestamp`
    pub fn record_update(&self, path: &ScopePath, ts: &str) -> Result<()> {
        let parsed = TimeUtils::parse(ts)?;
        self.record_seen(path, parsed);
        Ok(())
    }

    /// 已记录的时间
    pub fn get(&self, path: &ScopePath) -> Option<DateTime<Utc>> {
        self.entries
            .read()
            .get(&path.org)?
            .get(&path.space)?
            .get(&path.item)
            .copied()
    }

    /// 已记录的时间，缺失时为零点
    pub fn last_seen(&self, path: &ScopePath) -> DateTime<Utc> {
        self.get(path).unwrap_or_else(TimeUtils::zero)
    }

    // ==========================================
    // 2. 比较
    // ==========================================

    /// 远端比本地记录更新 (remote > local)
    pub fn is_newer_remotely(&self, path: &ScopePath, remote: DateTime<Utc>) -> bool {
        remote.trunc_subsecs(0) > self.last_seen(path)
    }

    /// 本地记录比远端更新 (local > remote)
    pub fn is_newer_locally(&self, path: &ScopePath, remote: DateTime<Utc>) -> bool {
        self.last_seen(path) > remote.trunc_subsecs(0)
    }

    /// [宽松] 字符串版本，无法解析的远端时间按零点处理
    pub fn is_newer_remotely_str(&self, path: &ScopePath, remote: &str) -> bool {
        self.is_newer_remotely(path, TimeUtils::parse_or_zero(remote))
    }

    /// [宽松] 字符串版本，无法解析的远端时间按零点处理
    pub fn is_newer_locally_str(&self, path: &ScopePath, remote: &str) -> bool {
        self.is_newer_locally(path, TimeUtils::parse_or_zero(remote))
    }

    /// 条目总数 (只数叶子)
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .values()
            .flat_map(|spaces| spaces.values())
            .map(|items| items.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ==========================================
    // 3. 快照与持久化
    // ==========================================

    /// 导出为持久化形态
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.entries
            .read()
            .iter()
            .map(|(org, spaces)| {
                let spaces = spaces
                    .iter()
                    .map(|(space, items)| {
                        let items = items
                            .iter()
                            .map(|(item, ts)| (item.clone(), TimeUtils::format(ts)))
                            .collect();
                        (space.clone(), items)
                    })
                    .collect();
                (org.clone(), spaces)
            })
            .collect()
    }

    /// 从持久化形态恢复，任何一个时间戳无法解析都会失败
    pub fn from_snapshot(snapshot: &LedgerSnapshot) -> Result<Self> {
        let ledger = Self::new();
        for (org, spaces) in snapshot {
            for (space, items) in spaces {
                for (item, ts) in items {
                    ledger.record_update(&ScopePath::new(org, space, item), ts)?;
                }
            }
        }
        Ok(ledger)
    }

    pub async fn load_from<S>(store: &S) -> Result<Self>
    where
        S: LedgerStore + ?Sized,
    {
        let ledger = Self::from_snapshot(&store.load().await?)?;
        trace!(entries = ledger.len(), "[Ledger] Loaded");
        Ok(ledger)
    }

    pub async fn save_to<S>(&self, store: &S) -> Result<()>
    where
        S: LedgerStore + ?Sized,
    {
        store.save(&self.snapshot()).await
    }

    /// 按配置打开账本：配置了路径就从该文件加载，否则返回空账本
    pub async fn open(cfg: &LedgerConfig) -> Result<Self> {
        match &cfg.path {
            Some(path) => Self::load_from(&JsonFileStore::new(path)).await,
            None => Ok(Self::new()),
        }
    }

    /// 按配置写回；没有配置路径时什么也不做
    pub async fn persist(&self, cfg: &LedgerConfig) -> Result<()> {
        match &cfg.path {
            Some(path) => self.save_to(&JsonFileStore::new(path)).await,
            None => Ok(()),
        }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_snapshot(&read_snapshot(reader)?)
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        write_snapshot(writer, &self.snapshot())
    }
}
