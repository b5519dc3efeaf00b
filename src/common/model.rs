use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

use crate::common::error::MigrateError;

// ==========================================
// 1. 作用域路径 (ScopePath)
// ==========================================

/// 三段式作用域路径: org / space / item
///
/// - 账本 (Ledger) 与汇总 (Summary) 都以它为键。
/// - 排序按 org -> space -> item 逐级字典序，与报表排序一致。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScopePath {
    pub org: String,
    pub space: String,
    pub item: String,
}

impl ScopePath {
    pub fn new(org: impl Into<String>, space: impl Into<String>, item: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            space: space.into(),
            item: item.into(),
        }
    }

    /// 叶子名为空的路径视为畸形键
    pub fn has_leaf(&self) -> bool {
        !self.item.is_empty()
    }
}

impl fmt::Display for ScopePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.org, self.space, self.item)
    }
}

/// 能定位自身作用域的工作条目
///
/// 实现后可以直接把 `ProcessOutcome` 交给 `Summary::record`。
pub trait Scoped {
    fn scope_path(&self) -> ScopePath;
}

// ==========================================
// 2. 工作条目与处理结果
// ==========================================

/// 工作条目
///
/// 一个标识加任意载荷，由查询产生、由处理函数消费，不做持久化。
/// 载荷能定位作用域时，条目本身也能直接交给 `Summary::record`。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkItem<P = serde_json::Value> {
    pub id: String,
    pub payload: P,
}

impl<P> WorkItem<P> {
    pub fn new(id: impl Into<String>, payload: P) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }
}

impl<P: Scoped> Scoped for WorkItem<P> {
    fn scope_path(&self) -> ScopePath {
        self.payload.scope_path()
    }
}

/// 单个条目的处理结果
///
/// 每个进入流水线的条目恰好产出一次。
#[derive(Debug)]
pub struct ProcessOutcome<T> {
    pub item: T,
    pub error: Option<MigrateError>,
}

impl<T> ProcessOutcome<T> {
    pub fn success(item: T) -> Self {
        Self { item, error: None }
    }

    pub fn failure(item: T, error: MigrateError) -> Self {
        Self {
            item,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// 一次查询运行的统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryStats {
    /// 调用查询函数的次数 (含最后一次空页)
    pub pages: usize,
    /// 进入收集器的条目总数
    pub items: usize,
    /// 累计启动的 Worker 数 (每批 `min(容量, 本批条目数)`)
    pub workers: usize,
    /// 从第一次查询到最后一个 Worker 退出的耗时
    pub elapsed: Duration,
}

// ==========================================
// 3. 控制面实体 (Entities)
// ==========================================

/// 组织
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Org {
    pub guid: String,
    pub name: String,
}

/// 空间 (属于某个组织)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    pub guid: String,
    pub name: String,
    pub org_guid: String,
}

/// 应用 (属于某个空间)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct App {
    pub guid: String,
    pub name: String,
    pub space_guid: String,
    /// 远端最后更新时间 (RFC 3339)
    pub updated_at: String,
    #[serde(default)]
    pub stack_guid: Option<String>,
}

/// 运行栈
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    pub guid: String,
    pub name: String,
}

/// 私有域名 (归属于某个组织，但按全局名称查询)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub guid: String,
    pub name: String,
}

/// 共享域名 (平台级，所有组织可用)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedDomain {
    pub guid: String,
    pub name: String,
}
