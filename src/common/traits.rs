use async_trait::async_trait;
use std::{future::Future, sync::Arc};

use crate::common::error::Result;
use crate::common::model::{App, Domain, Org, SharedDomain, Space, Stack};

// ==========================================
// 1. 条目处理接口 (ItemProcessor)
// ==========================================

/// 单条目处理接口
///
/// # 泛型说明
/// - `T`: 工作条目类型。Worker 会在调用前克隆一份，用于组装 `ProcessOutcome`。
///
/// # 返回值
/// - `Ok(())`: 条目处理成功。
/// - `Err(e)`: 条目失败。失败只影响这一条，不会中断整个 Worker 池。
#[async_trait]
pub trait ItemProcessor<T>: Send + Sync + 'static
where
    T: Send + 'static,
{
    async fn process(&self, item: T) -> Result<()>;
}

// 让普通异步闭包直接作为处理函数
#[async_trait]
impl<T, F, Fut> ItemProcessor<T> for F
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn process(&self, item: T) -> Result<()> {
        (self)(item).await
    }
}

// ==========================================
// 2. 实体与远端数据源 (Entity / EntitySource)
// ==========================================

/// 可被缓存的控制面实体
///
/// - `id`: 稳定标识 (主索引)。
/// - `name` + `scope`: 人类可读的名字和父级作用域 ID (二级索引)。顶层实体的 scope 为空串。
pub trait Entity: Clone + Send + Sync + 'static {
    /// 实体种类，用于日志和 NotFound 错误
    const KIND: &'static str;

    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn scope(&self) -> &str;
}

/// 实体的远端数据源
///
/// **职责**: 真正发起 HTTP 调用。错误需要映射成 `MigrateError`，
/// 重试判定只依赖 `MigrateError::is_retryable`。
#[async_trait]
pub trait EntitySource<E: Entity>: Send + Sync + 'static {
    /// 按名称在作用域内查询
    ///
    /// 返回全部匹配项；基数检查 (恰好一个) 由缓存负责。
    async fn find_by_name(&self, name: &str, scope: &str) -> Result<Vec<E>>;

    /// 按稳定标识获取
    ///
    /// 远端明确回答"没有这个 id"时返回 `Ok(None)`，由缓存转换成 `NotFound`。
    async fn find_by_id(&self, id: &str) -> Result<Option<E>>;
}

// 让 Arc<Source> 自动实现 EntitySource
#[async_trait]
impl<E, S> EntitySource<E> for Arc<S>
where
    E: Entity,
    S: EntitySource<E> + ?Sized,
{
    async fn find_by_name(&self, name: &str, scope: &str) -> Result<Vec<E>> {
        (**self).find_by_name(name, scope).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<E>> {
        (**self).find_by_id(id).await
    }
}

impl Entity for Org {
    const KIND: &'static str = "org";

    fn id(&self) -> &str {
        &self.guid
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn scope(&self) -> &str {
        ""
    }
}

impl Entity for Space {
    const KIND: &'static str = "space";

    fn id(&self) -> &str {
        &self.guid
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn scope(&self) -> &str {
        &self.org_guid
    }
}

impl Entity for App {
    const KIND: &'static str = "app";

    fn id(&self) -> &str {
        &self.guid
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn scope(&self) -> &str {
        &self.space_guid
    }
}

impl Entity for Stack {
    const KIND: &'static str = "stack";

    fn id(&self) -> &str {
        &self.guid
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn scope(&self) -> &str {
        ""
    }
}

impl Entity for Domain {
    const KIND: &'static str = "domain";

    fn id(&self) -> &str {
        &self.guid
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn scope(&self) -> &str {
        ""
    }
}

impl Entity for SharedDomain {
    const KIND: &'static str = "shared domain";

    fn id(&self) -> &str {
        &self.guid
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn scope(&self) -> &str {
        ""
    }
}
