use std::sync::Arc;

use ahash::HashMap;
use parking_lot::RwLock;
use tracing::trace;

use crate::{
    common::{Entity, EntitySource, MigrateError, Result},
    transport::RetryingTransport,
};

/// 缓存索引
///
/// - 主索引: id -> 实体
/// - 二级索引: name -> scope -> id
///
/// 两个索引总是在同一把写锁内一起更新，因此二级索引里能找到的 id，主索引里一定也有。
struct CacheIndex<E> {
    by_id: HashMap<String, E>,
    by_name: HashMap<String, HashMap<String, String>>,
}

impl<E: Entity> CacheIndex<E> {
    fn new() -> Self {
        Self {
            by_id: HashMap::default(),
            by_name: HashMap::default(),
        }
    }

    fn lookup_name(&self, name: &str, scope: &str) -> Option<E> {
        let id = self.by_name.get(name)?.get(scope)?;
        self.by_id.get(id).cloned()
    }

    fn link_name(&mut self, name: &str, scope: &str, id: &str) {
        self.by_name
            .entry(name.to_string())
            .or_default()
            .insert(scope.to_string(), id.to_string());
    }

    /// 删除所有指向 `id` 的名称键
    fn unlink_id(&mut self, id: &str) {
        self.by_name.retain(|_, scopes| {
            scopes.retain(|_, linked| linked != id);
            !scopes.is_empty()
        });
    }

    fn insert(&mut self, entity: E) {
        let id = entity.id().to_string();
        // 改名或换了作用域：旧名称不能再解析到这个 id
        let moved = self
            .by_id
            .get(&id)
            .is_some_and(|old| old.name() != entity.name() || old.scope() != entity.scope());
        if moved {
            self.unlink_id(&id);
        }
        self.link_name(entity.name(), entity.scope(), &id);
        self.by_id.insert(id, entity);
    }
}

/// 读穿透实体缓存 (Read-Through Cache)
///
/// - 命中: 读锁内直接返回副本。
/// - 未命中: 经 `RetryingTransport` 远程获取，再在写锁内同时写入两个索引。
/// - 不过期、不淘汰，只会被 `put` 显式覆盖。
///
/// **注意**: "检查未命中 -> 远程获取 -> 写入" 这三步不是原子的。
/// 两个并发调用同时未命中时会各自发起远程请求，最后写入的覆盖前者。
/// 在一次运行内实体被视为不可变的参考数据，所以两次结果等价，这里不做单飞合并。
pub struct EntityCache<E: Entity> {
    source: Arc<dyn EntitySource<E>>,
    transport: RetryingTransport,
    index: RwLock<CacheIndex<E>>,
}

impl<E: Entity> EntityCache<E> {
    pub fn new<S>(source: S, transport: RetryingTransport) -> Self
    where
        S: EntitySource<E>,
    {
        Self {
            source: Arc::new(source),
            transport,
            index: RwLock::new(CacheIndex::new()),
        }
    }

    /// 按名称 + 父级作用域获取
    ///
    /// 远端返回的匹配数不是恰好 1 个时，返回 `MigrateError::NotFound`。
    pub async fn get_by_name(&self, name: &str, scope: &str) -> Result<E> {
        if let Some(hit) = self.index.read().lookup_name(name, scope) {
            trace!(kind = E::KIND, name, scope, "[Cache] Name hit");
            return Ok(hit);
        }

        let source = &self.source;
        let mut found = self
            .transport
            .call(|| source.find_by_name(name, scope))
            .await?;

        let entity = match (found.len(), found.pop()) {
            (1, Some(entity)) => entity,
            (count, _) => {
                return Err(MigrateError::NotFound {
                    kind: E::KIND,
                    name: name.to_string(),
                    scope: scope.to_string(),
                    count,
                });
            }
        };

        let mut index = self.index.write();
        index.insert(entity.clone());
        // 调用方给的作用域写法可能与实体自身不同，两个键都指向同一个 id
        index.link_name(name, scope, entity.id());
        trace!(kind = E::KIND, name, scope, id = entity.id(), "[Cache] Name miss, stored");
        Ok(entity)
    }

    /// 按稳定标识获取
    ///
    /// 远端确认不存在时返回 `MigrateError::NotFound` (count 为 0)。
    pub async fn get_by_id(&self, id: &str) -> Result<E> {
        if let Some(hit) = self.get_cached(id) {
            trace!(kind = E::KIND, id, "[Cache] Id hit");
            return Ok(hit);
        }

        let source = &self.source;
        let entity = self
            .transport
            .call(|| source.find_by_id(id))
            .await?
            .ok_or_else(|| MigrateError::NotFound {
                kind: E::KIND,
                name: id.to_string(),
                scope: "any scope".to_string(),
                count: 0,
            })?;

        self.index.write().insert(entity.clone());
        trace!(kind = E::KIND, id, "[Cache] Id miss, stored");
        Ok(entity)
    }

    /// 只查本地，不发远程请求
    pub fn get_cached(&self, id: &str) -> Option<E> {
        self.index.read().by_id.get(id).cloned()
    }

    /// 显式写入 (例如 create/update 返回了更新鲜的副本)
    pub fn put(&self, entity: E) -> E {
        self.index.write().insert(entity.clone());
        entity
    }

    /// 主索引中的实体数量
    pub fn len(&self) -> usize {
        self.index.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 清空两个索引
    pub fn clear(&self) {
        *self.index.write() = CacheIndex::new();
    }
}
