use std::sync::Arc;

use tracing::trace;

use crate::{
    cache::EntityCache,
    common::{App, Domain, EntitySource, Org, Result, SharedDomain, Space, Stack},
    transport::RetryingTransport,
};

/// 控制面实体目录
///
/// 每种实体一个独立缓存，共用同一个客户端和同一个重试传输层。
/// 通过构造函数注入，而不是进程级全局变量。
pub struct Catalog {
    orgs: EntityCache<Org>,
    spaces: EntityCache<Space>,
    apps: EntityCache<App>,
    stacks: EntityCache<Stack>,
    domains: EntityCache<Domain>,
    shared_domains: EntityCache<SharedDomain>,
}

impl Catalog {
    pub fn new<C>(client: Arc<C>, transport: RetryingTransport) -> Self
    where
        C: EntitySource<Org>
            + EntitySource<Space>
            + EntitySource<App>
            + EntitySource<Stack>
            + EntitySource<Domain>
            + EntitySource<SharedDomain>,
    {
        Self {
            orgs: EntityCache::new(client.clone(), transport.clone()),
            spaces: EntityCache::new(client.clone(), transport.clone()),
            apps: EntityCache::new(client.clone(), transport.clone()),
            stacks: EntityCache::new(client.clone(), transport.clone()),
            domains: EntityCache::new(client.clone(), transport.clone()),
            shared_domains: EntityCache::new(client, transport),
        }
    }

    pub fn orgs(&self) -> &EntityCache<Org> {
        &self.orgs
    }

    pub fn spaces(&self) -> &EntityCache<Space> {
        &self.spaces
    }

    pub fn apps(&self) -> &EntityCache<App> {
        &self.apps
    }

    pub fn stacks(&self) -> &EntityCache<Stack> {
        &self.stacks
    }

    pub fn domains(&self) -> &EntityCache<Domain> {
        &self.domains
    }

    pub fn shared_domains(&self) -> &EntityCache<SharedDomain> {
        &self.shared_domains
    }

    // ==========================================
    // 便捷查询
    // ==========================================

    pub async fn org_by_name(&self, name: &str) -> Result<Org> {
        self.orgs.get_by_name(name, "").await
    }

    pub async fn space_by_name(&self, name: &str, org_guid: &str) -> Result<Space> {
        self.spaces.get_by_name(name, org_guid).await
    }

    pub async fn app_by_name(&self, name: &str, space_guid: &str) -> Result<App> {
        self.apps.get_by_name(name, space_guid).await
    }

    /// 按名称解析 org -> space -> app 整条链路
    pub async fn resolve_app(&self, org: &str, space: &str, app: &str) -> Result<App> {
        let org = self.org_by_name(org).await?;
        let space = self.space_by_name(space, &org.guid).await?;
        self.app_by_name(app, &space.guid).await
    }

    pub async fn stack_guid_by_name(&self, name: &str) -> Result<String> {
        Ok(self.stacks.get_by_name(name, "").await?.guid)
    }

    pub async fn stack_name_by_guid(&self, guid: &str) -> Result<String> {
        Ok(self.stacks.get_by_id(guid).await?.name)
    }

    /// 按名称解析域名 GUID：先查私有域名，查不到再查共享域名
    ///
    /// - 私有查询失败 (包括超时) 都会回退到共享域名。
    /// - 共享域名也不存在时返回私有查询的错误；共享查询的其他错误原样返回。
    pub async fn domain_guid_by_name(&self, name: &str) -> Result<String> {
        let private_err = match self.domains.get_by_name(name, "").await {
            Ok(domain) => return Ok(domain.guid),
            Err(e) => e,
        };
        trace!(name, error = %private_err, "[Catalog] No private domain, trying shared");

        match self.shared_domains.get_by_name(name, "").await {
            Ok(shared) => Ok(shared.guid),
            Err(e) if e.is_not_found() => Err(private_err),
            Err(e) => Err(e),
        }
    }

    /// 清空所有缓存
    pub fn clear(&self) {
        self.orgs.clear();
        self.spaces.clear();
        self.apps.clear();
        self.stacks.clear();
        self.domains.clear();
        self.shared_domains.clear();
    }

    /// 所有缓存中的实体总数
    pub fn len(&self) -> usize {
        self.orgs.len()
            + self.spaces.len()
            + self.apps.len()
            + self.stacks.len()
            + self.domains.len()
            + self.shared_domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
