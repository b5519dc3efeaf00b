#![allow(dead_code)]

use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use ferry::{
    App, Domain, Entity, EntitySource, MigrateError, Org, Result, RetryingTransport, ScopePath,
    Scoped, SharedDomain, Space, Stack, policy::FixedPause,
};
use parking_lot::Mutex;

/// 内存里的假控制面
///
/// - 每种实体一张表，按 name + scope 查询。
/// - 记录每种调用的次数，用来断言缓存是否命中。
/// - `fail_next` 让接下来的 N 次调用返回 503。
#[derive(Default)]
pub struct FakeControlPlane {
    pub orgs: Mutex<Vec<Org>>,
    pub spaces: Mutex<Vec<Space>>,
    pub apps: Mutex<Vec<App>>,
    pub stacks: Mutex<Vec<Stack>>,
    pub domains: Mutex<Vec<Domain>>,
    pub shared_domains: Mutex<Vec<SharedDomain>>,
    pub name_calls: AtomicUsize,
    pub id_calls: AtomicUsize,
    pub fail_next: AtomicUsize,
    pub latency: Mutex<Option<Duration>>,
}

impl FakeControlPlane {
    /// 一个 org、两个 space、每个 space 三个 app、两个 stack、一个私有域名、一个共享域名
    pub fn seeded() -> Self {
        let cp = Self::default();
        cp.orgs.lock().push(Org {
            guid: "org-1".into(),
            name: "acme".into(),
        });
        for (i, space) in ["dev", "prod"].iter().enumerate() {
            let space_guid = format!("space-{i}");
            cp.spaces.lock().push(Space {
                guid: space_guid.clone(),
                name: space.to_string(),
                org_guid: "org-1".into(),
            });
            for j in 0..3 {
                cp.apps.lock().push(App {
                    guid: format!("app-{i}-{j}"),
                    name: format!("app-{j}"),
                    space_guid: space_guid.clone(),
                    updated_at: format!("2021-06-2{j}T10:00:00Z"),
                    stack_guid: Some("stack-1".into()),
                });
            }
        }
        cp.stacks.lock().extend([
            Stack {
                guid: "stack-1".into(),
                name: "cflinuxfs3".into(),
            },
            Stack {
                guid: "stack-2".into(),
                name: "cflinuxfs4".into(),
            },
        ]);
        cp.domains.lock().push(Domain {
            guid: "domain-1".into(),
            name: "apps.acme.internal".into(),
        });
        cp.shared_domains.lock().push(SharedDomain {
            guid: "shared-1".into(),
            name: "cfapps.io".into(),
        });
        cp
    }

    pub fn with_latency(self, latency: Duration) -> Self {
        *self.latency.lock() = Some(latency);
        self
    }

    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    pub fn name_calls(&self) -> usize {
        self.name_calls.load(Ordering::SeqCst)
    }

    pub fn id_calls(&self) -> usize {
        self.id_calls.load(Ordering::SeqCst)
    }

    async fn enter(&self) -> Result<()> {
        let latency = *self.latency.lock();
        if let Some(d) = latency {
            tokio::time::sleep(d).await;
        }
        let failed = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(MigrateError::http(503, "service unavailable"));
        }
        Ok(())
    }

    async fn by_name<E: Entity>(&self, table: &Mutex<Vec<E>>, name: &str, scope: &str) -> Result<Vec<E>> {
        self.name_calls.fetch_add(1, Ordering::SeqCst);
        self.enter().await?;
        Ok(table
            .lock()
            .iter()
            .filter(|e| e.name() == name && e.scope() == scope)
            .cloned()
            .collect())
    }

    async fn by_id<E: Entity>(&self, table: &Mutex<Vec<E>>, id: &str) -> Result<Option<E>> {
        self.id_calls.fetch_add(1, Ordering::SeqCst);
        self.enter().await?;
        Ok(table.lock().iter().find(|e| e.id() == id).cloned())
    }
}

#[async_trait]
impl EntitySource<Org> for FakeControlPlane {
    async fn find_by_name(&self, name: &str, scope: &str) -> Result<Vec<Org>> {
        self.by_name(&self.orgs, name, scope).await
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<Org>> {
        self.by_id(&self.orgs, id).await
    }
}

#[async_trait]
impl EntitySource<Space> for FakeControlPlane {
    async fn find_by_name(&self, name: &str, scope: &str) -> Result<Vec<Space>> {
        self.by_name(&self.spaces, name, scope).await
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<Space>> {
        self.by_id(&self.spaces, id).await
    }
}

#[async_trait]
impl EntitySource<App> for FakeControlPlane {
    async fn find_by_name(&self, name: &str, scope: &str) -> Result<Vec<App>> {
        self.by_name(&self.apps, name, scope).await
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<App>> {
        self.by_id(&self.apps, id).await
    }
}

#[async_trait]
impl EntitySource<Stack> for FakeControlPlane {
    async fn find_by_name(&self, name: &str, scope: &str) -> Result<Vec<Stack>> {
        self.by_name(&self.stacks, name, scope).await
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<Stack>> {
        self.by_id(&self.stacks, id).await
    }
}

#[async_trait]
impl EntitySource<Domain> for FakeControlPlane {
    async fn find_by_name(&self, name: &str, scope: &str) -> Result<Vec<Domain>> {
        self.by_name(&self.domains, name, scope).await
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<Domain>> {
        self.by_id(&self.domains, id).await
    }
}

#[async_trait]
impl EntitySource<SharedDomain> for FakeControlPlane {
    async fn find_by_name(&self, name: &str, scope: &str) -> Result<Vec<SharedDomain>> {
        self.by_name(&self.shared_domains, name, scope).await
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<SharedDomain>> {
        self.by_id(&self.shared_domains, id).await
    }
}

/// 快速重试的传输层 (1ms 间隔，200ms 预算)
pub fn fast_transport() -> RetryingTransport {
    RetryingTransport::new(FixedPause::from_millis(1), Duration::from_millis(200))
}

/// 测试用工作条目：定位到 org/space 下的一个 app
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AppRef {
    pub org: String,
    pub space: String,
    pub app: String,
}

impl AppRef {
    pub fn new(org: &str, space: &str, app: &str) -> Self {
        Self {
            org: org.into(),
            space: space.into(),
            app: app.into(),
        }
    }
}

impl Scoped for AppRef {
    fn scope_path(&self) -> ScopePath {
        ScopePath::new(&self.org, &self.space, &self.app)
    }
}
