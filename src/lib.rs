// 1. 基础模块
pub mod common;
pub mod telemetry;

// 2. 远程调用与缓存
pub mod cache;
pub mod policy;
pub mod transport;

// 3. 增量账本与持久化
pub mod ledger;
pub mod persistence;

// 4. 查询处理与汇总
pub mod driver;
pub mod report;

pub use cache::{Catalog, EntityCache};
pub use common::{
    App, Domain, EngineConfig, Entity, EntitySource, ItemProcessor, MigrateError, Org,
    ProcessOutcome, QueryStats, Result, ScopePath, Scoped, SharedDomain, Space, Stack, WorkItem,
};
pub use driver::{OutcomeStream, QueryProcessor, QueryProcessorBuilder, ResultsCollector};
pub use ledger::ChangeLedger;
pub use report::Summary;
pub use transport::RetryingTransport;
