pub mod config;
pub mod error;
pub mod model;
pub mod time;
pub mod traits;
pub(crate) mod utils;

// 导出配置
pub use config::{EngineConfig, LedgerConfig, ProcessorConfig, RetryConfig};

// 导出错误类型
pub use error::{MigrateError, Result};

// 导出核心模型
pub use model::{
    App, Domain, Org, ProcessOutcome, QueryStats, ScopePath, Scoped, SharedDomain, Space, Stack,
    WorkItem,
};

// 导出用户需实现的 Trait
pub use traits::{Entity, EntitySource, ItemProcessor};

pub use time::TimeUtils;
// 内部工具的快捷访问
pub(crate) use utils::{new_run_id, panic_message};
