use std::{path::Path, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::common::error::{MigrateError, Result};

// ==========================================
// 1. 并发配置 (ProcessorConfig)
// ==========================================
/// 查询处理器的并发控制配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// 并发上限 (同时也是每页条目数)
    ///
    /// - 说明: 收集器缓冲区容量，以及每批最多启动的 Worker 数量。
    /// - 默认值: 5
    /// - 影响: 调大会让更多远程调用同时在途，但也更容易触发控制面限流。
    pub concurrency_limit: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: 5,
        }
    }
}

// ==========================================
// 2. 重试配置 (RetryConfig)
// ==========================================
/// 远程调用重试配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// 重试间隔 (毫秒)
    ///
    /// - 说明: 固定间隔，不带抖动。
    /// - 默认值: 3000 ms
    pub pause_ms: u64,

    /// 重试总预算 (毫秒)
    ///
    /// - 说明: 从第一次调用开始计时，超过后返回 Timeout。
    /// - 默认值: 60,000 ms (1分钟)
    pub timeout_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            pause_ms: 3_000,
            timeout_ms: 60_000,
        }
    }
}

impl RetryConfig {
    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// ==========================================
// 3. 增量账本配置 (LedgerConfig)
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// 账本 JSON 文件路径
    ///
    /// - None: 不做增量判断，每次全量处理。
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// ==========================================
// 4. 总配置入口 (EngineConfig)
// ==========================================

/// 引擎总配置
///
/// 使用分层结构组织配置项。支持 `serde` 序列化，可直接从 YAML 加载。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 并发
    #[serde(default)]
    pub processor: ProcessorConfig,

    /// 重试
    #[serde(default)]
    pub retry: RetryConfig,

    /// 增量账本
    #[serde(default)]
    pub ledger: LedgerConfig,
}

impl EngineConfig {
    /// 测试用配置：重试间隔 3ms，预算 100ms
    pub fn new_test() -> Self {
        let mut cfg = Self::default();
        cfg.retry.pause_ms = 3;
        cfg.retry.timeout_ms = 100;
        cfg
    }

    /// 从 YAML 字符串解析并校验
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let cfg: EngineConfig = serde_yaml::from_str(content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// 从 YAML 文件解析并校验
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// 校验逻辑上不合法的组合
    pub fn validate(&self) -> Result<()> {
        if self.processor.concurrency_limit == 0 {
            return Err(MigrateError::Config(
                "processor.concurrency_limit must be at least 1".into(),
            ));
        }
        if self.retry.timeout_ms < self.retry.pause_ms {
            return Err(MigrateError::Config(format!(
                "retry.timeout_ms ({}) must not be shorter than retry.pause_ms ({})",
                self.retry.timeout_ms, self.retry.pause_ms
            )));
        }
        Ok(())
    }
}
