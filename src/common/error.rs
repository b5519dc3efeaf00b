use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc::error::SendError;

/// 引擎统一结果类型
///
/// 使用此别名可以简化函数签名：`fn do_something() -> Result<()>`
pub type Result<T> = std::result::Result<T, MigrateError>;

#[derive(Error, Debug)]
pub enum MigrateError {
    // ==========================================
    // 1. 配置错误 (Configuration)
    // ==========================================
    /// 配置错误
    ///
    /// - 触发场景: YAML 解析后校验不通过，例如并发上限为 0、重试预算小于重试间隔。
    /// - 处理: 检查配置文件。
    #[error("Configuration error: {0}")]
    Config(String),

    // ==========================================
    // 2. 远程调用错误 (Remote / Transport)
    // ==========================================
    /// 显式重试信号
    ///
    /// - 触发场景: 调用方判断本次远程调用值得再试一次 (例如限流)。
    #[error("retry: {0}")]
    Retry(String),

    /// 域名解析失败
    ///
    /// - 触发场景: 连接建立前 DNS 查询失败，通常是网络抖动。
    #[error("Name resolution failed for {0}")]
    Resolve(String),

    /// 控制面返回的 HTTP 错误
    ///
    /// - 5xx: 服务端暂时性故障，可重试。
    /// - 4xx: 请求本身有问题，立即失败。
    #[error("Control plane returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// 重试超时
    ///
    /// - 触发场景: 暂时性错误持续出现，总耗时超过重试预算。
    /// - 说明: `source` 保留最后一次暂时性错误。
    #[error("Timed out retrying operation after {elapsed:?}: {source}")]
    Timeout {
        elapsed: Duration,
        #[source]
        source: Box<MigrateError>,
    },

    /// 查无此实体
    ///
    /// - 触发场景: 按名称查询时远端返回 0 个或多于 1 个结果。
    /// - 处理: 调用方据此决定是"需要创建"还是放弃。
    #[error("Expected to find one {kind} named {name} in {scope}, but found {count}")]
    NotFound {
        kind: &'static str,
        name: String,
        scope: String,
        count: usize,
    },

    // ==========================================
    // 3. 流水线错误 (Pipeline)
    // ==========================================
    /// 工作集为空
    ///
    /// - 触发场景: 查询函数返回 0 个条目。
    /// - 说明: 这是终止条件，不会重试；调用方自行决定是否视为错误。
    #[error("list of work items is empty")]
    EmptyWorkSet,

    /// 内部通信通道已关闭
    ///
    /// - 触发场景: 收集器关闭后仍有查询函数尝试写入。
    #[error("Internal communication channel closed.")]
    ChannelClosed,

    /// 操作被取消
    #[error("Operation was cancelled.")]
    Cancelled,

    // ==========================================
    // 4. 数据与 IO 错误 (Data & IO)
    // ==========================================
    /// 时间戳格式非法 (要求 RFC 3339)
    #[error("Invalid timestamp '{value}': {source}")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// 通用 IO 错误
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 序列化/反序列化失败
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML 配置解析失败
    #[error("YAML parse failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // ==========================================
    // 5. 业务错误 (Business)
    // ==========================================
    /// 调用方代码抛出的其他错误 (Anyhow 包装)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 输出通道的接收端被 Drop
impl<T> From<SendError<T>> for MigrateError {
    fn from(_: SendError<T>) -> Self {
        MigrateError::ChannelClosed
    }
}

impl MigrateError {
    /// 构造一个 5xx/4xx HTTP 错误
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        MigrateError::Http {
            status,
            message: message.into(),
        }
    }

    /// 判断该错误是否值得重试 (Retryable)
    ///
    /// - 返回 `true`: 域名解析失败、显式重试信号、服务端 5xx。
    /// - 返回 `false`: 其余一切，包括超时本身 (超时已经是重试耗尽的结果)。
    pub fn is_retryable(&self) -> bool {
        match self {
            MigrateError::Retry(_) => true,
            MigrateError::Resolve(_) => true,
            MigrateError::Http { status, .. } => (500..=599).contains(status),

            MigrateError::Timeout { .. } => false,
            MigrateError::NotFound { .. } => false,
            MigrateError::EmptyWorkSet => false,
            MigrateError::Cancelled => false,

            // 其他未覆盖的默认不重试，防止死循环
            _ => false,
        }
    }

    /// 是否为"查无此实体"
    ///
    /// 调用方用它区分 "需要创建" 和 "重试/放弃"。
    pub fn is_not_found(&self) -> bool {
        matches!(self, MigrateError::NotFound { .. })
    }

    /// 是否为重试超时
    pub fn is_timeout(&self) -> bool {
        matches!(self, MigrateError::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_retryable_client_errors_are_not() {
        assert!(MigrateError::http(503, "unavailable").is_retryable());
        assert!(MigrateError::http(500, "boom").is_retryable());
        assert!(!MigrateError::http(404, "missing").is_retryable());
        assert!(!MigrateError::http(429, "slow down").is_retryable());
    }

    #[test]
    fn resolve_and_retry_sentinel_are_retryable() {
        assert!(MigrateError::Resolve("api.example.com".into()).is_retryable());
        assert!(MigrateError::Retry("rate limited".into()).is_retryable());
    }

    #[test]
    fn timeout_wraps_cause_and_is_terminal() {
        let err = MigrateError::Timeout {
            elapsed: Duration::from_millis(100),
            source: Box::new(MigrateError::http(502, "bad gateway")),
        };
        assert!(!err.is_retryable());
        assert!(err.is_timeout());
        assert!(err.to_string().contains("bad gateway"));
    }

    #[test]
    fn not_found_is_distinguishable() {
        let err = MigrateError::NotFound {
            kind: "app",
            name: "web".into(),
            scope: "space-1".into(),
            count: 0,
        };
        assert!(err.is_not_found());
        assert!(!err.is_retryable());
        assert_eq!(
            err.to_string(),
            "Expected to find one app named web in space-1, but found 0"
        );
    }
}
