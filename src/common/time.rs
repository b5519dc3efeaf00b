use chrono::{DateTime, SecondsFormat, Utc};

use crate::common::error::{MigrateError, Result};

/// 全局统一的时间戳工具
///
/// 控制面与账本之间只交换 RFC 3339 字符串，这里负责解析与规范化。
pub struct TimeUtils;

impl TimeUtils {
    /// "从未见过" 对应的零点时间，比任何真实时间都早
    pub fn zero() -> DateTime<Utc> {
        DateTime::<Utc>::MIN_UTC
    }

    /// [严格] 解析 RFC 3339，失败时返回 `InvalidTimestamp`
    pub fn parse(value: &str) -> Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|source| MigrateError::InvalidTimestamp {
                value: value.to_string(),
                source,
            })
    }

    /// [宽松] 解析失败时退化为零点时间
    pub fn parse_or_zero(value: &str) -> DateTime<Utc> {
        Self::parse(value).unwrap_or_else(|_| Self::zero())
    }

    /// 规范化为 UTC、秒级精度的 RFC 3339 字符串 (例如 `2021-06-22T20:18:36Z`)
    pub fn format(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}
