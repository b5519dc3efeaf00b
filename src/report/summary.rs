use std::{
    collections::BTreeMap,
    fmt, io,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use parking_lot::{Mutex, RwLock};

use crate::common::{ProcessOutcome, Result, ScopePath, Scoped};

const SUCCESSFUL: &str = "successful";

/// 表格列的最小宽度与列间距
const MIN_WIDTH: usize = 10;
const PADDING: usize = 2;

/// 单个条目的最终结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemResult {
    pub path: ScopePath,
    /// `"successful"` 或错误信息
    pub message: String,
}

impl ItemResult {
    pub fn is_success(&self) -> bool {
        self.message == SUCCESSFUL
    }
}

/// 运行结果汇总 (Result Aggregator)
///
/// - 成功/失败计数是两个独立的原子计数器。
/// - 结果表用自己的锁，与计数器互不影响。
/// - 叶子名为空的路径直接忽略。
///
/// 同一条目被记录两次时，结果表里只保留后一次，但两次都会计数。
#[derive(Default)]
pub struct Summary {
    successes: AtomicUsize,
    failures: AtomicUsize,
    results: RwLock<BTreeMap<ScopePath, String>>,
    duration: Mutex<Duration>,
}

impl Summary {
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================
    // 1. 记录
    // ==========================================

    pub fn add_success(&self, path: &ScopePath) {
        if !path.has_leaf() {
            return;
        }
        self.successes.fetch_add(1, Ordering::Relaxed);
        self.results.write().insert(path.clone(), SUCCESSFUL.to_string());
    }

    pub fn add_failure(&self, path: &ScopePath, error: impl fmt::Display) {
        if !path.has_leaf() {
            return;
        }
        self.failures.fetch_add(1, Ordering::Relaxed);
        self.results.write().insert(path.clone(), error.to_string());
    }

    /// 直接记录一个处理结果
    pub fn record<T: Scoped>(&self, outcome: &ProcessOutcome<T>) {
        let path = outcome.item.scope_path();
        match &outcome.error {
            None => self.add_success(&path),
            Some(err) => self.add_failure(&path, err),
        }
    }

    pub fn set_duration(&self, duration: Duration) {
        *self.duration.lock() = duration;
    }

    // ==========================================
    // 2. 查询
    // ==========================================

    pub fn success_count(&self) -> usize {
        self.successes.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn duration(&self) -> Duration {
        *self.duration.lock()
    }

    /// 按 org -> space -> 条目名排序的结果列表
    pub fn results(&self) -> Vec<ItemResult> {
        self.results
            .read()
            .iter()
            .map(|(path, message)| ItemResult {
                path: path.clone(),
                message: message.clone(),
            })
            .collect()
    }

    // ==========================================
    // 3. 报表
    // ==========================================

    /// 输出人类可读的报表
    ///
    /// ```text
    /// Migration took 1.5s
    /// Summary: 3 successes, 1 errors.
    /// Org       Space     App               Result
    /// blue      dev       my-good-app       successful
    /// ```
    ///
    /// 结果列只显示错误信息第一个 `:` 之前的部分。
    pub fn display<W: io::Write>(&self, mut writer: W) -> Result<()> {
        writeln!(writer, "Migration took {}", format_duration(self.duration()))?;
        writeln!(
            writer,
            "Summary: {} successes, {} errors.",
            self.success_count(),
            self.failure_count()
        )?;

        let mut rows = vec![["Org", "Space", "App", "Result"].map(String::from)];
        for r in self.results() {
            let short = r.message.split(':').next().unwrap_or_default().to_string();
            rows.push([r.path.org, r.path.space, r.path.item, short]);
        }

        let mut widths = [MIN_WIDTH; 3];
        for row in &rows {
            for (w, cell) in widths.iter_mut().zip(row.iter()) {
                *w = (*w).max(cell.chars().count() + PADDING);
            }
        }

        for [org, space, item, result] in &rows {
            writeln!(
                writer,
                "{org:<w0$}{space:<w1$}{item:<w2$}{result}",
                w0 = widths[0],
                w1 = widths[1],
                w2 = widths[2],
            )?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// 与控制面工具一致的时长格式
///
/// - 不足一秒: `250ms`、`1.5µs`，零显示为 `0s`。
/// - 一秒以上: `1.5s`、`1m30s`、`2h0m5s`，秒的小数部分去掉末尾的 0。
fn format_duration(d: Duration) -> String {
    if d.is_zero() {
        return "0s".to_string();
    }
    if d < Duration::from_secs(1) {
        return format!("{d:?}");
    }

    let total = d.as_secs();
    let (hours, minutes, secs) = (total / 3600, total / 60 % 60, total % 60);
    let nanos = d.subsec_nanos();
    let seconds = if nanos == 0 {
        secs.to_string()
    } else {
        let frac = format!("{nanos:09}");
        format!("{secs}.{}", frac.trim_end_matches('0'))
    };

    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::MigrateError;
    use std::sync::Arc;

    #[test]
    fn empty_leaf_is_ignored() {
        let s = Summary::new();
        s.add_success(&ScopePath::new("org", "space", ""));
        s.add_failure(&ScopePath::new("org", "space", ""), "boom");
        assert_eq!(s.success_count(), 0);
        assert_eq!(s.failure_count(), 0);
        assert!(s.results().is_empty());
    }

    #[test]
    fn concurrent_successes_are_all_counted_and_sorted() {
        let s = Arc::new(Summary::new());
        let handles: Vec<_> = (0..50)
            .map(|i| {
                let s = s.clone();
                std::thread::spawn(move || {
                    s.add_success(&ScopePath::new("org", "space", format!("app-{i:02}")));
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(s.success_count(), 50);
        assert_eq!(s.failure_count(), 0);
        let results = s.results();
        assert_eq!(results.len(), 50);
        assert!(results.windows(2).all(|w| w[0].path < w[1].path));
        assert!(results.iter().all(ItemResult::is_success));
    }

    #[test]
    fn record_routes_outcome_by_error() {
        struct App(&'static str);
        impl Scoped for App {
            fn scope_path(&self) -> ScopePath {
                ScopePath::new("o", "s", self.0)
            }
        }

        let s = Summary::new();
        s.record(&ProcessOutcome::success(App("ok")));
        s.record(&ProcessOutcome::failure(
            App("bad"),
            MigrateError::http(409, "conflict"),
        ));

        assert_eq!(s.success_count(), 1);
        assert_eq!(s.failure_count(), 1);
        let results = s.results();
        assert_eq!(results[0].path.item, "bad");
        assert!(results[0].message.contains("409"));
    }

    #[test]
    fn display_renders_aligned_table() {
        let s = Summary::new();
        s.add_success(&ScopePath::new("blue", "dev", "my-good-app"));
        s.add_success(&ScopePath::new("blue", "dev", "another-good-app"));
        s.add_success(&ScopePath::new("blue", "stage", "my-good-app"));
        s.add_failure(
            &ScopePath::new("red", "dev", "my-bad-app"),
            "this is an example error: with detail",
        );

        let mut out = Vec::new();
        s.display(&mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Migration took 0s\n\
             Summary: 3 successes, 1 errors.\n\
             Org       Space     App               Result\n\
             blue      dev       another-good-app  successful\n\
             blue      dev       my-good-app       successful\n\
             blue      stage     my-good-app       successful\n\
             red       dev       my-bad-app        this is an example error\n"
        );
    }

    #[test]
    fn durations_use_hour_minute_second_units() {
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m30s");
        assert_eq!(format_duration(Duration::from_millis(60_500)), "1m0.5s");
        assert_eq!(format_duration(Duration::from_secs(3600)), "1h0m0s");
        assert_eq!(format_duration(Duration::from_millis(3_723_250)), "1h2m3.25s");
    }

    #[test]
    fn duration_is_shown_in_header() {
        let s = Summary::new();
        s.set_duration(Duration::from_secs(90));
        let mut out = Vec::new();
        s.display(&mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().starts_with("Migration took 1m30s\n"));
    }
}
