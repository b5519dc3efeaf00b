use tracing_subscriber::EnvFilter;

/// 安装全局 fmt 日志订阅者
///
/// - 优先使用 `RUST_LOG`，没有设置时使用 `default_level` (例如 `"info"`、`"ferry=debug"`)。
/// - 已经安装过订阅者时静默返回 `false`，可以重复调用 (测试里经常这样)。
pub fn init_tracing(default_level: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_is_harmless() {
        init_tracing("warn");
        assert!(!init_tracing("debug"));
    }
}
