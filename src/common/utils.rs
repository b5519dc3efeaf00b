use nanoid::nanoid;

// ==========================================
// ID 生成工具 (Identity Utilities)
// ==========================================

/// 生成一次查询运行的短 ID (NanoID)
///
/// 只用于日志关联 (tracing span)，不要求全局唯一。
/// 字符集不含 `-` 和 `_`，方便在日志里双击选中。
#[inline]
pub fn new_run_id() -> String {
    const ALPHABET: [char; 62] = [
        '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h',
        'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
        'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R',
        'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
    ];
    nanoid!(8, &ALPHABET)
}

/// 从 panic 载荷中提取可读信息
pub fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("Panic: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("Panic: {}", s)
    } else {
        "Panic: Unknown error".to_string()
    }
}
