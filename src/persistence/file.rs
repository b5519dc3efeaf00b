use std::{
    io::{self, Read, Write},
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::trace;

use crate::common::error::Result;
use crate::persistence::traits::{LedgerSnapshot, LedgerStore};

/// JSON 文件账本存储
///
/// - 格式: 制表符缩进的 JSON 对象，三层嵌套。
/// - 文件不存在或内容为空时视为空账本。
/// - 保存时先写临时文件再重命名，避免中途崩溃留下半个文件。
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LedgerStore for JsonFileStore {
    async fn load(&self) -> Result<LedgerSnapshot> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                trace!(path = %self.path.display(), "[Ledger] No ledger file, starting empty");
                return Ok(LedgerSnapshot::new());
            }
            Err(e) => return Err(e.into()),
        };
        read_snapshot(bytes.as_slice())
    }

    async fn save(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        let mut buf = Vec::new();
        write_snapshot(&mut buf, snapshot)?;

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &buf).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        trace!(path = %self.path.display(), bytes = buf.len(), "[Ledger] Saved");
        Ok(())
    }
}

/// 从任意输入读取快照 (空输入 => 空快照)
pub fn read_snapshot<R: Read>(mut reader: R) -> Result<LedgerSnapshot> {
    let mut raw = String::new();
    reader.read_to_string(&mut raw)?;
    if raw.trim().is_empty() {
        return Ok(LedgerSnapshot::new());
    }
    Ok(serde_json::from_str(&raw)?)
}

/// 以制表符缩进写出快照
pub fn write_snapshot<W: Write>(writer: W, snapshot: &LedgerSnapshot) -> Result<()> {
    let formatter = PrettyFormatter::with_indent(b"\t");
    let mut ser = serde_json::Serializer::with_formatter(writer, formatter);
    snapshot.serialize(&mut ser)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample() -> LedgerSnapshot {
        let mut items = BTreeMap::new();
        items.insert("web".to_string(), "2021-06-22T20:18:36Z".to_string());
        let mut spaces = BTreeMap::new();
        spaces.insert("dev".to_string(), items);
        let mut snapshot = LedgerSnapshot::new();
        snapshot.insert("acme".to_string(), spaces);
        snapshot
    }

    #[test]
    fn written_json_is_tab_indented() {
        let mut buf = Vec::new();
        write_snapshot(&mut buf, &sample()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("{\n\t\"acme\": {\n\t\t\"dev\": {\n\t\t\t\"web\""));
    }

    #[test]
    fn blank_input_reads_as_empty() {
        assert!(read_snapshot("".as_bytes()).unwrap().is_empty());
        assert!(read_snapshot("  \n".as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn malformed_input_is_serialization_error() {
        let err = read_snapshot("{not json".as_bytes()).unwrap_err();
        assert!(matches!(err, crate::common::MigrateError::Serialization(_)));
    }

    #[tokio::test]
    async fn missing_file_loads_empty_and_save_creates_it() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("ledger.json"));

        assert!(store.load().await.unwrap().is_empty());

        store.save(&sample()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), sample());
        assert!(!dir.path().join("ledger.tmp").exists());
    }
}
