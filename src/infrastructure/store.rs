//! 会话存储 - 基础设施层
//!
//! 按命名空间整体读写一段文本，只暴露 get / set 能力

use crate::error::StoreError;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// 命名空间键值存储
///
/// 职责：
/// - 以命名空间为键整体读写（get-all / set-all）
/// - 不认识缓存条目的格式
/// - 生命周期只覆盖当前会话
pub trait KeyValueStore: Send + Sync {
    /// 读取命名空间下的全部内容，不存在时返回 `None`
    fn get(&self, namespace: &str) -> Result<Option<String>, StoreError>;

    /// 覆盖写入命名空间下的全部内容
    fn set(&self, namespace: &str, payload: &str) -> Result<(), StoreError>;
}

/// 内存存储
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置内容（用于测试损坏数据等场景）
    pub fn with_payload(namespace: impl Into<String>, payload: impl Into<String>) -> Self {
        let store = Self::new();
        store
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(namespace.into(), payload.into());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, namespace: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(namespace).cloned())
    }

    fn set(&self, namespace: &str, payload: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(namespace.to_string(), payload.to_string());
        Ok(())
    }
}

/// 文件存储：每个命名空间对应目录下的一个 `<namespace>.json`
///
/// 读写都是阻塞的文件操作，异步上下文中应放到阻塞线程池调用。
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, namespace: &str) -> PathBuf {
        self.dir.join(format!("{}.json", namespace))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, namespace: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(namespace);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("缓存文件不存在: {}", path.display());
                Ok(None)
            }
            Err(source) => Err(StoreError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    fn set(&self, namespace: &str, payload: &str) -> Result<(), StoreError> {
        let path = self.path_for(namespace);
        let io_err = |source: std::io::Error| StoreError::Io {
            path: path.display().to_string(),
            source,
        };

        std::fs::create_dir_all(&self.dir).map_err(io_err)?;
        // 每次写入都用独立的临时文件，写完再改名替换，并发写入互不干扰
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        tmp.write_all(payload.as_bytes()).map_err(io_err)?;
        tmp.persist(&path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(assert_ok!(store.get("ns")).is_none());
        assert_ok!(store.set("ns", "{}"));
        assert_eq!(assert_ok!(store.get("ns")).as_deref(), Some("{}"));
        assert!(assert_ok!(store.get("other")).is_none());
    }

    #[test]
    fn test_file_store_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(assert_ok!(store.get("wiki-deceased-cache")).is_none());
    }

    #[test]
    fn test_file_store_creates_directory_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("session"));

        assert_ok!(store.set("ns", r#"{"Foo":true}"#));
        assert_ok!(store.set("ns", r#"{"Bar":false}"#));

        assert_eq!(
            assert_ok!(store.get("ns")).as_deref(),
            Some(r#"{"Bar":false}"#)
        );
        // 临时文件已被改名，目录中只剩结果文件
        let files: Vec<_> = std::fs::read_dir(dir.path().join("session"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(files, vec![std::ffi::OsString::from("ns.json")]);
    }

    #[test]
    fn test_file_store_concurrent_writes_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        std::thread::scope(|scope| {
            for writer in 0..8 {
                let store = &store;
                scope.spawn(move || {
                    for round in 0..25 {
                        let payload = format!(r#"{{"Writer_{}":{}}}"#, writer, round % 2 == 0);
                        assert_ok!(store.set("ns", &payload));
                    }
                });
            }
        });

        let payload = assert_ok!(store.get("ns")).unwrap();
        let data: HashMap<String, bool> = serde_json::from_str(&payload).unwrap();
        assert_eq!(data.len(), 1);
    }
}
