//! 结果缓存服务 - 业务能力层
//!
//! 标题 → 分类结果。只缓存终态结果，会话内不淘汰。

use crate::error::StoreError;
use crate::infrastructure::KeyValueStore;
use crate::models::{ClassificationOutcome, SubjectTitle};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, info, warn};

/// 挂载的持久化存储
struct Persistence {
    store: Arc<dyn KeyValueStore>,
    namespace: String,
    /// 串行化保存：快照与写入在同一把锁内完成，最后一次写入总是最新内容
    save_lock: Mutex<()>,
}

/// 结果缓存
///
/// 职责：
/// - 只接受 Deceased / Living，Unknown 永不写入
/// - 条目首次写入后在会话内不再改变
/// - 每次新增条目后尽力保存到存储，失败只记日志
pub struct ResultCache {
    entries: RwLock<HashMap<SubjectTitle, ClassificationOutcome>>,
    persistence: Option<Persistence>,
}

impl ResultCache {
    /// 创建不挂载存储的缓存
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            persistence: None,
        }
    }

    /// 创建挂载存储的缓存，并立即从存储恢复
    pub fn with_store(store: Arc<dyn KeyValueStore>, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let cache = Self {
            entries: RwLock::new(HashMap::new()),
            persistence: None,
        };
        cache.load_from(store.as_ref(), &namespace);
        Self {
            persistence: Some(Persistence {
                store,
                namespace,
                save_lock: Mutex::new(()),
            }),
            ..cache
        }
    }

    pub fn get(&self, title: &SubjectTitle) -> Option<ClassificationOutcome> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(title)
            .copied()
    }

    /// 写入结果并保存，返回是否新增了条目
    ///
    /// Unknown 被拒绝；已存在的条目不会被覆盖。
    pub fn put(&self, title: &SubjectTitle, outcome: ClassificationOutcome) -> bool {
        let inserted = self.insert(title, outcome);
        if inserted {
            self.persist();
        }
        inserted
    }

    /// 只写内存，不触发保存；由调用方决定何时 `persist`
    pub fn insert(&self, title: &SubjectTitle, outcome: ClassificationOutcome) -> bool {
        if !outcome.is_terminal() {
            debug!("拒绝缓存 {} 的 Unknown 结果", title);
            return false;
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.contains_key(title) {
            false
        } else {
            entries.insert(title.clone(), outcome);
            true
        }
    }

    /// 是否挂载了存储
    pub fn is_persistent(&self) -> bool {
        self.persistence.is_some()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 按标题排序的缓存内容（持久化格式：true 表示已故）
    pub fn snapshot(&self) -> BTreeMap<String, bool> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter_map(|(title, outcome)| {
                outcome
                    .as_stored()
                    .map(|deceased| (title.as_str().to_string(), deceased))
            })
            .collect()
    }

    /// 从存储恢复，返回恢复的条目数
    ///
    /// 内容缺失或损坏时不报错，保持当前内容继续运行。
    pub fn load_from(&self, store: &dyn KeyValueStore, namespace: &str) -> usize {
        match self.try_load(store, namespace) {
            Ok(count) => {
                if count > 0 {
                    info!("✓ 从会话缓存恢复 {} 条结果", count);
                }
                count
            }
            Err(e) => {
                warn!("⚠️ 会话缓存恢复失败，使用空缓存: {}", e);
                0
            }
        }
    }

    /// 保存到存储，失败只记日志
    pub fn save_to(&self, store: &dyn KeyValueStore, namespace: &str) {
        if let Err(e) = self.try_save(store, namespace) {
            warn!("⚠️ 会话缓存保存失败: {}", e);
        }
    }

    /// 保存到挂载的存储
    pub fn persist(&self) {
        if let Some(p) = &self.persistence {
            let _guard = p.save_lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.save_to(p.store.as_ref(), &p.namespace);
        }
    }

    fn try_load(&self, store: &dyn KeyValueStore, namespace: &str) -> Result<usize, StoreError> {
        let Some(payload) = store.get(namespace)? else {
            return Ok(0);
        };
        let data: HashMap<String, bool> =
            serde_json::from_str(&payload).map_err(|source| StoreError::MalformedPayload {
                namespace: namespace.to_string(),
                source,
            })?;

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let mut count = 0;
        for (title, deceased) in data {
            entries
                .entry(SubjectTitle::new(title))
                .or_insert_with(|| {
                    count += 1;
                    ClassificationOutcome::from_stored(deceased)
                });
        }
        Ok(count)
    }

    fn try_save(&self, store: &dyn KeyValueStore, namespace: &str) -> Result<(), StoreError> {
        let payload = serde_json::to_string(&self.snapshot()).map_err(|source| {
            StoreError::MalformedPayload {
                namespace: namespace.to_string(),
                source,
            }
        })?;
        store.set(namespace, &payload)
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new()
    }
}
