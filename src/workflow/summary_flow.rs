//! 单个标题的处理流程 - 流程层
//!
//! 核心职责：定义"一个标题"从请求到落缓存的完整流程
//!
//! 流程顺序：
//! 1. 请求摘要（受单次期限约束）
//! 2. 分类
//! 3. 终态结果写入缓存

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::clients::SummaryFetcher;
use crate::error::FetchError;
use crate::models::{ClassificationOutcome, SubjectTitle, SummaryRecord};
use crate::services::{Classifier, ResultCache};

/// 标题处理流程
///
/// - 不关心排队、并发与限速（由调度器负责）
/// - 任何失败都转换为 Unknown，不向上传播
pub struct SummaryFlow {
    fetcher: Arc<dyn SummaryFetcher>,
    classifier: Arc<Classifier>,
    cache: Arc<ResultCache>,
    deadline: Duration,
}

impl SummaryFlow {
    pub fn new(
        fetcher: Arc<dyn SummaryFetcher>,
        classifier: Arc<Classifier>,
        cache: Arc<ResultCache>,
        deadline: Duration,
    ) -> Self {
        Self {
            fetcher,
            classifier,
            cache,
            deadline,
        }
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// 执行：请求 → 分类 → 写缓存
    pub async fn run(&self, title: &SubjectTitle) -> ClassificationOutcome {
        debug!("🔍 请求摘要: {}", title);

        let record = match self.fetch_with_deadline(title).await {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("⚠️ {} 记为 Unknown: {}", e.title(), e);
                None
            }
        };

        let outcome = self.classifier.classify(record.as_ref());
        if self.cache.insert(title, outcome) {
            info!("✓ {} → {}", title, outcome);
            self.persist_cache().await;
        } else {
            debug!("{} → {} (未写入缓存)", title, outcome);
        }
        outcome
    }

    /// 保存缓存；存储读写是阻塞操作，放到阻塞线程池执行
    async fn persist_cache(&self) {
        if !self.cache.is_persistent() {
            return;
        }
        let cache = Arc::clone(&self.cache);
        if let Err(e) = tokio::task::spawn_blocking(move || cache.persist()).await {
            warn!("⚠️ 会话缓存保存任务异常: {}", e);
        }
    }

    async fn fetch_with_deadline(
        &self,
        title: &SubjectTitle,
    ) -> Result<SummaryRecord, FetchError> {
        match tokio::time::timeout(self.deadline, self.fetcher.fetch(title)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                title: title.to_string(),
                after_ms: self.deadline.as_millis() as u64,
            }),
        }
    }
}
