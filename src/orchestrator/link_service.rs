//! 链接分类服务 - 编排层
//!
//! ## 职责
//!
//! 1. **去重标记**：每个链接只处理一次，重复提交直接忽略
//! 2. **预览过滤**：预览容器中的链接标记为已处理，但不参与分类
//! 3. **标题提取**：无法提取标题的链接永久跳过
//! 4. **分批**：有效链接按 `batch_size` 分批，批与批之间让出执行权
//! 5. **装饰**：结果为已故时，对该链接调用一次装饰方
//!
//! 输入既可以是首次扫描，也可以是页面变动后的增量批次，处理方式相同。

use crate::clients::SummaryFetcher;
use crate::config::Config;
use crate::infrastructure::{KeyValueStore, LinkDecorator};
use crate::models::{LinkHandle, LinkId, SubjectTitle};
use crate::orchestrator::request_scheduler::{RequestScheduler, SchedulerSettings};
use crate::services::{Classifier, PreviewFilter, ResultCache, TitleParser};
use crate::utils::logging;
use crate::workflow::SummaryFlow;
use anyhow::Result;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::ops::AddAssign;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, Notify};
use tracing::{debug, info};

/// 单次提交的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubmitReport {
    /// 进入分类的链接
    pub accepted: usize,
    /// 之前已处理过的链接
    pub already_processed: usize,
    /// 位于预览容器中的链接
    pub preview: usize,
    /// 无法提取标题的链接
    pub rejected: usize,
    /// 分成的批次数
    pub batches: usize,
}

impl AddAssign for SubmitReport {
    fn add_assign(&mut self, other: Self) {
        self.accepted += other.accepted;
        self.already_processed += other.already_processed;
        self.preview += other.preview;
        self.rejected += other.rejected;
        self.batches += other.batches;
    }
}

/// 调试快照
#[derive(Debug, Clone, Serialize)]
pub struct ServiceSnapshot {
    pub cache: BTreeMap<String, bool>,
    pub processed_links: usize,
    pub deceased_links: usize,
    pub pending_links: usize,
    pub queue_length: usize,
    pub active_requests: usize,
    pub request_delay_ms: u64,
    pub max_concurrent: usize,
}

#[derive(Default)]
struct ProcessedMarks {
    processed: HashSet<LinkId>,
    /// 因位于预览容器而被跳过的链接
    preview: HashSet<LinkId>,
}

struct ServiceInner {
    scheduler: RequestScheduler,
    parser: TitleParser,
    preview_filter: PreviewFilter,
    decorator: Arc<dyn LinkDecorator>,
    batch_size: usize,
    marks: Mutex<ProcessedMarks>,
    decorated: AtomicUsize,
    pending: AtomicUsize,
    idle: Notify,
}

/// 链接分类服务
///
/// 每个会话构造一次；可廉价克隆。
#[derive(Clone)]
pub struct LinkClassificationService {
    inner: Arc<ServiceInner>,
}

impl LinkClassificationService {
    pub fn new(
        scheduler: RequestScheduler,
        parser: TitleParser,
        preview_filter: PreviewFilter,
        decorator: Arc<dyn LinkDecorator>,
        batch_size: usize,
    ) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                scheduler,
                parser,
                preview_filter,
                decorator,
                batch_size: batch_size.max(1),
                marks: Mutex::new(ProcessedMarks::default()),
                decorated: AtomicUsize::new(0),
                pending: AtomicUsize::new(0),
                idle: Notify::new(),
            }),
        }
    }

    /// 按配置组装完整的服务
    ///
    /// 提供 `store` 时缓存会先从中恢复，之后每次新增结果都会写回。
    pub fn from_config(
        config: &Config,
        fetcher: Arc<dyn SummaryFetcher>,
        store: Option<Arc<dyn KeyValueStore>>,
        decorator: Arc<dyn LinkDecorator>,
    ) -> Result<Self> {
        let cache = match store {
            Some(store) => ResultCache::with_store(store, config.cache_namespace.clone()),
            None => ResultCache::new(),
        };
        let flow = SummaryFlow::new(
            fetcher,
            Arc::new(Classifier::new()?),
            Arc::new(cache),
            config.request_timeout(),
        );
        let scheduler = RequestScheduler::new(flow, SchedulerSettings::from(config));

        Ok(Self::new(
            scheduler,
            TitleParser::new(config.origin()),
            PreviewFilter::from_config(config),
            decorator,
            config.batch_size,
        ))
    }

    pub fn scheduler(&self) -> &RequestScheduler {
        &self.inner.scheduler
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        self.inner.scheduler.cache()
    }

    pub fn is_processed(&self, id: LinkId) -> bool {
        self.inner.marks().processed.contains(&id)
    }

    /// 撤销预览链接的已处理标记
    ///
    /// 预览中的内容被提升为正式内容后由宿主调用，之后再次提交即可重新分类。
    /// 只对因预览被跳过的链接生效。
    pub fn release_preview(&self, id: LinkId) -> bool {
        let mut marks = self.inner.marks();
        if marks.preview.remove(&id) {
            marks.processed.remove(&id);
            true
        } else {
            false
        }
    }

    /// 提交一批候选链接
    ///
    /// 标记与过滤在调用时同步完成；分类请求在后台按批发起。
    pub fn submit(&self, links: Vec<LinkHandle>) -> SubmitReport {
        let mut report = SubmitReport::default();
        let found = links.len();
        let mut accepted = Vec::new();

        {
            let mut marks = self.inner.marks();
            for link in links {
                if !marks.processed.insert(link.id) {
                    report.already_processed += 1;
                    continue;
                }
                if self.inner.preview_filter.is_in_preview(&link) {
                    marks.preview.insert(link.id);
                    report.preview += 1;
                    continue;
                }
                match self.inner.parser.parse(&link.href) {
                    Ok(title) => accepted.push((link, title)),
                    Err(e) => {
                        debug!("跳过链接 {}: {}", link.id, e);
                        report.rejected += 1;
                    }
                }
            }
        }

        report.accepted = accepted.len();
        info!(
            "发现 {} 个链接，有效 {} 个 (已处理 {}，预览 {}，无法解析 {})",
            found, report.accepted, report.already_processed, report.preview, report.rejected
        );
        if accepted.is_empty() {
            return report;
        }

        let batches = chunk(accepted, self.inner.batch_size);
        report.batches = batches.len();
        self.inner.pending.fetch_add(report.accepted, Ordering::SeqCst);

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let total = batches.len();
            for (idx, batch) in batches.into_iter().enumerate() {
                // 每批单独占用一轮调度
                tokio::task::yield_now().await;
                let size = batch.len();
                for (link, title) in batch {
                    ServiceInner::classify_link(&inner, link, title);
                }
                debug!("已处理第 {}/{} 批 ({} 个链接)", idx + 1, total, size);
            }
        });

        report
    }

    /// 持续消费链接批次，直到发送端全部关闭
    pub async fn run_feed(&self, mut feed: mpsc::Receiver<Vec<LinkHandle>>) -> SubmitReport {
        let mut total = SubmitReport::default();
        let mut batch_num = 0;
        while let Some(links) = feed.recv().await {
            batch_num += 1;
            let report = self.submit(links);
            logging::log_submit(batch_num, &report);
            total += report;
        }
        debug!("链接来源已关闭");
        total
    }

    /// 等待所有已接受的链接拿到结果
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.inner.pending.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }

    pub fn decorated_count(&self) -> usize {
        self.inner.decorated.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> ServiceSnapshot {
        let stats = self.inner.scheduler.stats();
        let settings = self.inner.scheduler.settings();
        ServiceSnapshot {
            cache: self.cache().snapshot(),
            processed_links: self.inner.marks().processed.len(),
            deceased_links: self.decorated_count(),
            pending_links: self.inner.pending.load(Ordering::SeqCst),
            queue_length: stats.queued,
            active_requests: stats.active,
            request_delay_ms: settings.min_interval.as_millis() as u64,
            max_concurrent: settings.max_concurrent,
        }
    }
}

impl ServiceInner {
    fn marks(&self) -> MutexGuard<'_, ProcessedMarks> {
        self.marks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn classify_link(inner: &Arc<Self>, link: LinkHandle, title: SubjectTitle) {
        let this = Arc::clone(inner);
        inner
            .scheduler
            .request_with_callback(title.clone(), move |outcome| {
                if outcome.is_deceased() {
                    this.decorator.decorate(&link);
                    this.decorated.fetch_add(1, Ordering::SeqCst);
                    info!("已标记已故: {} ({})", link.href, title);
                }
                this.finish_one();
            });
    }

    fn finish_one(&self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

fn chunk<T>(items: Vec<T>, size: usize) -> Vec<Vec<T>> {
    let mut batches = Vec::with_capacity(items.len().div_ceil(size));
    let mut current = Vec::with_capacity(size);
    for item in items {
        current.push(item);
        if current.len() == size {
            batches.push(std::mem::replace(&mut current, Vec::with_capacity(size)));
        }
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}
