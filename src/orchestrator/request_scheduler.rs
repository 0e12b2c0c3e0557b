//! 请求调度器 - 编排层
//!
//! ## 职责
//!
//! 把"某个标题需要分类"的请求转换为受控的网络调用。
//!
//! ## 核心规则
//!
//! 1. **缓存优先**：命中缓存立即返回，不排队、不限速
//! 2. **去重**：同一标题排队中或请求中时，新的调用方加入已有条目的观察者列表
//! 3. **并发上限**：同时进行的请求不超过 `max_concurrent`
//! 4. **限速**：相邻两次请求的发起时间至少相隔 `min_interval`
//! 5. **FIFO**：按入队顺序发起，完成顺序不限
//!
//! ## 状态流转
//!
//! ```text
//! Queued → Dispatched → (Fetching → Classifying) → Settled
//! ```
//!
//! 一次 Settled 事件通知该标题的全部观察者（等待方与回调）。

use crate::config::Config;
use crate::models::{ClassificationOutcome, SubjectTitle};
use crate::services::ResultCache;
use crate::workflow::SummaryFlow;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, warn};

/// 结果回调
pub type OutcomeCallback = Box<dyn FnOnce(ClassificationOutcome) + Send + 'static>;

/// 调度参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    pub max_concurrent: usize,
    pub min_interval: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            min_interval: Duration::from_millis(200),
        }
    }
}

impl From<&Config> for SchedulerSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_concurrent: config.max_concurrent.max(1),
            min_interval: config.min_interval(),
        }
    }
}

/// 调度器运行统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SchedulerStats {
    /// 排队中的标题
    pub queued: usize,
    /// 进行中的请求
    pub active: usize,
    /// 排队中或请求中的标题（去重后）
    pub pending_titles: usize,
    /// 累计发起的请求
    pub dispatched: u64,
}

/// 结果观察者
enum Observer {
    Awaiting(oneshot::Sender<ClassificationOutcome>),
    Callback(OutcomeCallback),
}

impl Observer {
    fn deliver(self, outcome: ClassificationOutcome) {
        match self {
            // 等待方已放弃时忽略
            Observer::Awaiting(tx) => {
                let _ = tx.send(outcome);
            }
            Observer::Callback(callback) => callback(outcome),
        }
    }
}

#[derive(Default)]
struct SchedulerState {
    queue: VecDeque<SubjectTitle>,
    /// 排队中与请求中的标题 → 观察者
    observers: HashMap<SubjectTitle, Vec<Observer>>,
    active: usize,
    /// 最近一次请求的（预定）发起时间
    last_dispatch: Option<Instant>,
    dispatched: u64,
}

struct Shared {
    flow: SummaryFlow,
    settings: SchedulerSettings,
    state: Mutex<SchedulerState>,
}

/// 请求调度器
///
/// 可廉价克隆，所有克隆共享同一队列与计数。需要在 tokio 运行时中使用。
#[derive(Clone)]
pub struct RequestScheduler {
    shared: Arc<Shared>,
}

impl RequestScheduler {
    pub fn new(flow: SummaryFlow, settings: SchedulerSettings) -> Self {
        Self {
            shared: Arc::new(Shared {
                flow,
                settings,
                state: Mutex::new(SchedulerState::default()),
            }),
        }
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        self.shared.flow.cache()
    }

    pub fn settings(&self) -> SchedulerSettings {
        self.shared.settings
    }

    /// 请求分类结果并等待
    pub async fn request(&self, title: SubjectTitle) -> ClassificationOutcome {
        if let Some(outcome) = self.cache().get(&title) {
            debug!("使用缓存结果: {}", title);
            return outcome;
        }

        let (tx, rx) = oneshot::channel();
        self.shared.enqueue(title, Observer::Awaiting(tx));
        // 发送端只会在结算时被消费，丢失时按 Unknown 处理
        rx.await.unwrap_or(ClassificationOutcome::Unknown)
    }

    /// 请求分类结果，结果可用时调用 `callback`
    ///
    /// 命中缓存时在当前调用栈内立即回调。
    pub fn request_with_callback<F>(&self, title: SubjectTitle, callback: F)
    where
        F: FnOnce(ClassificationOutcome) + Send + 'static,
    {
        if let Some(outcome) = self.cache().get(&title) {
            debug!("使用缓存结果: {}", title);
            callback(outcome);
            return;
        }

        self.shared.enqueue(title, Observer::Callback(Box::new(callback)));
    }

    /// 标题是否在排队中或请求中
    pub fn is_pending(&self, title: &SubjectTitle) -> bool {
        self.shared.lock().observers.contains_key(title)
    }

    pub fn stats(&self) -> SchedulerStats {
        let state = self.shared.lock();
        SchedulerStats {
            queued: state.queue.len(),
            active: state.active,
            pending_titles: state.observers.len(),
            dispatched: state.dispatched,
        }
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 入队或加入已有条目
    fn enqueue(self: &Arc<Self>, title: SubjectTitle, observer: Observer) {
        let mut state = self.lock();

        // 持锁复查：上一次结算可能刚写入缓存
        if let Some(outcome) = self.flow.cache().get(&title) {
            drop(state);
            observer.deliver(outcome);
            return;
        }

        match state.observers.get_mut(&title) {
            Some(observers) => {
                debug!("{} 已在处理中，加入等待 ({} 个观察者)", title, observers.len() + 1);
                observers.push(observer);
            }
            None => {
                debug!("{} 入队 (队列长度: {})", title, state.queue.len() + 1);
                state.observers.insert(title.clone(), vec![observer]);
                state.queue.push_back(title);
            }
        }

        self.drain(&mut state);
    }

    /// 在并发上限内尽可能多地发起请求
    fn drain(self: &Arc<Self>, state: &mut SchedulerState) {
        while state.active < self.settings.max_concurrent {
            let Some(title) = state.queue.pop_front() else {
                break;
            };
            state.active += 1;
            state.dispatched += 1;

            // 预定发起时间，保证相邻发起时间间隔不小于 min_interval
            let now = Instant::now();
            let start = match state.last_dispatch {
                Some(last) => now.max(last + self.settings.min_interval),
                None => now,
            };
            state.last_dispatch = Some(start);

            debug!(
                "发起 {} (进行中: {}/{}, 等待 {:?})",
                title,
                state.active,
                self.settings.max_concurrent,
                start.saturating_duration_since(now)
            );

            let shared = Arc::clone(self);
            tokio::spawn(async move {
                let guard = DispatchGuard {
                    shared: &shared,
                    title: &title,
                    settled: false,
                };
                guard.run(start).await;
            });
        }
    }

    /// 结算：通知全部观察者，释放并发名额，继续出队
    fn settle(self: &Arc<Self>, title: &SubjectTitle, outcome: ClassificationOutcome) {
        let observers = {
            let mut state = self.lock();
            let observers = state.observers.remove(title).unwrap_or_default();
            state.active = state.active.saturating_sub(1);
            self.drain(&mut state);
            observers
        };

        debug!("{} 结算为 {}，通知 {} 个观察者", title, outcome, observers.len());
        for observer in observers {
            observer.deliver(outcome);
        }
    }
}

/// 单次请求的执行守卫
///
/// 请求任务异常终止时按 Unknown 结算，避免名额永久占用。
struct DispatchGuard<'a> {
    shared: &'a Arc<Shared>,
    title: &'a SubjectTitle,
    settled: bool,
}

impl DispatchGuard<'_> {
    async fn run(mut self, start: Instant) {
        tokio::time::sleep_until(start).await;
        let outcome = self.shared.flow.run(self.title).await;
        self.settled = true;
        self.shared.settle(self.title, outcome);
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("{} 的请求任务异常终止，按 Unknown 结算", self.title);
            self.shared.settle(self.title, ClassificationOutcome::Unknown);
        }
    }
}
