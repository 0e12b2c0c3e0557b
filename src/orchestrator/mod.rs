//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责排队、并发与分批，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `request_scheduler` - 请求调度器
//! - 缓存优先，未命中才排队
//! - 同一标题的请求合并（去重 + 扇出通知）
//! - 并发上限与发起间隔
//!
//! ### `link_service` - 链接分类服务
//! - 已处理标记、预览过滤、标题提取
//! - 分批提交，批间让出执行权
//! - 结果为已故时调用装饰方
//!
//! ## 层次关系
//!
//! ```text
//! link_service (处理 Vec<LinkHandle>)
//!     ↓
//! request_scheduler (处理排队中的标题)
//!     ↓
//! workflow::SummaryFlow (处理单个标题)
//!     ↓
//! services / clients (能力层：分类 / 缓存 / 请求)
//!     ↓
//! infrastructure (基础设施：存储 / 装饰)
//! ```

pub mod link_service;
pub mod request_scheduler;

// 重新导出主要类型
pub use link_service::{LinkClassificationService, ServiceSnapshot, SubmitReport};
pub use request_scheduler::{OutcomeCallback, RequestScheduler, SchedulerSettings, SchedulerStats};
