//! # Wiki Deceased
//!
//! 为指向百科人物条目的链接标记"已故"：按人物标题查询摘要 API，缓存结果，
//! 对已故人物的链接调用装饰方
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有外部资源，只暴露能力
//! - `KeyValueStore` - 会话存储（内存 / JSON 文件）
//! - `LinkDecorator` - 页面装饰能力
//!
//! ### ② 业务能力层（Services / Clients）
//! - `services/` - 描述"我能做什么"，只处理单个标题或单个链接
//! - `Classifier` - 已故判断
//! - `ResultCache` - 结果缓存
//! - `TitleParser` / `PreviewFilter` - 标题提取与预览过滤
//! - `clients/` - 摘要 API 客户端
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个标题"的完整处理流程
//! - `SummaryFlow` - 请求 → 分类 → 写缓存
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/request_scheduler` - 去重、并发上限、限速
//! - `orchestrator/link_service` - 链接批量处理与装饰
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{SummaryFetcher, WikiSummaryClient};
pub use config::Config;
pub use error::{AppError, AppResult, FetchError, LinkError, StoreError};
pub use infrastructure::{AnnotatingDecorator, JsonFileStore, KeyValueStore, LinkDecorator, MemoryStore};
pub use models::{ClassificationOutcome, LinkHandle, LinkId, SubjectTitle, SummaryRecord};
pub use orchestrator::{LinkClassificationService, RequestScheduler, SchedulerSettings};
pub use services::{Classifier, ResultCache};
pub use workflow::SummaryFlow;
