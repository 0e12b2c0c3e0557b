//! 基础设施层（Infrastructure Layer）
//!
//! 持有外部资源（会话存储、页面装饰），只暴露能力，不认识分类流程

pub mod decorator;
pub mod store;

pub use decorator::{annotate_title, AnnotatingDecorator, Decoration, LinkDecorator};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
