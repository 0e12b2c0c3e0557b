//! 链接装饰 - 基础设施层
//!
//! 页面渲染属于外部协作方，这里只定义"标记为已故"的能力

use crate::models::{LinkHandle, LinkId};
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// 装饰标记使用的 class
pub const DECEASED_CLASS: &str = "wikideceased";

/// 附加在 title 属性上的说明
const ANNOTATION: &str = "deceased";

/// 装饰协作方
///
/// 对同一链接重复调用必须是安全的（幂等）。
pub trait LinkDecorator: Send + Sync {
    fn decorate(&self, link: &LinkHandle);
}

/// 生成可读的注释：在已有 title 后追加 ` • deceased`，已包含时保持不变
pub fn annotate_title(existing: Option<&str>) -> String {
    match existing {
        Some(title) if title.contains(ANNOTATION) => title.to_string(),
        Some(title) if !title.is_empty() => format!("{} • {}", title, ANNOTATION),
        _ => ANNOTATION.to_string(),
    }
}

/// 已装饰链接的记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoration {
    pub href: String,
    pub class: &'static str,
    pub title: String,
}

/// 在内存中记录装饰结果的装饰器
///
/// 命令行与测试使用；真实页面由宿主实现 `LinkDecorator`。
#[derive(Default)]
pub struct AnnotatingDecorator {
    decorations: Mutex<BTreeMap<LinkId, Decoration>>,
}

impl AnnotatingDecorator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已装饰的链接（按 id 排序）
    pub fn decorations(&self) -> Vec<(LinkId, Decoration)> {
        self.decorations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, d)| (*id, d.clone()))
            .collect()
    }

    pub fn is_decorated(&self, id: LinkId) -> bool {
        self.decorations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.decorations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LinkDecorator for AnnotatingDecorator {
    fn decorate(&self, link: &LinkHandle) {
        let mut decorations = self.decorations.lock().unwrap_or_else(PoisonError::into_inner);
        let current = decorations
            .get(&link.id)
            .map(|d| d.title.clone())
            .or_else(|| link.title_attr.clone());
        let title = annotate_title(current.as_deref());

        debug!("标记已故: {} ({})", link.href, link.id);
        decorations.insert(
            link.id,
            Decoration {
                href: link.href.clone(),
                class: DECEASED_CLASS,
                title,
            },
        );
    }
}
