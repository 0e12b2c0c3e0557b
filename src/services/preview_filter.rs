//! 预览容器过滤 - 业务能力层
//!
//! 悬浮卡片、提示框等临时界面里的链接不参与分类

use crate::config::Config;
use crate::models::{Ancestor, LinkHandle};
use tracing::debug;

/// 祖先匹配规则
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewMatcher {
    /// class 完全相同
    Class(String),
    /// class 包含片段
    ClassContains(String),
    /// ARIA role 相同
    Role(String),
}

impl PreviewMatcher {
    fn matches(&self, ancestor: &Ancestor) -> bool {
        match self {
            PreviewMatcher::Class(name) => ancestor.classes.iter().any(|c| c == name),
            PreviewMatcher::ClassContains(fragment) => {
                ancestor.classes.iter().any(|c| c.contains(fragment.as_str()))
            }
            PreviewMatcher::Role(role) => ancestor.role.as_deref() == Some(role.as_str()),
        }
    }
}

impl std::fmt::Display for PreviewMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreviewMatcher::Class(name) => write!(f, ".{}", name),
            PreviewMatcher::ClassContains(fragment) => write!(f, "[class*=\"{}\"]", fragment),
            PreviewMatcher::Role(role) => write!(f, "[role=\"{}\"]", role),
        }
    }
}

/// 预览容器过滤器
pub struct PreviewFilter {
    matchers: Vec<PreviewMatcher>,
}

impl PreviewFilter {
    pub fn new(matchers: Vec<PreviewMatcher>) -> Self {
        Self { matchers }
    }

    /// 按配置构造
    pub fn from_config(config: &Config) -> Self {
        let matchers = config
            .preview_classes
            .iter()
            .cloned()
            .map(PreviewMatcher::Class)
            .chain(config.preview_roles.iter().cloned().map(PreviewMatcher::Role))
            .chain(
                config
                    .preview_class_fragments
                    .iter()
                    .cloned()
                    .map(PreviewMatcher::ClassContains),
            )
            .collect();
        Self::new(matchers)
    }

    /// 返回命中的规则；链接不在预览容器中时返回 `None`
    pub fn matching_rule(&self, link: &LinkHandle) -> Option<&PreviewMatcher> {
        link.ancestry.iter().find_map(|ancestor| {
            self.matchers.iter().find(|matcher| matcher.matches(ancestor))
        })
    }

    pub fn is_in_preview(&self, link: &LinkHandle) -> bool {
        match self.matching_rule(link) {
            Some(rule) => {
                debug!("链接 {} 位于预览容器中 ({})，跳过", link.href, rule);
                true
            }
            None => false,
        }
    }
}
