//! 链接句柄
//!
//! 页面上的链接由外部的发现方提供，这里只保留分类与装饰需要的信息。

use serde::Serialize;
use std::fmt;

/// 链接的不透明标识（对应页面元素）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LinkId(pub u64);

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 祖先元素的可匹配属性
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ancestor {
    pub classes: Vec<String>,
    pub role: Option<String>,
}

impl Ancestor {
    pub fn with_classes<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            classes: classes.into_iter().map(Into::into).collect(),
            role: None,
        }
    }

    pub fn with_role(role: impl Into<String>) -> Self {
        Self {
            classes: Vec::new(),
            role: Some(role.into()),
        }
    }

    /// 解析 `class-a class-b role=tooltip` 形式的描述
    fn parse(desc: &str) -> Self {
        let mut ancestor = Ancestor::default();
        for token in desc.split_whitespace() {
            match token.strip_prefix("role=") {
                Some(role) if !role.is_empty() => ancestor.role = Some(role.to_string()),
                Some(_) => {}
                None => ancestor.classes.push(token.to_string()),
            }
        }
        ancestor
    }
}

/// 待分类的链接
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkHandle {
    pub id: LinkId,
    pub href: String,
    /// 链接已有的 title 属性
    pub title_attr: Option<String>,
    /// 从直接父元素到根的祖先链
    pub ancestry: Vec<Ancestor>,
}

impl LinkHandle {
    pub fn new(id: u64, href: impl Into<String>) -> Self {
        Self {
            id: LinkId(id),
            href: href.into(),
            title_attr: None,
            ancestry: Vec::new(),
        }
    }

    pub fn with_title_attr(mut self, title: impl Into<String>) -> Self {
        self.title_attr = Some(title.into());
        self
    }

    pub fn inside(mut self, ancestor: Ancestor) -> Self {
        self.ancestry.push(ancestor);
        self
    }

    /// 从输入行构造：`href[\t祖先1;祖先2...]`
    ///
    /// 空行或只有空白的行返回 `None`。
    pub fn from_line(id: u64, line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (href, ancestry) = match line.split_once('\t') {
            Some((href, rest)) => (href.trim(), Some(rest)),
            None => (line.trim(), None),
        };
        if href.is_empty() {
            return None;
        }

        let mut link = LinkHandle::new(id, href);
        if let Some(rest) = ancestry {
            link.ancestry = rest
                .split(';')
                .filter(|s| !s.trim().is_empty())
                .map(Ancestor::parse)
                .collect();
        }
        Some(link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_line_plain_href() {
        let link = LinkHandle::from_line(3, "/wiki/Ada_Lovelace\n").unwrap();
        assert_eq!(link.id, LinkId(3));
        assert_eq!(link.href, "/wiki/Ada_Lovelace");
        assert!(link.ancestry.is_empty());
    }

    #[test]
    fn test_from_line_with_ancestry() {
        let link =
            LinkHandle::from_line(1, "/wiki/Foo\tmw-body content; mwe-popups role=tooltip").unwrap();
        assert_eq!(link.ancestry.len(), 2);
        assert_eq!(link.ancestry[0].classes, vec!["mw-body", "content"]);
        assert_eq!(link.ancestry[1].classes, vec!["mwe-popups"]);
        assert_eq!(link.ancestry[1].role.as_deref(), Some("tooltip"));
    }

    #[test]
    fn test_from_line_blank() {
        assert!(LinkHandle::from_line(1, "   ").is_none());
        assert!(LinkHandle::from_line(1, "").is_none());
    }
}
