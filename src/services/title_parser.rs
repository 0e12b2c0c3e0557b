//! 标题解析 - 业务能力层
//!
//! 把链接 href 转成人物标题；纯函数，不关心请求与缓存

use crate::error::LinkError;
use crate::models::SubjectTitle;

const ARTICLE_PREFIX: &str = "/wiki/";

/// 标题解析器
///
/// 只接受同源的 `/wiki/<标题>` 条目链接。以下情况永久拒绝：
/// - 命名空间页面（`Talk:`、`User:` 等，任何含 `:` 的标题）
/// - 红链（`redlink=1`）
/// - 章节锚点（`#...`）
/// - 解码失败或标题为空
#[derive(Debug, Clone)]
pub struct TitleParser {
    origin: String,
    host: String,
}

impl TitleParser {
    /// `origin` 形如 `https://en.wikipedia.org`
    pub fn new(origin: &str) -> Self {
        let origin = origin.trim_end_matches('/').to_string();
        let host = origin
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(origin.as_str())
            .to_ascii_lowercase();
        Self { origin, host }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// 解析 href
    pub fn parse(&self, href: &str) -> Result<SubjectTitle, LinkError> {
        let href = href.trim();
        if href.is_empty() {
            return Err(LinkError::EmptyHref);
        }

        let (rest, fragment) = match href.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment)),
            None => (href, None),
        };
        if fragment.is_some_and(|f| !f.is_empty()) {
            return Err(LinkError::Fragment {
                href: href.to_string(),
            });
        }

        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (rest, None),
        };
        if query.is_some_and(is_red_link) {
            return Err(LinkError::RedLink {
                href: href.to_string(),
            });
        }

        let path = self.same_origin_path(path, href)?;
        let raw = path
            .strip_prefix(ARTICLE_PREFIX)
            .ok_or_else(|| LinkError::NotArticlePath {
                href: href.to_string(),
            })?;
        if raw.contains(':') {
            return Err(LinkError::Namespaced {
                title: raw.to_string(),
            });
        }

        // urlencoding 会原样保留 `%ZZ` 这类残缺转义，需要先行拒绝
        if !has_valid_escapes(raw) {
            return Err(LinkError::Undecodable {
                raw: raw.to_string(),
            });
        }
        let title = urlencoding::decode(raw)
            .map_err(|_| LinkError::Undecodable {
                raw: raw.to_string(),
            })?
            .into_owned();
        if title.contains(':') {
            return Err(LinkError::Namespaced { title });
        }
        if title.trim().is_empty() {
            return Err(LinkError::EmptyTitle {
                href: href.to_string(),
            });
        }

        Ok(SubjectTitle::new(title))
    }

    /// 去掉 scheme 与 host，返回站内路径；外站链接报错
    fn same_origin_path<'a>(&self, path: &'a str, href: &str) -> Result<&'a str, LinkError> {
        let authority_and_path = if let Some(rest) = path.strip_prefix("//") {
            rest
        } else if let Some((scheme, rest)) = path.split_once("://") {
            if scheme.contains('/') {
                // 路径里出现 "://"，按站内相对路径处理
                return Ok(path);
            }
            rest
        } else {
            return Ok(path);
        };

        let (host, path) = match authority_and_path.find('/') {
            Some(idx) => authority_and_path.split_at(idx),
            None => (authority_and_path, ""),
        };
        if !host.eq_ignore_ascii_case(&self.host) {
            return Err(LinkError::ForeignOrigin {
                href: href.to_string(),
            });
        }
        Ok(path)
    }
}

/// 每个 `%` 后面都必须跟两位十六进制数字
fn has_valid_escapes(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            match bytes.get(i + 1..i + 3) {
                Some([hi, lo]) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => i += 3,
                _ => return false,
            }
        } else {
            i += 1;
        }
    }
    true
}

fn is_red_link(query: &str) -> bool {
    query
        .split('&')
        .any(|pair| matches!(pair.split_once('='), Some(("redlink", "1"))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> TitleParser {
        TitleParser::new("https://en.wikipedia.org")
    }

    #[test]
    fn test_relative_article_link() {
        assert_eq!(
            parser().parse("/wiki/Ada_Lovelace").unwrap(),
            SubjectTitle::new("Ada_Lovelace")
        );
    }

    #[test]
    fn test_percent_encoded_title_is_decoded() {
        assert_eq!(
            parser().parse("/wiki/%C3%89mile_Zola").unwrap(),
            SubjectTitle::new("Émile_Zola")
        );
    }

    #[test]
    fn test_absolute_and_protocol_relative_links() {
        let p = parser();
        assert_eq!(
            p.parse("https://en.wikipedia.org/wiki/Foo").unwrap(),
            SubjectTitle::new("Foo")
        );
        assert_eq!(
            p.parse("//EN.wikipedia.org/wiki/Foo").unwrap(),
            SubjectTitle::new("Foo")
        );
    }

    #[test]
    fn test_foreign_origin_rejected() {
        assert!(matches!(
            parser().parse("https://de.wikipedia.org/wiki/Foo"),
            Err(LinkError::ForeignOrigin { .. })
        ));
    }

    #[test]
    fn test_namespace_rejected() {
        assert!(matches!(
            parser().parse("/wiki/Talk:Foo"),
            Err(LinkError::Namespaced { .. })
        ));
        assert!(matches!(
            parser().parse("/wiki/User%3AFoo"),
            Err(LinkError::Namespaced { .. })
        ));
    }

    #[test]
    fn test_fragment_rejected() {
        assert!(matches!(
            parser().parse("/wiki/Foo#Section"),
            Err(LinkError::Fragment { .. })
        ));
    }

    #[test]
    fn test_red_link_rejected() {
        assert!(matches!(
            parser().parse("/w/index.php?title=Foo&action=edit&redlink=1"),
            Err(LinkError::RedLink { .. })
        ));
        assert!(matches!(
            parser().parse("/wiki/Foo?redlink=1"),
            Err(LinkError::RedLink { .. })
        ));
    }

    #[test]
    fn test_other_query_is_ignored() {
        assert_eq!(
            parser().parse("/wiki/Foo?oldid=5").unwrap(),
            SubjectTitle::new("Foo")
        );
    }

    #[test]
    fn test_non_article_paths_rejected() {
        let p = parser();
        assert!(matches!(
            p.parse("/w/index.php?title=Foo"),
            Err(LinkError::NotArticlePath { .. })
        ));
        assert!(matches!(p.parse(""), Err(LinkError::EmptyHref)));
        assert!(matches!(
            p.parse("/wiki/"),
            Err(LinkError::EmptyTitle { .. })
        ));
    }

    #[test]
    fn test_undecodable_title_rejected() {
        assert!(matches!(
            parser().parse("/wiki/%FF%FE"),
            Err(LinkError::Undecodable { .. })
        ));
    }

    #[test]
    fn test_malformed_escape_rejected() {
        let p = parser();
        for href in ["/wiki/100%", "/wiki/%ZZ", "/wiki/Foo%2", "/wiki/50%_off"] {
            assert!(
                matches!(p.parse(href), Err(LinkError::Undecodable { .. })),
                "{} 应被拒绝",
                href
            );
        }
        assert_eq!(
            p.parse("/wiki/100%25").unwrap(),
            SubjectTitle::new("100%")
        );
    }
}
