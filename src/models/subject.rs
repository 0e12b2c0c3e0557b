use serde::{Deserialize, Serialize};
use std::fmt;

/// 人物标题：缓存与去重的唯一键
///
/// 已解码、不含命名空间、不含锚点。只能通过标题解析器或测试构造。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectTitle(String);

impl SubjectTitle {
    pub fn new(title: impl Into<String>) -> Self {
        Self(title.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 摘要 API 路径中使用的百分号编码形式
    pub fn encoded(&self) -> String {
        urlencoding::encode(&self.0).into_owned()
    }
}

impl fmt::Display for SubjectTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubjectTitle {
    fn from(title: &str) -> Self {
        Self::new(title)
    }
}
