use serde::Deserialize;

/// 摘要 API 响应中与分类相关的部分
///
/// 两个字段都可能缺失；其余字段忽略。
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SummaryRecord {
    /// 简短描述，如 "American engineer (1920–1995)"
    #[serde(default)]
    pub description: Option<String>,
    /// 带 HTML 标记的导语
    #[serde(default)]
    pub extract_html: Option<String>,
}

impl SummaryRecord {
    pub fn new(description: impl Into<String>, extract_html: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            extract_html: Some(extract_html.into()),
        }
    }

    /// 两个字段都缺失时没有可供分类的内容
    pub fn has_content(&self) -> bool {
        self.description.is_some() || self.extract_html.is_some()
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    pub fn extract_html(&self) -> &str {
        self.extract_html.as_deref().unwrap_or("")
    }
}
