//! 分类服务 - 业务能力层
//!
//! 只负责"根据摘要判断是否已故"，不关心请求、缓存与流程

use crate::models::{ClassificationOutcome, SummaryRecord};
use anyhow::Result;
use regex::Regex;
use tracing::debug;

/// 导语中参与匹配的前缀长度（字符数）
///
/// 只看开头，避免正文中段的 "was a" 造成误判。
const EXTRACT_PREFIX_CHARS: usize = 200;

/// 已故判断
///
/// 职责：
/// - 描述中出现 `(1920–1995)` 这样的生卒年 → 已故
/// - 导语开头出现 `>… was a/an` 这样的过去时介绍 → 已故
/// - 其余情况 → 在世
///
/// 这是启发式规则，漏判可以接受，误判需要尽量少。
pub struct Classifier {
    life_span: Regex,
    past_tense_intro: Regex,
}

impl Classifier {
    /// 创建分类器（编译正则）
    pub fn new() -> Result<Self> {
        Ok(Self {
            life_span: Regex::new(r"\(\s*\d{4}\s*[–-]\s*\d{4}\s*\)")?,
            past_tense_intro: Regex::new(r"(?i)>\s*was\s+(a|an)\b")?,
        })
    }

    /// 分类
    ///
    /// `None` 表示请求失败或非 200 响应。
    pub fn classify(&self, record: Option<&SummaryRecord>) -> ClassificationOutcome {
        let Some(record) = record else {
            return ClassificationOutcome::Unknown;
        };
        if !record.has_content() {
            debug!("摘要缺少 description 与 extract_html，无法判断");
            return ClassificationOutcome::Unknown;
        }

        let description = record.description();
        if self.life_span.is_match(description) {
            debug!("描述中发现生卒年: {}", description);
            return ClassificationOutcome::Deceased;
        }

        if self.past_tense_intro.is_match(&extract_prefix(record.extract_html())) {
            debug!("导语开头发现 \"was a/an\"");
            return ClassificationOutcome::Deceased;
        }

        ClassificationOutcome::Living
    }
}

fn extract_prefix(extract: &str) -> &str {
    match extract.char_indices().nth(EXTRACT_PREFIX_CHARS) {
        Some((end, _)) => &extract[..end],
        None => extract,
    }
}
