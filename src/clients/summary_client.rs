/// 摘要 API 客户端
///
/// 封装对 `<origin>/api/rest_v1/page/summary/<标题>` 的调用
use crate::config::Config;
use crate::error::FetchError;
use crate::models::{SubjectTitle, SummaryRecord};
use futures::future::BoxFuture;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use tracing::debug;

const SUMMARY_PATH: &str = "/api/rest_v1/page/summary/";

/// 摘要获取能力
///
/// 调度器只依赖这个 trait，测试时可以注入假的实现。
pub trait SummaryFetcher: Send + Sync {
    fn fetch<'a>(
        &'a self,
        title: &'a SubjectTitle,
    ) -> BoxFuture<'a, Result<SummaryRecord, FetchError>>;
}

/// 基于 reqwest 的摘要客户端
pub struct WikiSummaryClient {
    http: reqwest::Client,
    base_url: String,
}

impl WikiSummaryClient {
    /// 创建新的摘要客户端
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| FetchError::transport("<client>", e))?;

        Ok(Self {
            http,
            base_url: format!("{}{}", config.origin(), SUMMARY_PATH),
        })
    }

    /// 标题对应的请求地址
    pub fn url_for(&self, title: &SubjectTitle) -> String {
        format!("{}{}", self.base_url, title.encoded())
    }

    async fn get_summary(&self, title: &SubjectTitle) -> Result<SummaryRecord, FetchError> {
        let url = self.url_for(title);
        debug!("请求摘要: {}", url);

        let response = self
            .http
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::transport(title.as_str(), e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                title: title.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .json::<SummaryRecord>()
            .await
            .map_err(|e| FetchError::parse(title.as_str(), e))
    }
}

impl SummaryFetcher for WikiSummaryClient {
    fn fetch<'a>(
        &'a self,
        title: &'a SubjectTitle,
    ) -> BoxFuture<'a, Result<SummaryRecord, FetchError>> {
        Box::pin(self.get_summary(title))
    }
}
