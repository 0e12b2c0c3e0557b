use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 链接解析错误
    #[error("链接错误: {0}")]
    Link(#[from] LinkError),
    /// 摘要 API 调用错误
    #[error("请求错误: {0}")]
    Fetch(#[from] FetchError),
    /// 缓存存储错误
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 链接目标无法转换为人物标题（MalformedLinkTarget）
///
/// 这类链接被永久跳过，不会重试。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    /// href 为空
    #[error("href 为空")]
    EmptyHref,
    /// 不是同源链接
    #[error("非同源链接: {href}")]
    ForeignOrigin { href: String },
    /// 不是 /wiki/ 条目路径
    #[error("不是条目路径: {href}")]
    NotArticlePath { href: String },
    /// 含命名空间（Talk:、User: 等）
    #[error("命名空间页面: {title}")]
    Namespaced { title: String },
    /// 红链（页面不存在）
    #[error("红链: {href}")]
    RedLink { href: String },
    /// 章节锚点链接
    #[error("章节链接: {href}")]
    Fragment { href: String },
    /// 百分号编码无法解码
    #[error("无法解码标题: {raw}")]
    Undecodable { raw: String },
    /// 标题为空
    #[error("标题为空: {href}")]
    EmptyTitle { href: String },
}

/// 摘要 API 调用错误
///
/// 全部在调度器边界被转换为 Unknown，不会传播给调用方。
#[derive(Debug, Error)]
pub enum FetchError {
    /// 网络请求失败（TransportFailure）
    #[error("请求 {title} 失败: {message}")]
    Transport { title: String, message: String },
    /// 非 200 响应（NonSuccessStatus）
    #[error("请求 {title} 返回状态码 {status}")]
    Status { title: String, status: u16 },
    /// 响应体无法解析
    #[error("解析 {title} 的响应失败: {message}")]
    Parse { title: String, message: String },
    /// 超过单次请求期限
    #[error("请求 {title} 超时 ({after_ms}ms)")]
    Timeout { title: String, after_ms: u64 },
}

impl FetchError {
    /// 出错的标题
    pub fn title(&self) -> &str {
        match self {
            FetchError::Transport { title, .. }
            | FetchError::Status { title, .. }
            | FetchError::Parse { title, .. }
            | FetchError::Timeout { title, .. } => title,
        }
    }
}

/// 缓存存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 读写失败
    #[error("读写 {path} 失败: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 缓存内容损坏（MalformedCachePayload）
    #[error("缓存内容无法解析 (命名空间: {namespace}): {source}")]
    MalformedPayload {
        namespace: String,
        #[source]
        source: serde_json::Error,
    },
    /// 存储不可用
    #[error("存储不可用: {0}")]
    Unavailable(String),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("读取配置文件 {path} 失败: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置值非法
    #[error("配置项 {field} 非法: {reason}")]
    Invalid { field: String, reason: String },
}

// ========== 便捷构造函数 ==========

impl FetchError {
    /// 创建网络请求失败错误
    pub fn transport(title: impl Into<String>, source: impl std::fmt::Display) -> Self {
        FetchError::Transport {
            title: title.into(),
            message: source.to_string(),
        }
    }

    /// 创建响应解析失败错误
    pub fn parse(title: impl Into<String>, source: impl std::fmt::Display) -> Self {
        FetchError::Parse {
            title: title.into(),
            message: source.to_string(),
        }
    }
}

impl ConfigError {
    /// 创建配置值非法错误
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_title() {
        let err = FetchError::Status {
            title: "Foo".to_string(),
            status: 404,
        };
        assert_eq!(err.title(), "Foo");
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_app_error_from_link_error() {
        let err: AppError = LinkError::EmptyHref.into();
        assert!(matches!(err, AppError::Link(LinkError::EmptyHref)));
    }

    #[test]
    fn test_config_error_propagates_as_app_error() {
        fn load() -> AppResult<()> {
            Err(ConfigError::invalid("batch_size", "必须大于 0"))?;
            Ok(())
        }

        let err = load().unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::Invalid { .. })));
        assert!(err.to_string().contains("batch_size"));
    }
}
