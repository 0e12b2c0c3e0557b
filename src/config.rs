use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 百科站点源（scheme + host），摘要 API 与同源判断都基于它
    pub api_origin: String,
    /// 请求头 User-Agent
    pub user_agent: String,
    /// 同时进行的网络请求上限
    pub max_concurrent: usize,
    /// 相邻两次请求发起的最小间隔（毫秒）
    pub min_interval_ms: u64,
    /// 单次请求期限（秒）
    pub request_timeout_secs: u64,
    /// 每批处理的链接数
    pub batch_size: usize,
    /// 缓存命名空间
    pub cache_namespace: String,
    /// 会话缓存目录
    pub cache_dir: PathBuf,
    /// 预览容器的 class（精确匹配）
    pub preview_classes: Vec<String>,
    /// 预览容器的 class 片段（包含匹配）
    pub preview_class_fragments: Vec<String>,
    /// 预览容器的 ARIA role
    pub preview_roles: Vec<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_origin: "https://en.wikipedia.org".to_string(),
            user_agent: "WikipediaDeceasedDetector/1.0".to_string(),
            max_concurrent: 4,
            min_interval_ms: 200,
            request_timeout_secs: 10,
            batch_size: 10,
            cache_namespace: "wiki-deceased-cache".to_string(),
            cache_dir: std::env::temp_dir().join("wiki-deceased"),
            preview_classes: [
                "mwe-popups",
                "popover",
                "preview",
                "tooltip",
                "hovercard",
                "navbox",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            preview_class_fragments: ["preview", "popup", "popover"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            preview_roles: vec!["tooltip".to_string()],
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从环境变量加载（未设置的项使用默认值）
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载，环境变量覆盖文件中的值
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
                path: path.display().to_string(),
                source,
            })?;
        config.with_env_overrides()
    }

    /// 用环境变量覆盖当前配置
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        let config = Self {
            api_origin: env_string("WIKI_API_ORIGIN").unwrap_or(self.api_origin),
            user_agent: env_string("WIKI_USER_AGENT").unwrap_or(self.user_agent),
            max_concurrent: env_parse("MAX_CONCURRENT", "usize")?.unwrap_or(self.max_concurrent),
            min_interval_ms: env_parse("MIN_INTERVAL_MS", "u64")?.unwrap_or(self.min_interval_ms),
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS", "u64")?
                .unwrap_or(self.request_timeout_secs),
            batch_size: env_parse("BATCH_SIZE", "usize")?.unwrap_or(self.batch_size),
            cache_namespace: env_string("CACHE_NAMESPACE").unwrap_or(self.cache_namespace),
            cache_dir: env_string("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(self.cache_dir),
            preview_classes: self.preview_classes,
            preview_class_fragments: self.preview_class_fragments,
            preview_roles: self.preview_roles,
            verbose_logging: env_parse("VERBOSE_LOGGING", "bool")?.unwrap_or(self.verbose_logging),
        };
        config.validate()?;
        Ok(config)
    }

    /// 检查配置值
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent == 0 {
            return Err(ConfigError::invalid("max_concurrent", "必须大于 0"));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::invalid("batch_size", "必须大于 0"));
        }
        if self.api_origin.trim_end_matches('/').is_empty() {
            return Err(ConfigError::invalid("api_origin", "不能为空"));
        }
        Ok(())
    }

    /// 去掉末尾斜杠的站点源
    pub fn origin(&self) -> &str {
        self.api_origin.trim_end_matches('/')
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn env_string(var_name: &str) -> Option<String> {
    std::env::var(var_name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(
    var_name: &str,
    expected_type: &str,
) -> Result<Option<T>, ConfigError> {
    match env_string(var_name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
    }
}
