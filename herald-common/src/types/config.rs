use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// 默认基础地址
pub const DEFAULT_BASE_URL: &str = "http://localhost/";

/// 默认认证头前缀
pub const DEFAULT_AUTH_PREFIX: &str = "JWT";

/// 客户端配置
///
/// 所有字段都有默认值，JSON 中缺失的字段沿用默认值：
///
/// ```
/// use herald_common::ClientConfig;
///
/// let config = ClientConfig::from_json(r#"{"base_url": "http://api.test/"}"#).unwrap();
/// assert_eq!(config.auth_prefix, "JWT");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// 相对端点拼接所用的基础地址
    pub base_url: String,
    /// `Authorization` 头部中令牌前的前缀
    pub auth_prefix: String,
    /// 可写数据目录，FILE 模式下载的 mock 文件缓存在这里
    pub data_dir: PathBuf,
    /// 随应用分发的只读资源目录
    pub assets_dir: PathBuf,
    /// FILE 模式回退下载的超时时间
    #[serde(rename = "mock_fetch_timeout_ms", with = "millis")]
    pub mock_fetch_timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_prefix: DEFAULT_AUTH_PREFIX.to_string(),
            data_dir: PathBuf::from("data"),
            assets_dir: PathBuf::from("assets"),
            mock_fetch_timeout: Duration::from_secs(30),
            user_agent: concat!("herald/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// 以指定基础地址创建配置
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// 从 JSON 文本解析配置
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("Invalid client configuration")
    }

    pub fn with_auth_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.auth_prefix = prefix.into();
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_assets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.assets_dir = dir.into();
        self
    }

    pub fn with_mock_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.mock_fetch_timeout = timeout;
        self
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost/");
        assert_eq!(config.auth_prefix, "JWT");
        assert_eq!(config.mock_fetch_timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("herald/"));
    }

    #[test]
    fn test_from_json_partial() {
        let config = ClientConfig::from_json(
            r#"{"base_url": "http://api.test/", "auth_prefix": "Bearer", "mock_fetch_timeout_ms": 250}"#,
        )
        .unwrap();
        assert_eq!(config.base_url, "http://api.test/");
        assert_eq!(config.auth_prefix, "Bearer");
        assert_eq!(config.mock_fetch_timeout, Duration::from_millis(250));
        assert_eq!(config.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(ClientConfig::from_json("{\"base_url\": 5}").is_err());
    }

    #[test]
    fn test_builders() {
        let config = ClientConfig::new("http://x/")
            .with_auth_prefix("Bearer")
            .with_data_dir("/tmp/d")
            .with_assets_dir("/tmp/a")
            .with_mock_fetch_timeout(Duration::from_millis(5));
        assert_eq!(config.base_url, "http://x/");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/d"));
        assert_eq!(config.assets_dir, PathBuf::from("/tmp/a"));
        assert_eq!(config.mock_fetch_timeout, Duration::from_millis(5));
    }
}
