use anyhow::{Context, anyhow};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::manifest::MockManifest;
use crate::transport::Fetcher;

/// 本地 mock 文件的查找与回退下载
///
/// 查找顺序：原始路径、可写数据目录、资源目录。
/// 都不存在时把路径当作 URL 下载，并缓存到可写数据目录。
pub(crate) struct LocalSource<'a> {
    pub data_dir: &'a Path,
    pub assets_dir: &'a Path,
    pub fetcher: &'a dyn Fetcher,
    pub timeout: Duration,
}

impl LocalSource<'_> {
    fn candidates(&self, path: &str) -> [PathBuf; 3] {
        [
            PathBuf::from(path),
            self.data_dir.join(path),
            self.assets_dir.join(path),
        ]
    }

    pub async fn read(&self, path: &str) -> anyhow::Result<Vec<u8>> {
        for candidate in self.candidates(path) {
            if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
                log::debug!("Loading mock file {}", candidate.display());
                return tokio::fs::read(&candidate)
                    .await
                    .with_context(|| format!("Failed to read {}", candidate.display()));
            }
        }

        let bytes = tokio::time::timeout(self.timeout, self.fetcher.fetch(path))
            .await
            .map_err(|_| anyhow!("Timed out after {:?} downloading {}", self.timeout, path))?
            .with_context(|| format!("{path} not found locally and could not be downloaded"))?;

        let cached = self.data_dir.join(path);
        if let Err(e) = write_cache(&cached, &bytes).await {
            log::warn!("Could not cache {} to {}: {:#}", path, cached.display(), e);
        }
        Ok(bytes)
    }

    /// 加载清单，并把非 URL 的值替换为其引用文件的内容
    pub async fn load_table(&self, path: &str) -> anyhow::Result<HashMap<String, String>> {
        let bytes = self.read(path).await?;
        let mut table = MockManifest::parse(&bytes)
            .with_context(|| format!("Invalid mock manifest {path}"))?
            .into_table();

        for value in table.values_mut() {
            if is_url(value) {
                continue;
            }
            match self.read(value).await {
                Ok(contents) => *value = String::from_utf8_lossy(&contents).into_owned(),
                Err(e) => log::warn!("Mock reference '{}' kept as literal text: {:#}", value, e),
            }
        }
        Ok(table)
    }
}

async fn write_cache(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

pub(crate) fn is_url(value: &str) -> bool {
    crate::endpoint::is_absolute(value)
}

/// 远程清单中需要二次下载的值
pub(crate) fn is_json_reference(value: &str) -> bool {
    value.len() >= 4
        && value
            .get(value.len() - 4..)
            .is_some_and(|suffix| suffix.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_json_reference() {
        assert!(is_json_reference("http://cdn.test/login.json"));
        assert!(is_json_reference("http://cdn.test/LOGIN.JSON"));
        assert!(!is_json_reference("{\"Token\":\"x\"}"));
        assert!(!is_json_reference("son"));
    }

    #[test]
    fn test_is_url() {
        assert!(is_url("https://cdn.test/a"));
        assert!(is_url("HTTP://cdn.test/a"));
        assert!(!is_url("mocks/login.json"));
    }
}
