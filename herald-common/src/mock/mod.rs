//! Mock 存储
//!
//! 以字符串键保存预置的响应文本。命中时调度器跳过真实请求，
//! 直接用预置文本作为响应体。
//!
//! 数据来源由 [`MockResource`] 决定：
//!
//! | 模式          | 行为                                               |
//! |---------------|----------------------------------------------------|
//! | `None`        | 清空查找表，所有请求走网络                          |
//! | `Memory`      | 调用方通过 `put`/`remove` 自行维护                  |
//! | `File`        | 从本地清单加载，值为文件引用时替换为文件内容          |
//! | `RemoteFile`  | 从 URL 加载清单，以 `json` 结尾的值在后台二次下载     |
//!
//! 加载失败不会报错，只会记录日志并退回 `None`。

mod loader;
mod manifest;

pub use manifest::{MockEntry, MockManifest};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::sync::{read, write};
use crate::transport::Fetcher;
use crate::types::{ClientConfig, HttpMethod};
use loader::LocalSource;

/// mock 数据来源
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MockResource {
    #[default]
    None,
    Memory,
    File,
    RemoteFile,
}

#[derive(Debug, Default)]
struct MockState {
    mode: MockResource,
    table: Option<HashMap<String, String>>,
    /// 每次 configure 递增，过期的后台下载结果会被丢弃
    generation: u64,
}

/// 一次 configure 的结果
#[derive(Debug)]
pub struct MockReport {
    /// 实际生效的模式，加载失败时为 `None`
    pub mode: MockResource,
    pub entries: usize,
    pub pending: PendingFetches,
}

/// 尚未完成的二次下载
///
/// 丢弃该值不会取消下载。
#[derive(Debug, Default)]
pub struct PendingFetches {
    handles: Vec<JoinHandle<()>>,
}

impl PendingFetches {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// 等待全部二次下载结束
    pub async fn wait(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                log::warn!("Mock download task failed: {}", e);
            }
        }
    }
}

/// 按优先级生成 mock 查找键：worker 键、`<VERB>:<endpoint>`、`<VERB>:<url>`
pub fn candidate_keys(
    worker_key: &str,
    method: HttpMethod,
    endpoint: &str,
    url: &str,
) -> Vec<String> {
    let mut keys = vec![worker_key.to_string(), format!("{method}:{endpoint}")];
    if url != endpoint {
        keys.push(format!("{method}:{url}"));
    }
    keys
}

/// mock 查找表及其加载逻辑
#[derive(Clone)]
pub struct MockStore {
    state: Arc<RwLock<MockState>>,
    fetcher: Arc<dyn Fetcher>,
    data_dir: PathBuf,
    assets_dir: PathBuf,
    fetch_timeout: Duration,
}

impl MockStore {
    pub fn new(config: &ClientConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            state: Arc::new(RwLock::new(MockState::default())),
            fetcher,
            data_dir: config.data_dir.clone(),
            assets_dir: config.assets_dir.clone(),
            fetch_timeout: config.mock_fetch_timeout,
        }
    }

    pub fn mode(&self) -> MockResource {
        read(&self.state).mode
    }

    /// 切换数据来源并重新加载
    ///
    /// 即使模式未变也会重新加载；`Memory` 模式只在查找表不存在时新建，
    /// 已有条目保持不变。`source` 在 `File` 模式下是路径，
    /// 在 `RemoteFile` 模式下是 URL，其他模式忽略。
    pub async fn configure(&self, mode: MockResource, source: &str) -> MockReport {
        let generation = {
            let mut state = write(&self.state);
            state.generation += 1;
            state.generation
        };
        let mut pending = PendingFetches::default();

        let outcome = match mode {
            MockResource::None => {
                self.install(generation, MockResource::None, None);
                Ok(())
            }
            MockResource::Memory => {
                let mut state = write(&self.state);
                state.mode = MockResource::Memory;
                state.table.get_or_insert_with(HashMap::new);
                Ok(())
            }
            MockResource::File => self.load_file(source).await.map(|table| {
                self.install(generation, MockResource::File, Some(table));
            }),
            MockResource::RemoteFile => self.load_remote(source, generation, &mut pending).await,
        };

        if let Err(e) = outcome {
            log::warn!(
                "Mock source '{}' for {:?} unavailable, mocks disabled: {:#}",
                source,
                mode,
                e
            );
            self.install(generation, MockResource::None, None);
        }

        let state = read(&self.state);
        log::info!(
            "Mock resource is {:?} with {} entries",
            state.mode,
            state.table.as_ref().map_or(0, HashMap::len)
        );
        MockReport {
            mode: state.mode,
            entries: state.table.as_ref().map_or(0, HashMap::len),
            pending,
        }
    }

    /// 新增或覆盖一条 mock；`None` 模式下没有查找表，返回 `false`
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) -> bool {
        match write(&self.state).table.as_mut() {
            Some(table) => {
                table.insert(key.into(), value.into());
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        write(&self.state).table.as_mut()?.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        read(&self.state).table.as_ref()?.get(key).cloned()
    }

    /// 依次尝试候选键，返回第一个命中的值
    pub fn lookup<I, K>(&self, candidates: I) -> Option<String>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let state = read(&self.state);
        let table = state.table.as_ref()?;
        candidates.into_iter().find_map(|key| {
            let key = key.as_ref();
            table.get(key).map(|value| {
                log::debug!("Mock '{}' selected", key);
                value.clone()
            })
        })
    }

    /// 当前全部条目，按键排序
    pub fn entries(&self) -> Vec<(String, String)> {
        let state = read(&self.state);
        let mut entries: Vec<_> = state
            .table
            .iter()
            .flatten()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        entries.sort();
        entries
    }

    fn install(
        &self,
        generation: u64,
        mode: MockResource,
        table: Option<HashMap<String, String>>,
    ) {
        let mut state = write(&self.state);
        if state.generation != generation {
            log::debug!("Discarding stale mock load for {:?}", mode);
            return;
        }
        state.mode = mode;
        state.table = table;
    }

    async fn load_file(&self, path: &str) -> anyhow::Result<HashMap<String, String>> {
        let source = LocalSource {
            data_dir: &self.data_dir,
            assets_dir: &self.assets_dir,
            fetcher: self.fetcher.as_ref(),
            timeout: self.fetch_timeout,
        };
        source.load_table(path).await
    }

    async fn load_remote(
        &self,
        url: &str,
        generation: u64,
        pending: &mut PendingFetches,
    ) -> anyhow::Result<()> {
        let bytes = self.fetcher.fetch(url).await?;
        let table = MockManifest::parse(&bytes)
            .with_context(|| format!("Invalid mock manifest at {url}"))?
            .into_table();

        let references: Vec<(String, String)> = table
            .iter()
            .filter(|(_, value)| loader::is_json_reference(value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        self.install(generation, MockResource::RemoteFile, Some(table));

        for (key, reference) in references {
            let state = Arc::clone(&self.state);
            let fetcher = Arc::clone(&self.fetcher);
            pending.handles.push(tokio::spawn(async move {
                match fetcher.fetch(&reference).await {
                    Ok(body) => {
                        let mut state = write(&state);
                        if state.generation != generation {
                            return;
                        }
                        if let Some(table) = state.table.as_mut() {
                            table.insert(key, String::from_utf8_lossy(&body).into_owned());
                        }
                    }
                    Err(e) => log::warn!("Mock '{}' not resolved from {}: {:#}", key, reference, e),
                }
            }));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::sync::Notify;

    /// 按 URL 返回预置内容的下载桩
    #[derive(Default)]
    struct StubFetcher {
        responses: HashMap<String, Vec<u8>>,
        /// 设置后，非清单的 `.json` 下载会阻塞到收到通知
        gate: Option<Arc<Notify>>,
    }

    impl StubFetcher {
        fn with(mut self, url: &str, body: &str) -> Self {
            self.responses.insert(url.to_string(), body.as_bytes().to_vec());
            self
        }
    }

    #[async_trait]
    impl Fetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>> {
            if url.ends_with(".json") && !url.contains("manifest") {
                if let Some(gate) = &self.gate {
                    gate.notified().await;
                }
            }
            self.responses
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("404 {url}"))
        }
    }

    fn store_in(dir: &std::path::Path, fetcher: StubFetcher) -> MockStore {
        let config = ClientConfig::default()
            .with_data_dir(dir.join("data"))
            .with_assets_dir(dir.join("assets"))
            .with_mock_fetch_timeout(Duration::from_millis(200));
        MockStore::new(&config, Arc::new(fetcher))
    }

    #[test]
    fn test_candidate_keys_order() {
        assert_eq!(
            candidate_keys("AuthWorker", HttpMethod::Post, "auth/login", "http://api.test/auth/login"),
            vec![
                "AuthWorker".to_string(),
                "POST:auth/login".to_string(),
                "POST:http://api.test/auth/login".to_string(),
            ]
        );
        assert_eq!(
            candidate_keys("W", HttpMethod::Get, "http://x/a", "http://x/a").len(),
            2
        );
    }

    #[tokio::test]
    async fn test_memory_mode_keeps_edits_on_reconfigure() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path(), StubFetcher::default());

        assert!(!store.put("k", "v"));
        let report = store.configure(MockResource::Memory, "").await;
        assert_eq!(report.mode, MockResource::Memory);
        assert!(store.put("POST:auth/login", "{\"Token\":\"mocked\"}"));

        let report = store.configure(MockResource::Memory, "").await;
        assert_eq!(report.entries, 1);
        assert_eq!(
            store.get("POST:auth/login").as_deref(),
            Some("{\"Token\":\"mocked\"}")
        );

        assert_eq!(store.remove("POST:auth/login").as_deref(), Some("{\"Token\":\"mocked\"}"));
        assert!(store.entries().is_empty());
    }

    #[tokio::test]
    async fn test_none_clears_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path(), StubFetcher::default());
        store.configure(MockResource::Memory, "").await;
        store.put("k", "v");

        let report = store.configure(MockResource::None, "").await;
        assert_eq!(report.mode, MockResource::None);
        assert_eq!(report.entries, 0);
        assert_eq!(store.get("k"), None);
        assert_eq!(store.lookup(["k"]), None);
    }

    #[tokio::test]
    async fn test_lookup_prefers_earlier_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path(), StubFetcher::default());
        store.configure(MockResource::Memory, "").await;
        store.put("FooWorker", "by-key");
        store.put("GET:/foo", "by-endpoint");

        assert_eq!(
            store.lookup(["FooWorker", "GET:/foo"]).as_deref(),
            Some("by-key")
        );
        assert_eq!(
            store.lookup(["BarWorker", "GET:/foo"]).as_deref(),
            Some("by-endpoint")
        );
        assert_eq!(store.lookup(["BarWorker", "GET:/bar"]), None);
    }

    #[tokio::test]
    async fn test_file_mode_resolves_references_through_search_order() {
        let dir = tempfile::tempdir().unwrap();
        let assets = dir.path().join("assets");
        let data = dir.path().join("data");
        std::fs::create_dir_all(assets.join("mocks")).unwrap();
        std::fs::create_dir_all(&data).unwrap();

        std::fs::write(
            assets.join("manifest.json"),
            r#"{"Mocks":[
                {"Key":"AuthWorker","Value":"mocks/login.json"},
                {"Key":"GET:profile","Value":"profile.json"},
                {"Key":"GET:remote","Value":"http://cdn.test/remote.json"}
            ]}"#,
        )
        .unwrap();
        std::fs::write(assets.join("mocks/login.json"), "{\"Token\":\"from-assets\"}").unwrap();
        std::fs::write(data.join("profile.json"), "{\"name\":\"from-data\"}").unwrap();

        let store = store_in(dir.path(), StubFetcher::default());
        let report = store.configure(MockResource::File, "manifest.json").await;

        assert_eq!(report.mode, MockResource::File);
        assert_eq!(report.entries, 3);
        assert_eq!(
            store.get("AuthWorker").as_deref(),
            Some("{\"Token\":\"from-assets\"}")
        );
        assert_eq!(
            store.get("GET:profile").as_deref(),
            Some("{\"name\":\"from-data\"}")
        );
        assert_eq!(
            store.get("GET:remote").as_deref(),
            Some("http://cdn.test/remote.json")
        );
    }

    #[tokio::test]
    async fn test_file_mode_literal_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let literal = dir.path().join("literal.json");
        std::fs::write(&literal, r#"[{"Key":"k","Value":"http://x/v"}]"#).unwrap();

        let store = store_in(dir.path(), StubFetcher::default());
        let report = store
            .configure(MockResource::File, literal.to_str().unwrap())
            .await;
        assert_eq!(report.mode, MockResource::File);
        assert_eq!(store.get("k").as_deref(), Some("http://x/v"));
    }

    #[tokio::test]
    async fn test_file_mode_downloads_and_caches_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StubFetcher::default().with(
            "http://cdn.test/manifest.json",
            r#"[{"Key":"k","Value":"http://cdn.test/v"}]"#,
        );
        let store = store_in(dir.path(), fetcher);

        let report = store
            .configure(MockResource::File, "http://cdn.test/manifest.json")
            .await;
        assert_eq!(report.mode, MockResource::File);
        assert_eq!(store.get("k").as_deref(), Some("http://cdn.test/v"));

        let cached = dir.path().join("data").join("http://cdn.test/manifest.json");
        assert!(cached.exists());
    }

    #[tokio::test]
    async fn test_file_mode_missing_manifest_demotes_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path(), StubFetcher::default());
        store.configure(MockResource::Memory, "").await;
        store.put("k", "v");

        let report = store.configure(MockResource::File, "missing.json").await;
        assert_eq!(report.mode, MockResource::None);
        assert_eq!(store.mode(), MockResource::None);
        assert_eq!(store.get("k"), None);
    }

    #[tokio::test]
    async fn test_file_mode_download_timeout_demotes_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StubFetcher {
            gate: Some(Arc::new(Notify::new())),
            ..Default::default()
        };
        let store = store_in(dir.path(), fetcher);

        let report = store
            .configure(MockResource::File, "http://cdn.test/stalled.json")
            .await;
        assert_eq!(report.mode, MockResource::None);
    }

    #[tokio::test]
    async fn test_remote_mode_replaces_json_references_in_background() {
        let dir = tempfile::tempdir().unwrap();
        let gate = Arc::new(Notify::new());
        let fetcher = StubFetcher {
            gate: Some(gate.clone()),
            ..Default::default()
        }
        .with(
            "http://cdn.test/manifest",
            r#"{"Mocks":[
                {"Key":"AuthWorker","Value":"http://cdn.test/login.json"},
                {"Key":"GET:ping","Value":"pong"}
            ]}"#,
        )
        .with("http://cdn.test/login.json", "{\"Token\":\"remote\"}");
        let store = store_in(dir.path(), fetcher);

        let report = store
            .configure(MockResource::RemoteFile, "http://cdn.test/manifest")
            .await;
        assert_eq!(report.mode, MockResource::RemoteFile);
        assert_eq!(report.pending.len(), 1);
        assert_eq!(store.get("GET:ping").as_deref(), Some("pong"));
        assert_eq!(
            store.get("AuthWorker").as_deref(),
            Some("http://cdn.test/login.json")
        );

        gate.notify_one();
        report.pending.wait().await;
        assert_eq!(
            store.get("AuthWorker").as_deref(),
            Some("{\"Token\":\"remote\"}")
        );
    }

    #[tokio::test]
    async fn test_remote_mode_failed_manifest_demotes_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StubFetcher::default();
        let store = store_in(dir.path(), fetcher);

        let report = store
            .configure(MockResource::RemoteFile, "http://cdn.test/absent")
            .await;
        assert_eq!(report.mode, MockResource::None);
        assert!(report.pending.is_empty());
    }

    #[tokio::test]
    async fn test_remote_download_discarded_after_reconfigure() {
        let dir = tempfile::tempdir().unwrap();
        let gate = Arc::new(Notify::new());
        let fetcher = StubFetcher {
            gate: Some(gate.clone()),
            ..Default::default()
        }
        .with(
            "http://cdn.test/manifest",
            r#"[{"Key":"k","Value":"http://cdn.test/v.json"}]"#,
        )
        .with("http://cdn.test/v.json", "resolved");
        let store = store_in(dir.path(), fetcher);

        let report = store
            .configure(MockResource::RemoteFile, "http://cdn.test/manifest")
            .await;
        store.configure(MockResource::Memory, "").await;
        store.put("k", "edited");

        gate.notify_one();
        report.pending.wait().await;
        assert_eq!(store.get("k").as_deref(), Some("edited"));
    }

    #[tokio::test]
    async fn test_entries_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StubFetcher::default();
        let store = store_in(dir.path(), fetcher);
        store.configure(MockResource::Memory, "").await;
        store.put("b", "2");
        store.put("a", "1");
        assert_eq!(
            store.entries(),
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string())
            ]
        );
    }
}
