//! 传输层协作者
//!
//! 调度器只依赖这里的 `Transport` 与 `Fetcher` 两个 trait，
//! 生产环境使用基于 reqwest 的 [`ReqwestTransport`]，测试中可替换为桩实现。

mod reqwest_transport;

pub use reqwest_transport::ReqwestTransport;

use async_trait::async_trait;
use std::borrow::Cow;
use tokio::sync::watch;

use crate::types::HttpMethod;

/// 待发送的请求
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl TransportRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// 按名称查找头部（不区分大小写）
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// 设置头部，已存在的同名头部会被替换
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|(key, _)| !key.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
    }
}

/// 传输结果
///
/// `error` 非空即视为传输失败；HTTP 4xx/5xx 也以错误文本的形式上报，
/// 同时保留响应体，供 400 的业务错误使用。
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResult {
    pub status: u16,
    pub error: Option<String>,
    pub body: Vec<u8>,
    /// 实际请求的地址
    pub url: String,
}

impl TransportResult {
    pub fn ok(url: impl Into<String>, status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            error: None,
            body: body.into(),
            url: url.into(),
        }
    }

    pub fn failed(url: impl Into<String>, status: u16, error: impl Into<String>) -> Self {
        Self {
            status,
            error: Some(error.into()),
            body: Vec::new(),
            url: url.into(),
        }
    }

    /// mock 命中时代替真实响应
    pub fn mocked(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self::ok(url, 200, text.into().into_bytes())
    }

    pub fn is_error(&self) -> bool {
        self.error.as_deref().is_some_and(|error| !error.is_empty())
    }

    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// 上传与下载进度，取值 0.0-1.0
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransferProgress {
    pub upload: f32,
    pub download: f32,
}

impl TransferProgress {
    /// 上传和下载进度的平均值
    pub fn ratio(&self) -> f32 {
        ((self.upload + self.download) / 2.0).clamp(0.0, 1.0)
    }
}

/// 传输实现向调度器报告进度的通道
#[derive(Debug, Clone)]
pub struct ProgressSink {
    sender: Option<watch::Sender<TransferProgress>>,
}

impl ProgressSink {
    pub(crate) fn channel() -> (Self, watch::Receiver<TransferProgress>) {
        let (sender, receiver) = watch::channel(TransferProgress::default());
        (
            Self {
                sender: Some(sender),
            },
            receiver,
        )
    }

    /// 不关心进度时使用
    pub fn detached() -> Self {
        Self { sender: None }
    }

    pub fn upload(&self, fraction: f32) {
        if let Some(sender) = &self.sender {
            sender.send_modify(|progress| progress.upload = fraction.clamp(0.0, 1.0));
        }
    }

    pub fn download(&self, fraction: f32) {
        if let Some(sender) = &self.sender {
            sender.send_modify(|progress| progress.download = fraction.clamp(0.0, 1.0));
        }
    }
}

/// HTTP 传输
#[async_trait]
pub trait Transport: Send + Sync {
    /// 发送请求；失败不返回 `Err`，而是写入结果的 `error` 字段
    async fn send(&self, request: TransportRequest, progress: ProgressSink) -> TransportResult;
}

/// 获取远程资源（mock 清单及其引用的文件）
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_header_replaces_case_insensitive() {
        let mut request = TransportRequest::new(HttpMethod::Get, "http://api.test/");
        request.set_header("content-type", "text/plain");
        request.set_header("Content-Type", "application/json");
        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.header("CONTENT-TYPE"), Some("application/json"));
        assert_eq!(request.header("Authorization"), None);
    }

    #[test]
    fn test_result_error_detection() {
        assert!(!TransportResult::ok("u", 200, "x").is_error());
        assert!(TransportResult::failed("u", 0, "dns").is_error());

        let mut empty_error = TransportResult::ok("u", 200, "x");
        empty_error.error = Some(String::new());
        assert!(!empty_error.is_error());
    }

    #[test]
    fn test_progress_ratio_is_mean() {
        let progress = TransferProgress {
            upload: 1.0,
            download: 0.5,
        };
        assert_eq!(progress.ratio(), 0.75);
        assert_eq!(TransferProgress::default().ratio(), 0.0);
    }

    #[test]
    fn test_progress_sink_updates_receiver() {
        let (sink, receiver) = ProgressSink::channel();
        sink.upload(1.0);
        sink.download(2.0);
        let progress = *receiver.borrow();
        assert_eq!(progress.upload, 1.0);
        assert_eq!(progress.download, 1.0);

        ProgressSink::detached().upload(0.5);
    }
}
