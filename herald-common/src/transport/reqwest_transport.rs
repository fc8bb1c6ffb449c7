use anyhow::Context;
use async_trait::async_trait;

use super::{Fetcher, ProgressSink, Transport, TransportRequest, TransportResult};
use crate::types::{ClientConfig, HttpMethod};

/// 基于 reqwest 的传输实现
///
/// reqwest 不提供上传进度，请求发出后上传进度直接记为完成；
/// 下载进度按 `Content-Length` 与已读取字节数计算。
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    /// 使用调用方已配置好的客户端
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest, progress: ProgressSink) -> TransportResult {
        let TransportRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = self.client.request(method.to_reqwest(), &url);
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !body.is_empty() || matches!(method, HttpMethod::Post | HttpMethod::Put) {
            builder = builder.body(body);
        }

        let mut response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                let status = e.status().map(|status| status.as_u16()).unwrap_or(0);
                log::warn!("{} {} failed: {}", method, url, e);
                return TransportResult::failed(url, status, e.to_string());
            }
        };
        progress.upload(1.0);

        let status = response.status();
        let final_url = response.url().to_string();
        let total = response.content_length().filter(|total| *total > 0);
        let mut bytes = Vec::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    bytes.extend_from_slice(&chunk);
                    if let Some(total) = total {
                        progress.download((bytes.len() as f64 / total as f64) as f32);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    return TransportResult {
                        status: status.as_u16(),
                        error: Some(e.to_string()),
                        body: bytes,
                        url: final_url,
                    };
                }
            }
        }
        progress.download(1.0);

        let error = if status.is_client_error() || status.is_server_error() {
            Some(format!("HTTP/1.1 {status}"))
        } else {
            None
        };
        TransportResult {
            status: status.as_u16(),
            error,
            body: bytes,
            url: final_url,
        }
    }
}

#[async_trait]
impl Fetcher for ReqwestTransport {
    async fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {url}"))?
            .error_for_status()
            .with_context(|| format!("Fetching {url} returned an error status"))?;
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read body of {url}"))?;
        Ok(bytes.to_vec())
    }
}
