use async_trait::async_trait;

use crate::transport::{TransportRequest, TransportResult};

/// Herald 请求拦截器接口
///
/// 只作用于真实发送的请求，命中 mock 时不会被调用：
/// - `before_request` 按注册顺序执行，可以改写头部与请求体
/// - `after_response` 按注册的逆序执行
///
/// 任一环节返回 `Err` 都会被当作传输错误交给 worker 处理。
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// 请求前处理
    async fn before_request(&self, request: TransportRequest) -> anyhow::Result<TransportRequest>;

    /// 响应后处理
    async fn after_response(&self, result: TransportResult) -> anyhow::Result<TransportResult>;
}

/// 空拦截器实现，用于测试和默认情况
#[derive(Debug, Default)]
pub struct NoOpInterceptor;

#[async_trait]
impl Interceptor for NoOpInterceptor {
    async fn before_request(&self, request: TransportRequest) -> anyhow::Result<TransportRequest> {
        Ok(request)
    }

    async fn after_response(&self, result: TransportResult) -> anyhow::Result<TransportResult> {
        Ok(result)
    }
}

/// 为每个请求附加固定头部
#[derive(Debug, Default, Clone)]
pub struct HeaderInterceptor {
    headers: Vec<(String, String)>,
}

impl HeaderInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[async_trait]
impl Interceptor for HeaderInterceptor {
    async fn before_request(
        &self,
        mut request: TransportRequest,
    ) -> anyhow::Result<TransportRequest> {
        for (name, value) in &self.headers {
            request.set_header(name.as_str(), value.as_str());
        }
        Ok(request)
    }

    async fn after_response(&self, result: TransportResult) -> anyhow::Result<TransportResult> {
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HttpMethod;

    #[tokio::test]
    async fn test_no_op_interceptor() {
        let interceptor = NoOpInterceptor;
        let mut request = TransportRequest::new(HttpMethod::Post, "http://api.test/x");
        request.body = vec![1, 2, 3];

        let modified = interceptor.before_request(request).await.unwrap();
        assert_eq!(modified.body, vec![1, 2, 3]);

        let result = TransportResult::ok("http://api.test/x", 200, "ok");
        let after = interceptor.after_response(result.clone()).await.unwrap();
        assert_eq!(after, result);
    }

    #[tokio::test]
    async fn test_header_interceptor_sets_headers() {
        let interceptor = HeaderInterceptor::new()
            .header("X-Api-Key", "secret")
            .header("Accept-Language", "en");
        let mut request = TransportRequest::new(HttpMethod::Get, "http://api.test/x");
        request.set_header("x-api-key", "old");

        let modified = interceptor.before_request(request).await.unwrap();
        assert_eq!(modified.header("X-Api-Key"), Some("secret"));
        assert_eq!(modified.header("Accept-Language"), Some("en"));
        assert_eq!(modified.headers.len(), 2);
    }
}
