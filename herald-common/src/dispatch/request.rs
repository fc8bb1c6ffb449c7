use super::{Dispatcher, response};
use crate::endpoint;
use crate::mock::candidate_keys;
use crate::transport::{ProgressSink, TransportRequest, TransportResult};
use crate::types::{ContentType, Form, HttpMethod, Multipart, Query, Texture, encode_form};
use crate::worker::Worker;

/// 请求负载无法序列化
pub const SERIALIZE_ERROR: &str = "Can't serialize request.";

/// 一次调度中已构建好的请求
struct Outbound<'a> {
    method: HttpMethod,
    endpoint: &'a str,
    url: String,
    content_type: ContentType,
    body: Vec<u8>,
    /// 纹理下载不参与 mock 查找
    mockable: bool,
}

impl Dispatcher {
    /// GET，查询参数追加在 URL 上
    pub async fn get<W>(&self, endpoint: &str, query: Query, worker: W) -> W
    where
        W: Worker<Request = Query>,
    {
        self.query_request(HttpMethod::Get, endpoint, query, true, worker)
            .await
    }

    pub async fn delete<W>(&self, endpoint: &str, query: Query, worker: W) -> W
    where
        W: Worker<Request = Query>,
    {
        self.query_request(HttpMethod::Delete, endpoint, query, true, worker)
            .await
    }

    /// GET 纹理；总是走网络
    pub async fn get_texture<W>(&self, endpoint: &str, query: Query, worker: W) -> W
    where
        W: Worker<Request = Query>,
    {
        self.query_request(HttpMethod::Get, endpoint, query, false, worker)
            .await
    }

    /// POST JSON，`payload` 为空时发送空请求体
    pub async fn post<W: Worker>(&self, endpoint: &str, payload: Option<W::Request>, worker: W) -> W {
        self.json_request(HttpMethod::Post, endpoint, payload, worker)
            .await
    }

    pub async fn put<W: Worker>(&self, endpoint: &str, payload: Option<W::Request>, worker: W) -> W {
        self.json_request(HttpMethod::Put, endpoint, payload, worker)
            .await
    }

    /// POST 纹理，编码为 PNG
    pub async fn post_texture<W>(&self, endpoint: &str, texture: Texture, worker: W) -> W
    where
        W: Worker<Request = Texture>,
    {
        self.texture_request(HttpMethod::Post, endpoint, texture, worker)
            .await
    }

    pub async fn put_texture<W>(&self, endpoint: &str, texture: Texture, worker: W) -> W
    where
        W: Worker<Request = Texture>,
    {
        self.texture_request(HttpMethod::Put, endpoint, texture, worker)
            .await
    }

    /// POST `application/x-www-form-urlencoded`
    pub async fn post_form<W>(&self, endpoint: &str, form: Form, worker: W) -> W
    where
        W: Worker<Request = Form>,
    {
        self.form_request(HttpMethod::Post, endpoint, form, worker)
            .await
    }

    pub async fn put_form<W>(&self, endpoint: &str, form: Form, worker: W) -> W
    where
        W: Worker<Request = Form>,
    {
        self.form_request(HttpMethod::Put, endpoint, form, worker)
            .await
    }

    /// POST `multipart/form-data`
    ///
    /// `fields` 作为文本字段；`payload` 序列化后作为名为 `data` 的
    /// `application/json` 部分。
    pub async fn post_multipart<W: Worker>(
        &self,
        endpoint: &str,
        fields: Form,
        payload: Option<W::Request>,
        mut worker: W,
    ) -> W {
        let mut multipart = Multipart::new();
        for (name, value) in &fields {
            multipart.text(name, value);
        }
        if let Some(payload) = &payload {
            match worker.serialize(payload) {
                Ok(json) => {
                    log::debug!("POST {} multipart data: {}", endpoint, json);
                    multipart.part("data", "application/json", json.as_bytes());
                }
                Err(e) => return reject(worker, &e),
            }
        }
        let (content_type, body) = multipart.finish();
        if let Some(payload) = payload {
            worker.hold_request(payload);
        }

        let outbound = Outbound {
            method: HttpMethod::Post,
            endpoint,
            url: self.url(endpoint, None),
            content_type,
            body,
            mockable: true,
        };
        self.dispatch(outbound, worker).await
    }

    async fn query_request<W>(
        &self,
        method: HttpMethod,
        endpoint: &str,
        query: Query,
        mockable: bool,
        mut worker: W,
    ) -> W
    where
        W: Worker<Request = Query>,
    {
        let url = self.url(endpoint, Some(&query));
        worker.hold_request(query);
        let outbound = Outbound {
            method,
            endpoint,
            url,
            content_type: ContentType::Json,
            body: Vec::new(),
            mockable,
        };
        self.dispatch(outbound, worker).await
    }

    async fn json_request<W: Worker>(
        &self,
        method: HttpMethod,
        endpoint: &str,
        payload: Option<W::Request>,
        mut worker: W,
    ) -> W {
        let mut body = Vec::new();
        if let Some(payload) = payload {
            match worker.serialize(&payload) {
                Ok(json) => {
                    log::debug!("{} {} sending: {}", method, endpoint, json);
                    body = json.into_bytes();
                }
                Err(e) => return reject(worker, &e),
            }
            worker.hold_request(payload);
        }

        let outbound = Outbound {
            method,
            endpoint,
            url: self.url(endpoint, None),
            content_type: ContentType::Json,
            body,
            mockable: true,
        };
        self.dispatch(outbound, worker).await
    }

    async fn texture_request<W>(
        &self,
        method: HttpMethod,
        endpoint: &str,
        texture: Texture,
        mut worker: W,
    ) -> W
    where
        W: Worker<Request = Texture>,
    {
        let body = match texture.encode_png() {
            Ok(body) => body,
            Err(e) => return reject(worker, &e),
        };
        log::debug!(
            "{} {} sending {}x{} texture ({} bytes)",
            method,
            endpoint,
            texture.width,
            texture.height,
            body.len()
        );
        worker.hold_request(texture);

        let outbound = Outbound {
            method,
            endpoint,
            url: self.url(endpoint, None),
            content_type: ContentType::Png,
            body,
            mockable: true,
        };
        self.dispatch(outbound, worker).await
    }

    async fn form_request<W>(&self, method: HttpMethod, endpoint: &str, form: Form, mut worker: W) -> W
    where
        W: Worker<Request = Form>,
    {
        let body = encode_form(&form).into_bytes();
        log::debug!("{} {} sending form with {} fields", method, endpoint, form.len());
        worker.hold_request(form);

        let outbound = Outbound {
            method,
            endpoint,
            url: self.url(endpoint, None),
            content_type: ContentType::FormUrlEncoded,
            body,
            mockable: true,
        };
        self.dispatch(outbound, worker).await
    }

    fn url(&self, endpoint: &str, query: Option<&Query>) -> String {
        endpoint::resolve(&self.controller.config.base_url, endpoint, query)
    }

    /// 构建头部、触发 `start`，再决定使用 mock 还是真实发送
    async fn dispatch<W: Worker>(&self, outbound: Outbound<'_>, mut worker: W) -> W {
        let Outbound {
            method,
            endpoint,
            url,
            content_type,
            body,
            mockable,
        } = outbound;

        let mut request = TransportRequest::new(method, url);
        request.body = body;
        request.set_header("Content-Type", content_type.header_value());
        if let Some(token) = self.token() {
            request.set_header(
                "Authorization",
                format!("{} {}", self.controller.config.auth_prefix, token),
            );
        }

        worker.start();

        let mocked = if mockable {
            self.controller
                .mocks
                .lookup(candidate_keys(worker.key(), method, endpoint, &request.url))
        } else {
            None
        };

        let result = match mocked {
            Some(text) => {
                log::debug!("{} {} answered from mock", method, request.url);
                worker.progress(1.0);
                TransportResult::mocked(request.url, text)
            }
            None => self.transmit(request, &mut worker).await,
        };

        response::resolve(&result, &mut worker);
        worker
    }

    /// 经过拦截器发送请求，并把传输进度转发给 worker
    async fn transmit<W: Worker>(&self, request: TransportRequest, worker: &mut W) -> TransportResult {
        let url = request.url.clone();
        let interceptors = &self.controller.interceptors;

        let mut request = request;
        for interceptor in interceptors.iter() {
            request = match interceptor.before_request(request).await {
                Ok(request) => request,
                Err(e) => {
                    log::warn!("Request to {} rejected by interceptor: {:#}", url, e);
                    return TransportResult::failed(url, 0, format!("{e:#}"));
                }
            };
        }

        let (sink, mut receiver) = ProgressSink::channel();
        let send = self.controller.transport.send(request, sink);
        tokio::pin!(send);

        let mut reported = 0.0_f32;
        let mut result = loop {
            tokio::select! {
                result = &mut send => break result,
                changed = receiver.changed() => {
                    if changed.is_err() {
                        break (&mut send).await;
                    }
                    let ratio = receiver.borrow_and_update().ratio();
                    if ratio > reported {
                        reported = ratio;
                        worker.progress(ratio);
                    }
                }
            }
        };
        if reported < 1.0 {
            worker.progress(1.0);
        }

        for interceptor in interceptors.iter().rev() {
            result = match interceptor.after_response(result).await {
                Ok(result) => result,
                Err(e) => {
                    log::warn!("Response from {} rejected by interceptor: {:#}", url, e);
                    TransportResult::failed(url.as_str(), 0, format!("{e:#}"))
                }
            };
        }
        result
    }
}

fn reject<W: Worker>(mut worker: W, error: &anyhow::Error) -> W {
    log::warn!("Request payload not sent: {:#}", error);
    worker.error_processing(0, SERIALIZE_ERROR.to_string());
    worker
}
