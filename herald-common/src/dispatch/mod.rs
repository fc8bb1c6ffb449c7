//! 请求调度
//!
//! [`HttpController`] 持有一次会话所需的全部状态：配置、传输、mock 表、
//! 令牌与拦截器。通过 `anonymous`/`authorized`/`bearer` 取得
//! [`Dispatcher`] 后按谓词发起请求。
//!
//! ```no_run
//! # use herald_common::{ClientConfig, HttpController};
//! # async fn demo() -> anyhow::Result<()> {
//! let controller = HttpController::new(ClientConfig::new("http://api.test/"))?;
//! let dispatcher = controller.authorized();
//! # let _ = dispatcher;
//! # Ok(())
//! # }
//! ```

mod request;
mod response;


pub use request::SERIALIZE_ERROR;
pub use response::{DESERIALIZE_ERROR, UNKNOWN_ERROR, resolve};

use std::sync::Arc;

use crate::interceptor::Interceptor;
use crate::mock::MockStore;
use crate::store::{KeyValueStore, MemoryStore};
use crate::token::TokenStore;
use crate::transport::{Fetcher, ReqwestTransport, Transport};
use crate::types::ClientConfig;

/// 客户端上下文
///
/// 所有字段都在 `Arc` 中，克隆代价很低，可以移动到 `tokio::spawn` 的任务里。
#[derive(Clone)]
pub struct HttpController {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
    mocks: MockStore,
    tokens: Arc<TokenStore>,
    interceptors: Arc<[Arc<dyn Interceptor>]>,
}

impl HttpController {
    /// 使用 reqwest 传输与内存键值存储创建
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: ClientConfig) -> ControllerBuilder {
        ControllerBuilder {
            config,
            transport: None,
            fetcher: None,
            store: None,
            interceptors: Vec::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn mocks(&self) -> &MockStore {
        &self.mocks
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// 不携带授权头
    pub fn anonymous(&self) -> Dispatcher {
        Dispatcher::new(self.clone(), Auth::Anonymous)
    }

    /// 发送时读取令牌存储中的令牌
    pub fn authorized(&self) -> Dispatcher {
        Dispatcher::new(self.clone(), Auth::Stored)
    }

    /// 使用调用方给出的令牌
    pub fn bearer(&self, token: impl Into<String>) -> Dispatcher {
        Dispatcher::new(self.clone(), Auth::Explicit(token.into()))
    }
}

/// [`HttpController`] 构建器，未指定的协作者使用默认实现
pub struct ControllerBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    fetcher: Option<Arc<dyn Fetcher>>,
    store: Option<Arc<dyn KeyValueStore>>,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl ControllerBuilder {
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// mock 清单的下载方式
    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// 令牌的持久化位置
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// 追加拦截器，按追加顺序执行 `before_request`
    pub fn interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn build(self) -> anyhow::Result<HttpController> {
        let config = self.config;
        let mut default_transport: Option<Arc<ReqwestTransport>> = None;
        let mut default_client = || -> anyhow::Result<Arc<ReqwestTransport>> {
            if let Some(transport) = &default_transport {
                return Ok(Arc::clone(transport));
            }
            let transport = Arc::new(ReqwestTransport::new(&config)?);
            default_transport = Some(Arc::clone(&transport));
            Ok(transport)
        };

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => default_client()? as Arc<dyn Transport>,
        };
        let fetcher: Arc<dyn Fetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => default_client()? as Arc<dyn Fetcher>,
        };
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn KeyValueStore>);

        Ok(HttpController {
            mocks: MockStore::new(&config, fetcher),
            tokens: Arc::new(TokenStore::new(store)),
            transport,
            interceptors: self.interceptors.into(),
            config: Arc::new(config),
        })
    }
}

/// 授权方式
#[derive(Debug, Clone, PartialEq, Eq)]
enum Auth {
    Anonymous,
    Stored,
    Explicit(String),
}

/// 绑定了授权方式的请求入口
#[derive(Clone)]
pub struct Dispatcher {
    controller: HttpController,
    auth: Auth,
}

impl Dispatcher {
    fn new(controller: HttpController, auth: Auth) -> Self {
        Self { controller, auth }
    }

    /// 本次请求使用的令牌文本，空令牌视为无令牌
    fn token(&self) -> Option<String> {
        let token = match &self.auth {
            Auth::Anonymous => None,
            Auth::Stored => self.controller.tokens.get().map(|token| token.token),
            Auth::Explicit(token) => Some(token.clone()),
        };
        token.filter(|token| !token.is_empty())
    }
}
