//! herald 运行时
//!
//! 声明一个端点、请求类型、响应类型和一个 worker，剩下的交给调度器：
//! 序列化、授权头、发送、进度回调、反序列化，以及按键查找的 mock 替换。
//!
//! 入口是 [`HttpController`]；worker 契约见 [`worker`] 模块。

pub mod dispatch;
pub mod endpoint;
pub mod interceptor;
pub mod mock;
pub mod store;
pub mod token;
pub mod transport;
pub mod types;
pub mod worker;

mod sync;

pub use dispatch::{ControllerBuilder, Dispatcher, HttpController};
pub use interceptor::{HeaderInterceptor, Interceptor, NoOpInterceptor};
pub use mock::{MockReport, MockResource, MockStore, PendingFetches};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
pub use token::TokenStore;
pub use transport::{Fetcher, ReqwestTransport, Transport, TransportRequest, TransportResult};
pub use types::{ClientConfig, Form, Multipart, Query, Texture, Token};
pub use worker::{Worker, WorkerContract};

/// 供 `#[worker]` 宏生成的代码使用
#[doc(hidden)]
pub mod __private {
    pub use anyhow;
    pub use serde_json;
}
