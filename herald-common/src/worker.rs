//! Worker 契约
//!
//! 一个 worker 绑定一对请求/响应类型，并在一次调度中接收生命周期回调：
//!
//! 1. `start`：请求体与头部构建完成后、发送前调用一次
//! 2. `progress`：发送过程中调用零次或多次，取值单调不减
//! 3. `execute` 或 `error_processing`：二者恰好调用其一，且只调用一次
//!
//! 序列化部分拆分为 [`WorkerContract`]，可以由 `#[worker(...)]` 宏生成。

/// 请求/响应类型、mock 键以及编解码方式
pub trait WorkerContract {
    type Request: Send + 'static;
    type Response: Send + 'static;

    /// mock 表中优先匹配的键
    fn key(&self) -> &str;

    /// 把请求负载序列化为文本
    fn serialize(&self, request: &Self::Request) -> anyhow::Result<String>;

    /// 把响应体反序列化为响应类型
    ///
    /// `Ok(None)` 表示空结果，调度器会报告 `"Unknown Error"`；
    /// `Err` 表示响应体格式错误。
    fn deserialize(&self, body: &[u8]) -> anyhow::Result<Option<Self::Response>>;
}

/// 一次调度的回调处理者
pub trait Worker: WorkerContract + Send {
    /// 保存本次调度的请求负载
    fn hold_request(&mut self, request: Self::Request);

    fn start(&mut self);

    fn progress(&mut self, ratio: f32);

    fn execute(&mut self, response: Self::Response);

    fn error_processing(&mut self, status: u16, message: String);
}
