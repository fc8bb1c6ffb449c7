mod args;
mod generate;

use crate::args::parse_worker_args;
use crate::generate::generate_worker_contract;
use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemStruct, parse_macro_input};

/// 为 worker 结构体生成 `herald_common::WorkerContract` 实现
///
/// ```ignore
/// #[worker(key = "AuthWorker", request = LoginRequest, response = LoginResponse)]
/// struct AuthWorker {
///     token: Option<String>,
/// }
/// ```
///
/// - `request`/`response`：请求与响应类型，必填
/// - `key`：mock 键，默认使用结构体名
/// - `format`：`json`（默认）、`text` 或 `texture`
///
/// 生命周期回调仍需手动实现 `herald_common::Worker`。
#[proc_macro_attribute]
pub fn worker(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemStruct);
    let args = parse_macro_input!(args with parse_worker_args);

    let contract = generate_worker_contract(&input, &args);

    let expanded = quote! {
        #input

        #contract
    };

    TokenStream::from(expanded)
}
