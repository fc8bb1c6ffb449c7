use proc_macro2::Ident;
use syn::parse::{Parse, ParseStream};
use syn::{LitStr, Token, Type};

/// 响应体的解码方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Text,
    Texture,
}

impl Parse for Format {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let ident: Ident = input.parse()?;
        match ident.to_string().as_str() {
            "json" => Ok(Format::Json),
            "text" => Ok(Format::Text),
            "texture" => Ok(Format::Texture),
            _ => Err(syn::Error::new_spanned(
                ident,
                "format must be one of 'json', 'text', or 'texture'",
            )),
        }
    }
}

/// `#[worker(...)]` 的参数
pub struct WorkerArgs {
    pub key: Option<LitStr>,
    pub request: Type,
    pub response: Type,
    pub format: Format,
}

impl Parse for WorkerArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut key = None;
        let mut request = None;
        let mut response = None;
        let mut format = None;

        // 类型参数不是合法的表达式，不能走 Meta 解析，逐项读取 `name = value`
        while !input.is_empty() {
            let name: Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            match name.to_string().as_str() {
                "key" => {
                    let lit: LitStr = input.parse()?;
                    if lit.value().is_empty() {
                        return Err(syn::Error::new_spanned(lit, "key must not be empty"));
                    }
                    key = Some(lit);
                }
                "request" => request = Some(input.parse::<Type>()?),
                "response" => response = Some(input.parse::<Type>()?),
                "format" => format = Some(input.parse::<Format>()?),
                _ => {
                    return Err(syn::Error::new_spanned(
                        name,
                        "Only 'key', 'request', 'response', or 'format' are supported",
                    ));
                }
            }

            if input.is_empty() {
                break;
            }
            input.parse::<Token![,]>()?;
        }

        let request = request
            .ok_or_else(|| syn::Error::new(input.span(), "Missing required 'request' parameter"))?;
        let response = response
            .ok_or_else(|| syn::Error::new(input.span(), "Missing required 'response' parameter"))?;

        Ok(WorkerArgs {
            key,
            request,
            response,
            format: format.unwrap_or(Format::Json),
        })
    }
}

pub fn parse_worker_args(input: ParseStream) -> syn::Result<WorkerArgs> {
    WorkerArgs::parse(input)
}
