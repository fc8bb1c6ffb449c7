use quote::quote;
use syn::{ItemStruct, Type};

use crate::args::{Format, WorkerArgs};

/// 为结构体生成 `WorkerContract` 实现
///
/// mock 键未指定时使用结构体名。
pub fn generate_worker_contract(item: &ItemStruct, args: &WorkerArgs) -> proc_macro2::TokenStream {
    let name = &item.ident;
    let (impl_generics, ty_generics, where_clause) = item.generics.split_for_impl();
    let key = args
        .key
        .as_ref()
        .map(|lit| lit.value())
        .unwrap_or_else(|| name.to_string());
    let request = &args.request;
    let response = &args.response;
    let serialize = generate_serialize(request);
    let deserialize = generate_deserialize(args.format, response);

    quote! {
        impl #impl_generics ::herald_common::WorkerContract for #name #ty_generics #where_clause {
            type Request = #request;
            type Response = #response;

            fn key(&self) -> &str {
                #key
            }

            fn serialize(
                &self,
                request: &Self::Request,
            ) -> ::herald_common::__private::anyhow::Result<::std::string::String> {
                #serialize
            }

            fn deserialize(
                &self,
                body: &[u8],
            ) -> ::herald_common::__private::anyhow::Result<::core::option::Option<Self::Response>> {
                #deserialize
            }
        }
    }
}

/// 生成请求序列化代码
///
/// 纹理按 PNG 上传，不经过文本序列化；其他类型一律 JSON。
fn generate_serialize(request: &Type) -> proc_macro2::TokenStream {
    if last_ident_is(request, "Texture") {
        return quote! {
            let _ = request;
            ::core::result::Result::Err(::herald_common::__private::anyhow::anyhow!(
                "texture payloads are sent as PNG, not as text"
            ))
        };
    }
    quote! {
        ::core::result::Result::Ok(::herald_common::__private::serde_json::to_string(request)?)
    }
}

/// 生成响应反序列化代码
fn generate_deserialize(format: Format, response: &Type) -> proc_macro2::TokenStream {
    match format {
        Format::Json => quote! {
            if body.iter().all(|byte| byte.is_ascii_whitespace()) {
                return ::core::result::Result::Ok(::core::option::Option::None);
            }
            ::core::result::Result::Ok(
                ::herald_common::__private::serde_json::from_slice::<::core::option::Option<#response>>(body)?
            )
        },
        Format::Text => quote! {
            ::core::result::Result::Ok(::core::option::Option::Some(
                <#response as ::core::convert::From<::std::string::String>>::from(
                    ::std::string::String::from_utf8_lossy(body).into_owned()
                )
            ))
        },
        Format::Texture => quote! {
            ::core::result::Result::Ok(::herald_common::Texture::decode(body))
        },
    }
}

fn last_ident_is(ty: &Type, ident: &str) -> bool {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == ident),
        _ => false,
    }
}
