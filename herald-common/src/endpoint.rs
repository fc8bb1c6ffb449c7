//! 端点地址解析
//!
//! 相对端点拼接到基础地址之后，以 `http` 开头（不区分大小写）的端点原样使用。

use crate::types::{Query, encode_form};

/// 由基础地址、端点和可选查询参数构造目标 URL
pub fn resolve(base: &str, endpoint: &str, query: Option<&Query>) -> String {
    let mut url = if is_absolute(endpoint) {
        endpoint.to_string()
    } else {
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    };

    if let Some(query) = query.filter(|query| !query.is_empty()) {
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(&encode_form(query));
    }
    url
}

/// 端点是否已经是完整地址
pub fn is_absolute(endpoint: &str) -> bool {
    endpoint
        .get(..4)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("http"))
}

/// 解析 URL 中的查询参数
pub fn parse_query(url: &str) -> Query {
    let Some((_, query)) = url.split_once('?') else {
        return Query::new();
    };
    let query = query.split('#').next().unwrap_or_default();
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}
