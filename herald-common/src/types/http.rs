use std::fmt;

/// HTTP 方法枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// 返回HTTP方法的字符串表示
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// 转换为 reqwest 使用的方法
    pub fn to_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 内容类型枚举
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentType {
    Json,
    FormUrlEncoded,
    /// 带分隔符的 multipart 表单
    FormMultipart { boundary: String },
    Png,
}

impl ContentType {
    /// 返回 `Content-Type` 头部的值
    pub fn header_value(&self) -> String {
        match self {
            ContentType::Json => "application/json".to_string(),
            ContentType::FormUrlEncoded => "application/x-www-form-urlencoded".to_string(),
            ContentType::FormMultipart { boundary } => {
                format!("multipart/form-data; boundary={boundary}")
            }
            ContentType::Png => "image/png".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_method_as_str() {
        assert_eq!(HttpMethod::Get.as_str(), "GET");
        assert_eq!(HttpMethod::Post.as_str(), "POST");
        assert_eq!(HttpMethod::Put.as_str(), "PUT");
        assert_eq!(HttpMethod::Delete.as_str(), "DELETE");
    }

    #[test]
    fn test_http_method_to_reqwest() {
        assert_eq!(HttpMethod::Get.to_reqwest(), reqwest::Method::GET);
        assert_eq!(HttpMethod::Delete.to_reqwest(), reqwest::Method::DELETE);
    }

    #[test]
    fn test_content_type_header_value() {
        assert_eq!(ContentType::Json.header_value(), "application/json");
        assert_eq!(
            ContentType::FormUrlEncoded.header_value(),
            "application/x-www-form-urlencoded"
        );
        let multipart = ContentType::FormMultipart {
            boundary: "abc".to_string(),
        };
        assert_eq!(multipart.header_value(), "multipart/form-data; boundary=abc");
        assert_eq!(ContentType::Png.header_value(), "image/png");
    }
}
