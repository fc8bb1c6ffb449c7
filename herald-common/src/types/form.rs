use std::collections::BTreeMap;

use super::http::ContentType;

/// 查询参数，按键排序以保证编码结果稳定
pub type Query = BTreeMap<String, String>;

/// 表单字段
pub type Form = BTreeMap<String, String>;

/// 按 `application/x-www-form-urlencoded` 编码键值对
pub fn encode_form(form: &Form) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(form.iter())
        .finish()
}

/// multipart/form-data 请求体构建器
///
/// 分隔符默认随机生成，`Content-Type` 头部需携带同一个分隔符。
pub struct Multipart {
    boundary: String,
    body: Vec<u8>,
}

impl Multipart {
    pub fn new() -> Self {
        Self::with_boundary(generate_boundary())
    }

    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            body: Vec::new(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// 追加文本字段
    pub fn text(&mut self, name: &str, value: &str) -> &mut Self {
        self.open_section(name);
        self.body.extend_from_slice(b"\r\n");
        self.body.extend_from_slice(value.as_bytes());
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// 追加带内容类型的数据段
    pub fn part(&mut self, name: &str, content_type: &str, data: &[u8]) -> &mut Self {
        self.open_section(name);
        self.body
            .extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// 写入结束分隔符，返回内容类型和请求体
    pub fn finish(mut self) -> (ContentType, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            ContentType::FormMultipart {
                boundary: self.boundary,
            },
            self.body,
        )
    }

    fn open_section(&mut self, name: &str) {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n",
                self.boundary, name
            )
            .as_bytes(),
        );
    }
}

impl Default for Multipart {
    fn default() -> Self {
        Self::new()
    }
}

fn generate_boundary() -> String {
    let token: String = (0..32).map(|_| fastrand::alphanumeric()).collect();
    format!("herald-{token}")
}
