use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 访问令牌
///
/// 登录成功后由调用方写入，登出时清除。不做过期校验，
/// `issued_at` 仅供调用方判断令牌是否陈旧。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub token: String,
    pub issued_at: DateTime<Utc>,
}

impl Token {
    /// 以当前时间作为签发时间创建令牌
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            issued_at: Utc::now(),
        }
    }

    /// 令牌为空字符串时不附加认证头部
    pub fn is_empty(&self) -> bool {
        self.token.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_json_shape() {
        let token = Token::new("abc123");
        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(json["token"], "abc123");
        assert!(json["issued_at"].is_string());

        let back: Token = serde_json::from_value(json).unwrap();
        assert_eq!(back, token);
    }

    #[test]
    fn test_empty_token() {
        assert!(Token::new("").is_empty());
        assert!(!Token::new("x").is_empty());
    }
}
