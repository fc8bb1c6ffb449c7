//! 令牌存储
//!
//! 首次读取时从键值存储加载一次并缓存，之后不再访问存储，
//! 直到调用 [`TokenStore::reset`]。

use anyhow::Context;
use std::sync::{Arc, Mutex};

use crate::store::KeyValueStore;
use crate::sync::lock;
use crate::types::Token;

/// 令牌在键值存储中的键
pub const TOKEN_KEY: &str = "Token";

#[derive(Debug, Default)]
struct TokenState {
    token: Option<Token>,
    read_attempted: bool,
}

pub struct TokenStore {
    store: Arc<dyn KeyValueStore>,
    state: Mutex<TokenState>,
}

impl TokenStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            state: Mutex::new(TokenState::default()),
        }
    }

    /// 当前令牌
    pub fn get(&self) -> Option<Token> {
        let mut state = lock(&self.state);
        if !state.read_attempted {
            state.read_attempted = true;
            state.token = self.load();
        }
        state.token.clone()
    }

    /// 设置或清除令牌，并同步到键值存储
    pub fn set(&self, token: Option<Token>) -> anyhow::Result<()> {
        let mut state = lock(&self.state);
        state.read_attempted = true;
        state.token = token;
        match &state.token {
            Some(token) => {
                let json = serde_json::to_string(token)?;
                self.store
                    .set(TOKEN_KEY, &json)
                    .context("Failed to persist token")
            }
            None => self
                .store
                .delete(TOKEN_KEY)
                .context("Failed to delete persisted token"),
        }
    }

    /// 下一次 `get` 重新读取存储
    pub fn reset(&self) {
        lock(&self.state).read_attempted = false;
    }

    fn load(&self) -> Option<Token> {
        if !self.store.has(TOKEN_KEY) {
            return None;
        }
        let text = self.store.get(TOKEN_KEY)?;
        match serde_json::from_str(&text) {
            Ok(token) => Some(token),
            Err(e) => {
                log::warn!("Ignoring unreadable persisted token: {}", e);
                None
            }
        }
    }
}
