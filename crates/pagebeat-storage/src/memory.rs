//! 인메모리 세션 저장소.
//!
//! 프로세스 수명 범위의 저장소 — 테스트와 임베디드 사용처용.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use pagebeat_core::error::CoreError;
use pagebeat_core::ports::session_store::SessionStore;

/// 인메모리 키-값 세션 저장소
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    /// 빈 저장소 생성
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, key: &str) -> Result<Option<String>, CoreError> {
        Ok(self.inner.read().get(key).cloned())
    }

    async fn store(&self, key: &str, value: &str) -> Result<(), CoreError> {
        self.inner.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
