//! 세션 저장소 포트.
//!
//! 구현: `pagebeat-storage` crate (인메모리, JSON 파일)

use async_trait::async_trait;

use crate::error::CoreError;

/// 브라우징 세션 범위의 내구성 키-값 저장소.
///
/// 같은 저장소 범위 안에서는 저장된 세션 ID가 페이지 로드를 넘어
/// 유지된다.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// 키로 저장된 값 조회
    async fn load(&self, key: &str) -> Result<Option<String>, CoreError>;

    /// 값 저장 (같은 키는 덮어쓴다)
    async fn store(&self, key: &str, value: &str) -> Result<(), CoreError>;
}
