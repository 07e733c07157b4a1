//! 고정 값 환경 프로브.
//!
//! 브라우저 밖(헤드리스 호스트, 테스트)에서 쓰는 `EnvironmentProbe`
//! 구현. 생성 시 설정한 값을 그대로 반환한다.

use async_trait::async_trait;

use pagebeat_core::models::payload::{NetworkInfo, PageSnapshot};
use pagebeat_core::ports::environment::EnvironmentProbe;

/// 고정 값 환경 프로브
#[derive(Debug, Clone, Default)]
pub struct StaticEnvironment {
    page: PageSnapshot,
    cookies: String,
    network: NetworkInfo,
}

impl StaticEnvironment {
    /// 모든 값이 비어 있는 프로브 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 페이지 스냅샷 설정
    pub fn with_page(mut self, page: PageSnapshot) -> Self {
        self.page = page;
        self
    }

    /// 쿠키 문자열 설정 ("k=v; k2=v2")
    pub fn with_cookies(mut self, cookies: impl Into<String>) -> Self {
        self.cookies = cookies.into();
        self
    }

    /// 네트워크 스냅샷 설정
    pub fn with_network(mut self, network: NetworkInfo) -> Self {
        self.network = network;
        self
    }
}

#[async_trait]
impl EnvironmentProbe for StaticEnvironment {
    async fn page(&self) -> PageSnapshot {
        self.page.clone()
    }

    async fn cookies(&self) -> String {
        self.cookies.clone()
    }

    async fn network(&self) -> NetworkInfo {
        self.network.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_configured_values() {
        let probe = StaticEnvironment::new()
            .with_page(PageSnapshot {
                hostname: "shop.example".to_string(),
                ..PageSnapshot::default()
            })
            .with_cookies("utm_source=ads")
            .with_network(NetworkInfo {
                is_online: true,
                ..NetworkInfo::default()
            });

        assert_eq!(probe.page().await.hostname, "shop.example");
        assert_eq!(probe.cookies().await, "utm_source=ads");
        assert!(probe.network().await.is_online);
    }

    #[tokio::test]
    async fn default_network_is_minimal() {
        // 연결 introspection이 없는 환경의 기본값
        let probe = StaticEnvironment::new();
        let network = probe.network().await;
        assert!(!network.is_online);
        assert!(network.rtt.is_none());
        assert!(network.effective_type.is_none());
    }
}
