//! 호스트 환경 프로브 포트.
//!
//! 페이지/네트워크 메타데이터를 요청 시점에 파생한다.
//! 브라우저 호스트는 location/document/navigator를, 헤드리스 호스트는
//! 고정 값(`pagebeat-tracker`의 `StaticEnvironment`)을 노출한다.

use async_trait::async_trait;

use crate::models::payload::{NetworkInfo, PageSnapshot};

/// 호스트 환경 introspection
#[async_trait]
pub trait EnvironmentProbe: Send + Sync {
    /// 현재 페이지 스냅샷
    async fn page(&self) -> PageSnapshot;

    /// 원본 쿠키 문자열 ("k=v; k2=v2" 형식, 없으면 빈 문자열)
    async fn cookies(&self) -> String;

    /// 네트워크 품질 스냅샷.
    ///
    /// 연결 introspection 미지원 환경은 `is_online`만 채워 반환한다.
    async fn network(&self) -> NetworkInfo;
}
