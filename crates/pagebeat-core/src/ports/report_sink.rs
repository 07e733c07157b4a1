//! 전송 싱크 포트.
//!
//! 구현: `pagebeat-network` crate (reqwest)

use async_trait::async_trait;
use std::sync::Arc;

use crate::models::payload::AnalyticsPayload;

/// 전송 시도 한 번의 결과.
///
/// 실패는 에러로 전파하지 않고 값으로 표현한다 — 트래킹 실패의
/// 최악의 영향은 해당 배치의 유실이어야 하며, 호스트 동작에는
/// 어떤 식으로든 간섭하지 않는다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// 2xx 응답 수신
    Delivered,
    /// 2xx 이외 상태 코드
    Rejected {
        /// HTTP 상태 코드
        status: u16,
    },
    /// 전송 계층 실패 (연결 불가, 타임아웃 등)
    TransportError {
        /// 실패 사유
        reason: String,
    },
}

impl DeliveryOutcome {
    /// 전달 성공 여부
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// 페이로드 전송 싱크
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// 와이어 인코딩된 페이로드 전송 시도.
    ///
    /// 어떤 실패도 panic이나 에러로 새어나가지 않는다.
    async fn deliver(&self, payload: &serde_json::Value) -> DeliveryOutcome;
}

/// 구성된 모든 페이로드를 전송 결과와 무관하게 받는 fire-and-forget 콜백
pub type ReportCallback = Arc<dyn Fn(&AnalyticsPayload) + Send + Sync>;
