//! 관측 소스 포트.
//!
//! DOM 관측(클릭 캡처, intersection/mutation observer)은 이 포트 뒤에
//! 있다 — 코어는 DOM을 직접 만지지 않으므로 가짜 소스로 헤드리스
//! 테스트가 가능하다.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::event::TrackData;

/// 관측 소스가 코어로 보내는 원시 신호
#[derive(Debug, Clone)]
pub enum Observation {
    /// 사용자 인터랙션 — "click" 이벤트로 기록된다
    Interaction {
        /// 클릭 좌표/요소 정보 등 호출자가 직렬화한 데이터
        data: TrackData,
    },
    /// 컴포넌트 노출 — "view" 이벤트로 기록된다
    Visibility {
        /// 노출 비율/스크롤 위치 등 호출자가 직렬화한 데이터
        data: TrackData,
    },
    /// 커스텀 이벤트
    Custom {
        /// 이벤트 이름
        event: String,
        /// 이벤트 데이터
        data: TrackData,
        /// 즉시 전송 요청 여부
        immediate: bool,
    },
    /// 페이지가 hidden으로 전환됨 — 즉시 플러시
    Hidden,
    /// 페이지 종료/언마운트 — 최종 플러시 후 관측 중단
    Unmount,
}

/// 인터랙션/노출 신호 스트림
#[async_trait]
pub trait ObservationSource: Send + Sync {
    /// 관측 시작 — 신호를 `tx` 채널로 전송한다.
    ///
    /// 반환 후에도 소스는 채널이 닫힐 때까지 신호를 계속 보낼 수 있다.
    async fn start(
        &self,
        tx: tokio::sync::mpsc::Sender<Observation>,
    ) -> Result<(), CoreError>;
}
