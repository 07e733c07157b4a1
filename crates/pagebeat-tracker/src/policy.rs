//! 플러시 정책.
//!
//! 이벤트 추가 직후 즉시 플러시할지 누적할지 결정한다.
//! 라이프사이클 신호(hidden, unmount)와 하트비트는 트래커가 직접
//! 플러시를 호출하므로 여기서는 이벤트 종류 규칙만 다룬다.

use pagebeat_core::models::event::EventKind;

/// 플러시가 일어난 사유 (로깅/진단용)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushReason {
    /// click 계열 인터랙션 — 지연에 민감, 배칭 이득 없음
    Interaction,
    /// view 누적이 배치 임계값 초과
    BatchFull,
    /// 호출자의 즉시 전송 요청 (커스텀 이벤트)
    Immediate,
    /// 하트비트 주기 도래
    Heartbeat,
    /// 페이지 hidden 전환
    Hidden,
    /// 페이지 종료/언마운트
    Unmount,
    /// flush_now 명시 호출
    Manual,
}

/// 이벤트 종류별 플러시 결정 규칙
#[derive(Debug, Clone, Copy)]
pub struct FlushPolicy {
    view_batch_threshold: usize,
}

impl FlushPolicy {
    /// 새 정책 생성
    pub fn new(view_batch_threshold: usize) -> Self {
        Self {
            view_batch_threshold,
        }
    }

    /// 이벤트 추가 직후 플러시 여부 결정.
    ///
    /// - click → 즉시
    /// - view → 버퍼가 임계값을 초과했을 때만
    /// - 커스텀 → 호출자가 즉시 전송을 요청한 경우만
    pub fn after_append(
        &self,
        kind: EventKind,
        buffered: usize,
        immediate: bool,
    ) -> Option<FlushReason> {
        match kind {
            EventKind::Click => Some(FlushReason::Interaction),
            EventKind::View if buffered > self.view_batch_threshold => {
                Some(FlushReason::BatchFull)
            }
            EventKind::View => None,
            EventKind::Custom if immediate => Some(FlushReason::Immediate),
            EventKind::Custom => None,
        }
    }
}
