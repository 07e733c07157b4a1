//! PAGEBEAT 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 자체 실패를 이 타입의 variant로 래핑한다.
//! 전송 결과(성공/거부/전송 실패)는 에러가 아니라
//! [`crate::ports::report_sink::DeliveryOutcome`] 값으로 표현한다 —
//! 트래킹 실패가 호스트로 전파되어서는 안 되기 때문.

use thiserror::Error;

/// 코어 레이어 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류 (엔드포인트 URL 등)
    #[error("설정 에러: {0}")]
    Config(String),

    /// 세션 저장소 접근 실패
    #[error("저장소 에러: {0}")]
    Storage(String),

    /// 네트워크 에러 (클라이언트 구성 실패 등)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),
}
