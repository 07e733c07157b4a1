//! 이벤트 모델.
//!
//! 수집된 관측 사실 한 건과 `track` 호출 입력을 정의.
//! 와이어 키는 수집 서버 스키마 그대로 `component, element, data, event, timestamp`.

use serde::{Deserialize, Serialize};

/// 이벤트 분류 — 플러시 정책의 입력
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// 컴포넌트 노출 ("view") — 배치 임계값까지 누적
    View,
    /// 사용자 인터랙션 ("click") — 즉시 플러시
    Click,
    /// 그 외 커스텀 이벤트 — 호출자가 즉시 전송을 요청한 경우에만 플러시
    Custom,
}

impl EventKind {
    /// 이벤트 이름으로 분류
    pub fn from_name(name: &str) -> Self {
        match name {
            "view" => Self::View,
            "click" => Self::Click,
            _ => Self::Custom,
        }
    }
}

/// 수집 이벤트 한 건
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// 이벤트 이름 ("view", "click", 커스텀)
    pub event: String,
    /// 호출자가 직렬화한 불투명 데이터 (빈 문자열 허용)
    #[serde(default)]
    pub data: String,
    /// 이벤트가 발생한 요소 라벨
    #[serde(default)]
    pub element: String,
    /// 이벤트가 발생한 컴포넌트 라벨
    #[serde(default)]
    pub component: String,
    /// 버퍼 추가 시각 (epoch 밀리초, 버퍼 내 단조 비감소)
    pub timestamp: i64,
    /// 전송 실패 횟수 — 재시도 모드 내부 상태, 와이어에 싣지 않는다
    #[serde(skip)]
    pub failure_count: u32,
}

impl EventRecord {
    /// 새 이벤트 레코드 생성
    pub fn new(event_name: &str, data: TrackData, timestamp: i64) -> Self {
        Self {
            event: event_name.to_string(),
            data: data.data.unwrap_or_default(),
            element: data.element.unwrap_or_default(),
            component: data.component.unwrap_or_default(),
            timestamp,
            failure_count: 0,
        }
    }

    /// 이벤트 분류
    pub fn kind(&self) -> EventKind {
        EventKind::from_name(&self.event)
    }
}

/// `track` 호출 입력 데이터
#[derive(Debug, Clone, Default)]
pub struct TrackData {
    /// 호출자가 직렬화한 이벤트 데이터
    pub data: Option<String>,
    /// 요소 라벨
    pub element: Option<String>,
    /// 컴포넌트 라벨
    pub component: Option<String>,
}

impl TrackData {
    /// 컴포넌트 라벨만 있는 입력
    pub fn component(name: impl Into<String>) -> Self {
        Self {
            component: Some(name.into()),
            ..Self::default()
        }
    }

    /// 요소 라벨만 있는 입력
    pub fn element(name: impl Into<String>) -> Self {
        Self {
            element: Some(name.into()),
            ..Self::default()
        }
    }
}
