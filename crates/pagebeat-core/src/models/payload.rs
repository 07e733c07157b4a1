//! 아웃바운드 페이로드 모델.
//!
//! 세션/페이지 컨텍스트 + 버퍼 스냅샷을 하나의 전송 단위로 묶는다.
//! 고정 와이어 스키마는 수집 서버와의 계약이며 camelCase 키를 쓴다.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::event::EventRecord;

/// 네트워크 품질 스냅샷.
///
/// 호스트 환경이 연결 정보를 노출하지 않으면 `is_online`만 남고
/// 나머지는 모두 `None`이다 — 정상 상황이지 에러가 아니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    /// 왕복 지연 추정치 (ms)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtt: Option<f64>,
    /// 연결 종류 ("wifi", "cellular" 등)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub connection_type: Option<String>,
    /// 데이터 절약 모드 여부
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_data: Option<bool>,
    /// 다운링크 대역폭 추정치 (Mbps)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub down_link: Option<f64>,
    /// 유효 연결 등급 ("4g" 등)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_type: Option<String>,
    /// 온라인 여부 (best-effort)
    pub is_online: bool,
}

/// 현재 페이지 스냅샷 — 환경 프로브가 요청 시점에 파생
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSnapshot {
    /// 유입 경로 (referrer)
    pub referrer: String,
    /// 전체 URL
    pub url: String,
    /// 경로 부분
    pub pathname: String,
    /// 호스트명
    pub hostname: String,
    /// 문서 제목
    pub title: String,
    /// 화면 너비 (픽셀)
    pub screen_width: u32,
    /// 화면 높이 (픽셀)
    pub screen_height: u32,
    /// 브라우저 언어
    pub language: String,
}

impl PageSnapshot {
    /// 화면 해상도 문자열 ("1920x1080")
    pub fn screen(&self) -> String {
        format!("{}x{}", self.screen_width, self.screen_height)
    }
}

/// 쿠키에서 파싱한 UTM 필드 (없으면 빈 문자열)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtmFields {
    pub source: String,
    pub medium: String,
    pub campaign: String,
    pub term: String,
    pub content: String,
}

/// 페이로드 구성 시점의 세션/환경 컨텍스트
#[derive(Debug, Clone, Default)]
pub struct ContextSnapshot {
    /// 세션 ID
    pub session_id: String,
    /// 페이지 스냅샷
    pub page: PageSnapshot,
    /// UTM 필드
    pub utm: UtmFields,
    /// 네트워크 품질
    pub network: NetworkInfo,
}

/// 아웃바운드 페이로드.
///
/// `events`는 구성 시점의 버퍼 스냅샷 그대로이며, 스냅샷과 전송 사이에
/// 레코드가 추가되거나 빠지지 않는다 (재시도 정책 제외).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsPayload {
    pub app_name: String,
    pub app_version: String,
    pub referrer: String,
    pub url: String,
    pub pathname: String,
    pub hostname: String,
    pub title: String,
    /// 화면 해상도 문자열 ("{width}x{height}")
    pub screen: String,
    pub language: String,
    pub utm_source: String,
    pub utm_medium: String,
    pub utm_campaign: String,
    pub utm_term: String,
    pub utm_content: String,
    pub session_id: String,
    pub network: NetworkInfo,
    /// 스냅샷 시점의 이벤트 목록 (삽입 순서 유지)
    pub events: Vec<EventRecord>,
    /// 정적 커스텀 필드 — 와이어 인코딩 때 고정 스키마 위에 덮어쓴다
    #[serde(skip)]
    pub custom: serde_json::Map<String, serde_json::Value>,
    /// 이벤트별 커스텀 필드 — 각 이벤트 객체 위에 덮어쓴다
    #[serde(skip)]
    pub event_properties: serde_json::Map<String, serde_json::Value>,
}

impl AnalyticsPayload {
    /// 와이어 인코딩.
    ///
    /// 고정 스키마를 먼저 직렬화한 뒤 커스텀 필드를 덮어쓴다.
    /// 키 충돌 시 커스텀 필드가 이긴다 — 명시적으로 허용된 동작이다.
    pub fn to_wire(&self) -> Result<serde_json::Value, CoreError> {
        let serde_json::Value::Object(mut root) = serde_json::to_value(self)? else {
            return Err(CoreError::Internal(
                "페이로드가 JSON 객체로 직렬화되지 않음".to_string(),
            ));
        };

        // 이벤트별 커스텀 속성 오버레이
        if !self.event_properties.is_empty() {
            if let Some(serde_json::Value::Array(events)) = root.get_mut("events") {
                for event in events {
                    if let serde_json::Value::Object(event_obj) = event {
                        for (key, value) in &self.event_properties {
                            event_obj.insert(key.clone(), value.clone());
                        }
                    }
                }
            }
        }

        // 정적 커스텀 페이로드 오버레이
        for (key, value) in &self.custom {
            root.insert(key.clone(), value.clone());
        }

        Ok(serde_json::Value::Object(root))
    }
}
