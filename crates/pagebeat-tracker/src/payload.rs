//! 페이로드 빌더.
//!
//! 컨텍스트 스냅샷 + 설정의 정적 필드 + 버퍼 스냅샷을 하나의
//! [`AnalyticsPayload`]로 병합한다. 같은 입력에는 같은 출력 —
//! 숨은 전역 상태를 읽지 않고, 받은 스냅샷을 변형하지 않는다.

use pagebeat_core::config::TrackerConfig;
use pagebeat_core::models::event::EventRecord;
use pagebeat_core::models::payload::{AnalyticsPayload, ContextSnapshot};

/// 페이로드 빌더
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    app_name: String,
    app_version: String,
    custom_payload: serde_json::Map<String, serde_json::Value>,
    custom_properties: serde_json::Map<String, serde_json::Value>,
}

impl PayloadBuilder {
    /// 설정에서 정적 필드를 가져와 빌더 생성
    pub fn from_config(config: &TrackerConfig) -> Self {
        Self {
            app_name: config.app_name.clone(),
            app_version: config.app_version.clone(),
            custom_payload: config.custom_payload.clone(),
            custom_properties: config.custom_properties.clone(),
        }
    }

    /// 버퍼 스냅샷과 컨텍스트로 페이로드 구성
    pub fn build(&self, events: Vec<EventRecord>, context: &ContextSnapshot) -> AnalyticsPayload {
        AnalyticsPayload {
            app_name: self.app_name.clone(),
            app_version: self.app_version.clone(),
            referrer: context.page.referrer.clone(),
            url: context.page.url.clone(),
            pathname: context.page.pathname.clone(),
            hostname: context.page.hostname.clone(),
            title: context.page.title.clone(),
            screen: context.page.screen(),
            language: context.page.language.clone(),
            utm_source: context.utm.source.clone(),
            utm_medium: context.utm.medium.clone(),
            utm_campaign: context.utm.campaign.clone(),
            utm_term: context.utm.term.clone(),
            utm_content: context.utm.content.clone(),
            session_id: context.session_id.clone(),
            network: context.network.clone(),
            events,
            custom: self.custom_payload.clone(),
            event_properties: self.custom_properties.clone(),
        }
    }
}
