//! 트래커 설정 구조체.
//!
//! 인스턴스 생성 시점에 고정되는 설정. 하트비트 주기, 수집 엔드포인트,
//! 배치 임계값, 커스텀 필드, 실패 처리 정책을 정의한다.
//! 콜백과 싱크는 코드이지 데이터가 아니므로 여기 속하지 않는다 —
//! 트래커 생성자에서 별도로 주입한다.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::CoreError;

/// 전송 실패 처리 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RetryPolicy {
    /// 결과와 무관하게 해당 세대를 비운다 (at-most-once, 기본값)
    #[default]
    ClearOnFailure,
    /// 실패 레코드의 `failure_count`를 올리고 한도 미만이면 재큐잉
    BoundedRetry {
        /// 폐기 전 허용되는 실패 횟수
        #[serde(default = "default_max_failures")]
        max_failures: u32,
    },
}

/// 트래커 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// 앱 이름 (페이로드 `appName`)
    #[serde(default)]
    pub app_name: String,
    /// 앱 버전 (페이로드 `appVersion`)
    #[serde(default)]
    pub app_version: String,
    /// 하트비트 주기 (밀리초, 0이면 비활성)
    #[serde(default = "default_heart_beat_interval_ms")]
    pub heart_beat_interval_ms: u64,
    /// 수집 서버 엔드포인트 (없으면 onReport 콜백만 사용)
    #[serde(default)]
    pub reporting_endpoint: Option<String>,
    /// view 이벤트 배치 임계값 — 버퍼가 이 개수를 초과하면 플러시
    #[serde(default = "default_view_batch_threshold")]
    pub view_batch_threshold: usize,
    /// 정적 커스텀 페이로드 필드 (고정 스키마와 충돌 시 커스텀 우선)
    #[serde(default)]
    pub custom_payload: serde_json::Map<String, serde_json::Value>,
    /// 이벤트별 커스텀 필드
    #[serde(default)]
    pub custom_properties: serde_json::Map<String, serde_json::Value>,
    /// 전송 실패 처리 정책
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            app_name: String::new(),
            app_version: String::new(),
            heart_beat_interval_ms: default_heart_beat_interval_ms(),
            reporting_endpoint: None,
            view_batch_threshold: default_view_batch_threshold(),
            custom_payload: serde_json::Map::new(),
            custom_properties: serde_json::Map::new(),
            retry: RetryPolicy::default(),
        }
    }
}

impl TrackerConfig {
    /// 설정 유효성 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(endpoint) = &self.reporting_endpoint {
            url::Url::parse(endpoint).map_err(|e| {
                CoreError::Config(format!("수집 엔드포인트 URL 파싱 실패: {endpoint}: {e}"))
            })?;
        }
        Ok(())
    }

    /// 하트비트 주기를 Duration으로 반환
    pub fn heart_beat_interval(&self) -> Duration {
        Duration::from_millis(self.heart_beat_interval_ms)
    }
}

fn default_heart_beat_interval_ms() -> u64 {
    4_000
}

fn default_view_batch_threshold() -> usize {
    4
}

fn default_max_failures() -> u32 {
    3
}
