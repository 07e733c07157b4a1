//! HTTP 전송 싱크.
//!
//! `ReportSink` 포트 구현. 와이어 페이로드를 수집 엔드포인트로
//! JSON POST한다. 2xx만 성공이고, 그 외 상태 코드는 거부,
//! 전송 계층 예외는 TransportError로 매핑한다 — 어느 쪽도
//! 호출자에게 에러로 전파되지 않는다.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use pagebeat_core::error::CoreError;
use pagebeat_core::ports::report_sink::{DeliveryOutcome, ReportSink};

use crate::connectivity::ConnectivityTracker;

/// 기본 요청 타임아웃
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP 전송 싱크 — `ReportSink` 포트 구현
pub struct HttpReportSink {
    client: reqwest::Client,
    endpoint: String,
    /// 연결 상태 추적기 (옵션) — 전송 결과를 기록한다
    connectivity: Option<Arc<ConnectivityTracker>>,
}

impl HttpReportSink {
    /// 새 HTTP 싱크 생성
    pub fn new(endpoint: &str) -> Result<Self, CoreError> {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    /// 타임아웃을 지정해 생성.
    ///
    /// 타임아웃 초과는 전송 계층 실패와 동일하게 취급된다.
    pub fn with_timeout(endpoint: &str, timeout: Duration) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            connectivity: None,
        })
    }

    /// 연결 상태 추적기 연결.
    ///
    /// 서버 응답 수신은 성공으로, 전송 계층 실패는 실패로 기록한다
    /// (거부 응답도 네트워크 자체는 살아 있다는 신호다).
    pub fn with_connectivity(mut self, connectivity: Arc<ConnectivityTracker>) -> Self {
        self.connectivity = Some(connectivity);
        self
    }
}

#[async_trait]
impl ReportSink for HttpReportSink {
    async fn deliver(&self, payload: &serde_json::Value) -> DeliveryOutcome {
        let response = match self.client.post(&self.endpoint).json(payload).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("전송 계층 실패: {e}");
                if let Some(connectivity) = &self.connectivity {
                    connectivity.record_failure();
                }
                return DeliveryOutcome::TransportError {
                    reason: e.to_string(),
                };
            }
        };

        if let Some(connectivity) = &self.connectivity {
            connectivity.record_success();
        }

        let status = response.status();
        if status.is_success() {
            debug!("배치 전송 성공 ({status})");
            DeliveryOutcome::Delivered
        } else {
            warn!("수집 서버 거부: {status}");
            DeliveryOutcome::Rejected {
                status: status.as_u16(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn init_test_logging() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter("pagebeat_network=debug")
            .try_init();
    }

    #[test]
    fn sink_creation() {
        let sink = HttpReportSink::new("http://localhost:8000/v1/batch").unwrap();
        assert_eq!(sink.endpoint, "http://localhost:8000/v1/batch");
        assert!(sink.connectivity.is_none());
    }

    #[tokio::test]
    async fn delivers_on_2xx() {
        init_test_logging();
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/batch")
            .match_header("content-type", "application/json")
            .with_status(204)
            .create_async()
            .await;

        let sink = HttpReportSink::new(&format!("{}/v1/batch", server.url())).unwrap();
        let outcome = sink.deliver(&serde_json::json!({ "events": [] })).await;

        assert_eq!(outcome, DeliveryOutcome::Delivered);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rejects_on_server_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/batch")
            .with_status(500)
            .with_body("Internal Server Error")
            .create_async()
            .await;

        let sink = HttpReportSink::new(&format!("{}/v1/batch", server.url())).unwrap();
        let outcome = sink.deliver(&serde_json::json!({ "events": [] })).await;

        assert_eq!(outcome, DeliveryOutcome::Rejected { status: 500 });
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn transport_error_on_unreachable_host() {
        // 닫힌 포트 — 연결 거부
        let sink = HttpReportSink::with_timeout(
            "http://127.0.0.1:9/v1/batch",
            Duration::from_millis(500),
        )
        .unwrap();

        let outcome = sink.deliver(&serde_json::json!({})).await;
        assert_matches!(outcome, DeliveryOutcome::TransportError { .. });
    }

    #[tokio::test]
    async fn connectivity_records_outcomes() {
        let connectivity = Arc::new(ConnectivityTracker::new(1));

        // 전송 실패 → 오프라인
        let sink = HttpReportSink::with_timeout(
            "http://127.0.0.1:9/v1/batch",
            Duration::from_millis(500),
        )
        .unwrap()
        .with_connectivity(connectivity.clone());
        sink.deliver(&serde_json::json!({})).await;
        assert!(!connectivity.is_online());

        // 거부 응답이라도 응답 수신은 온라인 신호
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/batch")
            .with_status(503)
            .create_async()
            .await;
        let sink = HttpReportSink::new(&format!("{}/v1/batch", server.url()))
            .unwrap()
            .with_connectivity(connectivity.clone());
        sink.deliver(&serde_json::json!({})).await;
        assert!(connectivity.is_online());
    }

    /// 트래커 → HTTP 싱크 엔드-투-엔드: click 한 번이 전체 와이어
    /// 스키마로 POST된다
    #[tokio::test]
    async fn end_to_end_click_posts_full_payload() {
        use pagebeat_core::config::TrackerConfig;
        use pagebeat_core::models::event::TrackData;
        use pagebeat_core::models::payload::PageSnapshot;
        use pagebeat_core::ports::session_store::SessionStore as _;
        use pagebeat_storage::memory::MemorySessionStore;
        use pagebeat_tracker::environment::StaticEnvironment;
        use pagebeat_tracker::tracker::Tracker;

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/batch")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"hostname":"shop.example","events":[{"event":"click","element":"BUTTON"}]}"#
                    .to_string(),
            ))
            .with_status(200)
            .create_async()
            .await;

        let endpoint = format!("{}/v1/batch", server.url());
        let config = TrackerConfig {
            app_name: "shop".to_string(),
            reporting_endpoint: Some(endpoint.clone()),
            ..TrackerConfig::default()
        };
        let probe = Arc::new(StaticEnvironment::new().with_page(PageSnapshot {
            hostname: "shop.example".to_string(),
            ..PageSnapshot::default()
        }));
        let store = MemorySessionStore::new();
        let sink: Arc<dyn ReportSink> = Arc::new(HttpReportSink::new(&endpoint).unwrap());

        let tracker = Tracker::new(config, &store, probe, Some(sink), None)
            .await
            .unwrap();

        tracker.track("click", TrackData::element("BUTTON")).await;

        assert_eq!(tracker.buffered(), 0);
        mock.assert_async().await;

        // 세션이 저장소에 영속화되었는지 확인
        let stored = store.load("pagebeat:session_id").await.unwrap();
        assert_eq!(stored.as_deref(), Some(tracker.session_id()));
    }
}
