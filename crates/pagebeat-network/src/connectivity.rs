//! 연결 상태 추적.
//!
//! 전송 결과로부터 온라인/오프라인 상태를 추정한다.
//! 연속 실패가 임계값에 도달하면 오프라인으로, 성공 한 번이면
//! 온라인으로 전환한다. 결과는 페이로드의 best-effort
//! `network.isOnline` 필드에 반영된다.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use async_trait::async_trait;

use pagebeat_core::models::payload::{NetworkInfo, PageSnapshot};
use pagebeat_core::ports::environment::EnvironmentProbe;

/// 전송 결과 기반 연결 상태 추적기
pub struct ConnectivityTracker {
    /// 현재 온라인 상태 (atomic for lock-free access)
    is_online: AtomicBool,
    /// 연속 실패 횟수
    failure_count: AtomicU64,
    /// 오프라인 전환 임계값 (연속 실패 횟수)
    offline_threshold: u64,
    /// 상태 변경 브로드캐스트
    status_tx: watch::Sender<bool>,
    /// 상태 수신기 (복제 가능)
    status_rx: watch::Receiver<bool>,
}

impl ConnectivityTracker {
    /// 새 추적기 생성.
    ///
    /// `offline_threshold`: 이 횟수만큼 연속 실패하면 오프라인 전환
    pub fn new(offline_threshold: u64) -> Self {
        let (status_tx, status_rx) = watch::channel(true);
        Self {
            is_online: AtomicBool::new(true),
            failure_count: AtomicU64::new(0),
            offline_threshold,
            status_tx,
            status_rx,
        }
    }

    /// 기본 임계값(3회 실패)으로 생성
    pub fn default_threshold() -> Self {
        Self::new(3)
    }

    /// 현재 온라인 상태
    pub fn is_online(&self) -> bool {
        self.is_online.load(Ordering::Relaxed)
    }

    /// 연속 실패 횟수
    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// 상태 변경 수신기 생성
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.status_rx.clone()
    }

    /// 전송 성공 기록 — 온라인 전환 + 실패 카운터 리셋
    pub fn record_success(&self) {
        let was_offline = !self.is_online.swap(true, Ordering::Relaxed);
        self.failure_count.store(0, Ordering::Relaxed);

        if was_offline {
            info!("연결 복구됨 — 온라인");
            let _ = self.status_tx.send(true);
        }
    }

    /// 전송 실패 기록 — 임계값 도달 시 오프라인 전환
    pub fn record_failure(&self) {
        let count = self.failure_count.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("전송 실패 기록 (연속 {count}회)");

        if count >= self.offline_threshold {
            let was_online = self.is_online.swap(false, Ordering::Relaxed);
            if was_online {
                warn!("연속 {count}회 실패 — 오프라인 전환");
                let _ = self.status_tx.send(false);
            }
        }
    }
}

impl Default for ConnectivityTracker {
    fn default() -> Self {
        Self::default_threshold()
    }
}

/// 온라인 상태를 덧입히는 환경 프로브 래퍼.
///
/// 내부 프로브의 네트워크 스냅샷에 추적기의 `is_online`을 반영한다 —
/// 연결 introspection이 없는 호스트에서도 전송 결과로부터
/// best-effort 온라인 여부를 제공한다.
pub struct ConnectivityProbe {
    inner: Arc<dyn EnvironmentProbe>,
    connectivity: Arc<ConnectivityTracker>,
}

impl ConnectivityProbe {
    /// 내부 프로브와 추적기를 감싸 생성
    pub fn new(inner: Arc<dyn EnvironmentProbe>, connectivity: Arc<ConnectivityTracker>) -> Self {
        Self {
            inner,
            connectivity,
        }
    }
}

#[async_trait]
impl EnvironmentProbe for ConnectivityProbe {
    async fn page(&self) -> PageSnapshot {
        self.inner.page().await
    }

    async fn cookies(&self) -> String {
        self.inner.cookies().await
    }

    async fn network(&self) -> NetworkInfo {
        let mut network = self.inner.network().await;
        network.is_online = self.connectivity.is_online();
        network
    }
}
