//! 트래커 엔진.
//!
//! track 진입점, 플러시 오케스트레이션, 하트비트 루프, 관측 소스
//! 구독을 한 인스턴스가 소유한다. 전역 싱글턴 없음 — 독립 트래커
//! 여러 개가 테스트에서 공존할 수 있다.
//!
//! 플러시 불변식:
//! - at-most-one-in-flight: 진행 중 플러시가 있으면 새 요청은 병합(skip)
//! - 세대 격리: 플러시는 시작 시점 스냅샷만 관찰하며, 전송 중 추가된
//!   레코드는 다음 세대로 남는다
//! - 모든 전송 실패는 엔진 안에서 소화된다 — 호스트로 새어나가는
//!   실패는 없다

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use pagebeat_core::config::{RetryPolicy, TrackerConfig};
use pagebeat_core::error::CoreError;
use pagebeat_core::models::event::{EventRecord, TrackData};
use pagebeat_core::ports::environment::EnvironmentProbe;
use pagebeat_core::ports::report_sink::{DeliveryOutcome, ReportCallback, ReportSink};
use pagebeat_core::ports::session_store::SessionStore;
use pagebeat_core::ports::source::{Observation, ObservationSource};

use crate::buffer::EventBuffer;
use crate::payload::PayloadBuilder;
use crate::policy::{FlushPolicy, FlushReason};
use crate::session::SessionContext;

/// 관측 소스 채널 용량
const OBSERVATION_CHANNEL_CAPACITY: usize = 64;

/// 플러시 한 번의 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    /// 전송 시도 완료
    Completed(DeliveryOutcome),
    /// 엔드포인트 없이 onReport 콜백으로만 전달됨
    ReportedLocally,
    /// 빈 버퍼 — 네트워크 호출도 콜백 호출도 없음
    Empty,
    /// 엔드포인트/콜백 모두 미설정 — no-op
    NotConfigured,
    /// 진행 중인 플러시와 병합되어 건너뜀
    Coalesced,
    /// 와이어 인코딩 실패 — 해당 세대 폐기
    EncodingFailed,
    /// 이미 종료된 트래커
    Closed,
}

/// 트래커 통계 스냅샷
#[derive(Debug, Clone)]
pub struct TrackerStats {
    /// 현재 버퍼 길이
    pub buffered: usize,
    /// 시도된 플러시 수 (빈 버퍼/병합 제외)
    pub flushes: u64,
    /// 성공한 전달 수 (로컬 콜백 전달 포함)
    pub delivered: u64,
    /// 실패한 전달 수
    pub failed: u64,
    /// 병합되어 건너뛴 플러시 요청 수
    pub coalesced: u64,
}

struct TrackerInner {
    config: TrackerConfig,
    policy: FlushPolicy,
    buffer: EventBuffer,
    session: SessionContext,
    builder: PayloadBuilder,
    sink: Option<Arc<dyn ReportSink>>,
    on_report: Option<ReportCallback>,
    /// at-most-one-in-flight 가드 (Idle=false, Sending=true)
    flushing: AtomicBool,
    /// 종료 후 관측 거부
    closed: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
    heartbeat: Mutex<Option<JoinHandle<()>>>,
    source_tasks: Mutex<Vec<JoinHandle<()>>>,
    flushes: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
    coalesced: AtomicU64,
}

/// 이벤트 배칭/전송 트래커.
///
/// 핸들은 `Clone`으로 복제할 수 있으며 모두 같은 버퍼/세션을
/// 공유한다.
#[derive(Clone)]
pub struct Tracker {
    inner: Arc<TrackerInner>,
}

impl Tracker {
    /// 새 트래커 생성 — 저장소에서 세션을 복원한다.
    ///
    /// `sink`가 없으면 `on_report` 콜백이, 둘 다 없으면 플러시가
    /// no-op이 된다.
    pub async fn new(
        config: TrackerConfig,
        store: &dyn SessionStore,
        probe: Arc<dyn EnvironmentProbe>,
        sink: Option<Arc<dyn ReportSink>>,
        on_report: Option<ReportCallback>,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        let session = SessionContext::resolve(store, probe).await;
        Ok(Self::assemble(config, session, sink, on_report))
    }

    /// 세션 영속화 없이 생성 (임시 세션)
    pub fn ephemeral(
        config: TrackerConfig,
        probe: Arc<dyn EnvironmentProbe>,
        sink: Option<Arc<dyn ReportSink>>,
        on_report: Option<ReportCallback>,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        let session = SessionContext::ephemeral(probe);
        Ok(Self::assemble(config, session, sink, on_report))
    }

    fn assemble(
        config: TrackerConfig,
        session: SessionContext,
        sink: Option<Arc<dyn ReportSink>>,
        on_report: Option<ReportCallback>,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        let policy = FlushPolicy::new(config.view_batch_threshold);
        let builder = PayloadBuilder::from_config(&config);

        Self {
            inner: Arc::new(TrackerInner {
                config,
                policy,
                buffer: EventBuffer::new(),
                session,
                builder,
                sink,
                on_report,
                flushing: AtomicBool::new(false),
                closed: AtomicBool::new(false),
                shutdown_tx,
                heartbeat: Mutex::new(None),
                source_tasks: Mutex::new(Vec::new()),
                flushes: AtomicU64::new(0),
                delivered: AtomicU64::new(0),
                failed: AtomicU64::new(0),
                coalesced: AtomicU64::new(0),
            }),
        }
    }

    /// 세션 ID
    pub fn session_id(&self) -> &str {
        self.inner.session.session_id()
    }

    /// 현재 버퍼 길이
    pub fn buffered(&self) -> usize {
        self.inner.buffer.len()
    }

    /// 통계 스냅샷
    pub fn stats(&self) -> TrackerStats {
        TrackerStats {
            buffered: self.inner.buffer.len(),
            flushes: self.inner.flushes.load(Ordering::Relaxed),
            delivered: self.inner.delivered.load(Ordering::Relaxed),
            failed: self.inner.failed.load(Ordering::Relaxed),
            coalesced: self.inner.coalesced.load(Ordering::Relaxed),
        }
    }

    /// 이벤트 기록 + 플러시 정책 적용.
    ///
    /// 정책이 플러시를 결정하면 전송 시도가 끝난 뒤에 반환한다.
    pub async fn track(&self, event_name: &str, data: TrackData) {
        self.track_inner(event_name, data, false).await;
    }

    /// 즉시 전송 플래그와 함께 기록 (커스텀 이벤트용)
    pub async fn track_immediate(&self, event_name: &str, data: TrackData) {
        self.track_inner(event_name, data, true).await;
    }

    async fn track_inner(&self, event_name: &str, data: TrackData, immediate: bool) {
        let inner = &self.inner;
        if inner.closed.load(Ordering::SeqCst) {
            debug!(event = event_name, "종료된 트래커 — 이벤트 무시");
            return;
        }
        if event_name.is_empty() {
            warn!("빈 이벤트 이름 — 무시");
            return;
        }

        let record = EventRecord::new(event_name, data, Utc::now().timestamp_millis());
        let kind = record.kind();
        inner.buffer.append(record);
        let buffered = inner.buffer.len();
        debug!(event = event_name, buffered, "이벤트 기록");

        if let Some(reason) = inner.policy.after_append(kind, buffered, immediate) {
            inner.flush(reason).await;
        }
    }

    /// 정책과 무관한 즉시 플러시
    pub async fn flush_now(&self) -> FlushOutcome {
        if self.inner.closed.load(Ordering::SeqCst) {
            return FlushOutcome::Closed;
        }
        self.inner.flush(FlushReason::Manual).await
    }

    /// 페이지 hidden 신호 — 즉시 플러시
    pub async fn page_hidden(&self) -> FlushOutcome {
        if self.inner.closed.load(Ordering::SeqCst) {
            return FlushOutcome::Closed;
        }
        self.inner.flush(FlushReason::Hidden).await
    }

    /// 하트비트 루프 시작.
    ///
    /// 주기가 0이면 시작하지 않는다. 루프는 `shutdown`까지 돌며
    /// 주기마다 버퍼 크기와 무관하게 플러시를 시도한다 —
    /// 임계값 아래 view 이벤트의 체류 시간을 주기로 제한한다.
    pub fn start(&self) {
        let interval = self.inner.config.heart_beat_interval();
        if interval.is_zero() {
            debug!("하트비트 비활성화 (주기 0)");
            return;
        }

        let mut guard = self.inner.heartbeat.lock();
        if guard.is_some() {
            debug!("하트비트 루프 이미 실행 중");
            return;
        }

        let inner = self.inner.clone();
        let mut shutdown_rx = self.inner.shutdown_tx.subscribe();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // interval의 첫 tick은 즉시 발화하므로 소비하고 시작한다
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        inner.flush(FlushReason::Heartbeat).await;
                    }
                    _ = shutdown_rx.changed() => {
                        info!("하트비트 루프 종료");
                        break;
                    }
                }
            }
        });

        *guard = Some(handle);
    }

    /// 관측 소스 연결.
    ///
    /// 소스의 신호를 track/flush 호출로 변환하는 태스크를 띄운다.
    pub fn attach_source(&self, source: Arc<dyn ObservationSource>) {
        let tracker = self.clone();
        let mut shutdown_rx = self.inner.shutdown_tx.subscribe();

        let handle = tokio::spawn(async move {
            let (tx, mut rx) = mpsc::channel(OBSERVATION_CHANNEL_CAPACITY);
            if let Err(e) = source.start(tx).await {
                warn!("관측 소스 시작 실패: {e}");
                return;
            }

            loop {
                tokio::select! {
                    observation = rx.recv() => match observation {
                        Some(observation) => tracker.handle_observation(observation).await,
                        None => {
                            debug!("관측 소스 채널 닫힘");
                            break;
                        }
                    },
                    _ = shutdown_rx.changed() => break,
                }
            }
        });

        self.inner.source_tasks.lock().push(handle);
    }

    async fn handle_observation(&self, observation: Observation) {
        match observation {
            Observation::Interaction { data } => self.track("click", data).await,
            Observation::Visibility { data } => self.track("view", data).await,
            Observation::Custom {
                event,
                data,
                immediate,
            } => self.track_inner(&event, data, immediate).await,
            Observation::Hidden => {
                self.page_hidden().await;
            }
            Observation::Unmount => {
                self.shutdown().await;
            }
        }
    }

    /// 종료 — 하트비트/소스 태스크 중지, 최종 best-effort 플러시.
    ///
    /// 이후의 track/flush 호출은 모두 무시된다.
    pub async fn shutdown(&self) -> FlushOutcome {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return FlushOutcome::Closed;
        }

        let _ = self.inner.shutdown_tx.send(true);

        let heartbeat = self.inner.heartbeat.lock().take();
        if let Some(handle) = heartbeat {
            let _ = handle.await;
        }
        // 소스 태스크는 종료 신호를 받고 스스로 끝난다. join하지 않는다 —
        // Unmount 신호가 소스 태스크 안에서 shutdown을 호출하므로
        // 자기 자신을 기다리면 교착이다.
        self.inner.source_tasks.lock().clear();

        let outcome = self.inner.flush(FlushReason::Unmount).await;
        info!("트래커 종료 (최종 플러시: {outcome:?})");
        outcome
    }
}

impl TrackerInner {
    /// 플러시 시도. at-most-one-in-flight를 강제한다.
    async fn flush(&self, reason: FlushReason) -> FlushOutcome {
        // 전송 대상이 없으면 설정 no-op — 에러가 아니다
        if self.sink.is_none() && self.on_report.is_none() {
            debug!(?reason, "전송 대상 미설정 — 플러시 생략");
            return FlushOutcome::NotConfigured;
        }

        // Idle → Sending 전이. 이미 Sending이면 병합.
        if self
            .flushing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            self.coalesced.fetch_add(1, Ordering::Relaxed);
            debug!(?reason, "플러시 진행 중 — 병합");
            return FlushOutcome::Coalesced;
        }

        let outcome = self.flush_generation(reason).await;

        // Sending → Idle 전이
        self.flushing.store(false, Ordering::SeqCst);
        outcome
    }

    /// 현재 세대(스냅샷)에 대한 플러시 본체
    async fn flush_generation(&self, reason: FlushReason) -> FlushOutcome {
        let snapshot = self.buffer.snapshot();
        if snapshot.is_empty() {
            return FlushOutcome::Empty;
        }
        let generation = snapshot.len();
        self.flushes.fetch_add(1, Ordering::Relaxed);

        let context = self.session.snapshot().await;
        let payload = self.builder.build(snapshot, &context);

        // 인코딩 실패는 이 플러시에 치명적 — 독 레코드 재시도 루프 방지
        let wire = match payload.to_wire() {
            Ok(wire) => wire,
            Err(e) => {
                error!(?reason, generation, "페이로드 직렬화 실패, 세대 폐기: {e}");
                self.buffer.discard(generation);
                return FlushOutcome::EncodingFailed;
            }
        };

        // onReport 콜백 — 전송 전에 호출되는 fire-and-forget 싱크.
        // 콜백 패닉이 버퍼 처리에 영향을 주면 안 된다.
        if let Some(callback) = &self.on_report {
            let result =
                std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| callback(&payload)));
            if result.is_err() {
                warn!("onReport 콜백 패닉 — 무시");
            }
        }

        let Some(sink) = &self.sink else {
            // 콜백 전용 구성: 전달 완료로 간주하고 세대 정리
            self.buffer.discard(generation);
            self.delivered.fetch_add(1, Ordering::Relaxed);
            debug!(?reason, count = generation, "로컬 콜백 전달 완료");
            return FlushOutcome::ReportedLocally;
        };

        let outcome = sink.deliver(&wire).await;
        match &outcome {
            DeliveryOutcome::Delivered => {
                self.buffer.discard(generation);
                self.delivered.fetch_add(1, Ordering::Relaxed);
                debug!(?reason, count = generation, "배치 전송 성공");
            }
            DeliveryOutcome::Rejected { status } => {
                warn!(?reason, status, "수집 서버 거부");
                self.failed.fetch_add(1, Ordering::Relaxed);
                self.apply_failure_policy(generation);
            }
            DeliveryOutcome::TransportError { reason: cause } => {
                warn!(?reason, %cause, "배치 전송 실패");
                self.failed.fetch_add(1, Ordering::Relaxed);
                self.apply_failure_policy(generation);
            }
        }

        FlushOutcome::Completed(outcome)
    }

    /// 실패한 세대에 설정된 재시도 정책 적용
    fn apply_failure_policy(&self, generation: usize) {
        match self.config.retry {
            RetryPolicy::ClearOnFailure => {
                // at-most-once: 단순성을 위해 재전송을 포기한다
                self.buffer.discard(generation);
            }
            RetryPolicy::BoundedRetry { max_failures } => {
                let (kept, dropped) = self.buffer.penalize(generation, max_failures);
                if dropped > 0 {
                    warn!(dropped, "재시도 한도 초과 이벤트 폐기");
                }
                debug!(kept, "실패 이벤트 재큐잉");
            }
        }
    }
}
