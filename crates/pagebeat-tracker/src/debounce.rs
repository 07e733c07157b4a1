//! 디바운스 유틸리티.
//!
//! trailing-edge 디바운서: 대기 시간 안에 반복된 호출은 마지막 값
//! 한 번의 핸들러 호출로 수렴한다. 순수 핸들러 함수와 대기 시간으로
//! 파라미터화되어 DOM 와이어링 없이 단독으로 테스트 가능하다.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

/// 기본 대기 시간 (클릭 디바운스)
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// trailing-edge 디바운서.
///
/// `call`은 논블로킹이다. 내부 태스크가 마지막 값을 들고 대기하다가
/// 대기 시간 동안 새 호출이 없으면 핸들러를 실행한다.
/// 디바운서가 drop되면 보류 중인 마지막 값은 즉시 핸들러로 전달된다.
pub struct Debouncer<T: Send + 'static> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// 새 디바운서 생성
    pub fn new<F>(wait: Duration, handler: F) -> Self
    where
        F: Fn(T) + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<T>();

        tokio::spawn(async move {
            let mut pending: Option<T> = None;
            loop {
                match pending.take() {
                    None => match rx.recv().await {
                        Some(value) => pending = Some(value),
                        None => break,
                    },
                    Some(value) => {
                        tokio::select! {
                            next = rx.recv() => match next {
                                // 대기 중 새 값 도착 — 이전 값은 버리고 대기 재시작
                                Some(newer) => pending = Some(newer),
                                None => {
                                    handler(value);
                                    break;
                                }
                            },
                            _ = tokio::time::sleep(wait) => {
                                handler(value);
                            }
                        }
                    }
                }
            }
            debug!("디바운서 태스크 종료");
        });

        Self { tx }
    }

    /// 기본 대기 시간(300ms)으로 생성
    pub fn with_default_wait<F>(handler: F) -> Self
    where
        F: Fn(T) + Send + 'static,
    {
        Self::new(Duration::from_millis(DEFAULT_DEBOUNCE_MS), handler)
    }

    /// 값 전달 — 대기 시간 내 재호출 시 이전 값은 버려진다
    pub fn call(&self, value: T) {
        let _ = self.tx.send(value);
    }
}
