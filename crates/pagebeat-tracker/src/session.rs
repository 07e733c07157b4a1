//! 세션 컨텍스트.
//!
//! 세션 ID를 저장소에서 복원하거나 새로 생성해 영속화하고,
//! 페이로드 구성에 필요한 페이지/UTM/네트워크 컨텍스트를
//! 요청 시점에 환경 프로브에서 파생한다.

use std::sync::Arc;

use rand::RngExt;
use tracing::{debug, warn};

use pagebeat_core::models::payload::{ContextSnapshot, UtmFields};
use pagebeat_core::ports::environment::EnvironmentProbe;
use pagebeat_core::ports::session_store::SessionStore;

/// 세션 ID 저장 키.
/// 읽기/쓰기에 같은 키를 쓴다 — 키가 갈리면 재로드마다 새 세션이 된다.
pub const SESSION_ID_KEY: &str = "pagebeat:session_id";

/// base-36 프래그먼트 길이 (두 개를 이어 붙인다)
const SESSION_ID_FRAGMENT_LEN: usize = 13;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// 쿠키 문자열에서 이름으로 값 조회.
///
/// "k=v; k2=v2" 형식을 `;`로 나누고 공백을 제거한 뒤 첫 일치를
/// 반환한다. 없으면 빈 문자열.
pub fn cookie_value(cookies: &str, name: &str) -> String {
    let name_eq = format!("{name}=");
    for cookie in cookies.split(';') {
        let cookie = cookie.trim();
        if let Some(value) = cookie.strip_prefix(name_eq.as_str()) {
            return value.to_string();
        }
    }
    String::new()
}

/// 새 세션 ID 생성 — 13자 base-36 프래그먼트 두 개 분량의 임의 문자열
fn generate_session_id() -> String {
    let mut rng = rand::rng();
    let mut id = String::with_capacity(SESSION_ID_FRAGMENT_LEN * 2);
    for _ in 0..SESSION_ID_FRAGMENT_LEN * 2 {
        let idx = rng.random_range(0..BASE36.len());
        id.push(BASE36[idx] as char);
    }
    id
}

/// 트래커 한 인스턴스가 소유하는 세션 컨텍스트
pub struct SessionContext {
    session_id: String,
    probe: Arc<dyn EnvironmentProbe>,
}

impl SessionContext {
    /// 저장소에서 세션 ID 복원, 없으면 생성 후 영속화.
    ///
    /// 저장소 실패는 임시 ID로 강등한다 — 트래킹이 호스트를
    /// 실패시키면 안 된다.
    pub async fn resolve(store: &dyn SessionStore, probe: Arc<dyn EnvironmentProbe>) -> Self {
        let session_id = match store.load(SESSION_ID_KEY).await {
            Ok(Some(id)) if !id.is_empty() => {
                debug!("세션 복원: {id}");
                id
            }
            Ok(_) => {
                let id = generate_session_id();
                if let Err(e) = store.store(SESSION_ID_KEY, &id).await {
                    warn!("세션 ID 영속화 실패, 임시 세션으로 진행: {e}");
                }
                debug!("새 세션 생성: {id}");
                id
            }
            Err(e) => {
                warn!("세션 저장소 조회 실패, 임시 세션으로 진행: {e}");
                generate_session_id()
            }
        };

        Self { session_id, probe }
    }

    /// 영속화 없는 임시 세션
    pub fn ephemeral(probe: Arc<dyn EnvironmentProbe>) -> Self {
        Self {
            session_id: generate_session_id(),
            probe,
        }
    }

    /// 세션 ID (저장소 범위 내에서 불변)
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// 페이로드 구성용 컨텍스트 스냅샷 — 요청 시점에 파생
    pub async fn snapshot(&self) -> ContextSnapshot {
        let page = self.probe.page().await;
        let cookies = self.probe.cookies().await;
        let utm = UtmFields {
            source: cookie_value(&cookies, "utm_source"),
            medium: cookie_value(&cookies, "utm_medium"),
            campaign: cookie_value(&cookies, "utm_campaign"),
            term: cookie_value(&cookies, "utm_term"),
            content: cookie_value(&cookies, "utm_content"),
        };
        let network = self.probe.network().await;

        ContextSnapshot {
            session_id: self.session_id.clone(),
            page,
            utm,
            network,
        }
    }
}
