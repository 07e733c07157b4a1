//! # pagebeat-storage
//!
//! `SessionStore` 포트의 저장소 어댑터.
//! 같은 저장소 범위를 공유하는 트래커들은 같은 세션 ID를 본다.
//!
//! - [`memory`] — 프로세스 수명 인메모리 저장소 (테스트/임베디드)
//! - [`file`] — 플랫폼 데이터 디렉토리의 JSON 파일 저장소

pub mod file;
pub mod memory;
