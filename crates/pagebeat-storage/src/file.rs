//! JSON 파일 세션 저장소.
//!
//! 키-값 맵을 JSON 파일 하나로 영속화한다. 파일이 없으면 빈 맵으로
//! 시작하고, 저장 시마다 전체를 다시 쓴다 — 세션 ID 하나를 담는
//! 용도라 맵은 항상 작다.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use pagebeat_core::error::CoreError;
use pagebeat_core::ports::session_store::SessionStore;

/// 저장 파일 이름
const STORE_FILE_NAME: &str = "session.json";

/// 앱 디렉토리 이름
const APP_DIR_NAME: &str = "pagebeat";

/// JSON 파일 기반 세션 저장소
#[derive(Debug)]
pub struct FileSessionStore {
    /// 현재 맵 (스레드 안전)
    cache: RwLock<HashMap<String, String>>,
    /// 저장 파일 경로
    path: PathBuf,
}

impl FileSessionStore {
    /// 플랫폼 데이터 디렉토리 아래에 저장소 생성
    pub fn new() -> Result<Self, CoreError> {
        Self::with_path(Self::default_path()?)
    }

    /// 지정된 파일 경로로 저장소 생성.
    ///
    /// 상위 디렉토리가 없으면 만들고, 파일이 있으면 로드한다.
    pub fn with_path(path: PathBuf) -> Result<Self, CoreError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    CoreError::Storage(format!(
                        "저장소 디렉토리 생성 실패: {}: {e}",
                        parent.display()
                    ))
                })?;
                info!("저장소 디렉토리 생성: {}", parent.display());
            }
        }

        let cache = if path.exists() {
            Self::load_from_file(&path)?
        } else {
            HashMap::new()
        };

        Ok(Self {
            cache: RwLock::new(cache),
            path,
        })
    }

    /// 지정된 디렉토리 아래 기본 파일명으로 생성
    pub fn in_dir(dir: &Path) -> Result<Self, CoreError> {
        Self::with_path(dir.join(STORE_FILE_NAME))
    }

    /// 저장 파일 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 플랫폼별 기본 저장 경로
    fn default_path() -> Result<PathBuf, CoreError> {
        let dirs = directories::ProjectDirs::from("", "", APP_DIR_NAME).ok_or_else(|| {
            CoreError::Storage("플랫폼 데이터 디렉토리를 찾을 수 없습니다".to_string())
        })?;
        Ok(dirs.data_dir().join(STORE_FILE_NAME))
    }

    fn load_from_file(path: &Path) -> Result<HashMap<String, String>, CoreError> {
        let content = fs::read_to_string(path).map_err(|e| {
            CoreError::Storage(format!("저장소 파일 읽기 실패: {}: {e}", path.display()))
        })?;
        let map: HashMap<String, String> = serde_json::from_str(&content).map_err(|e| {
            CoreError::Storage(format!("저장소 파일 파싱 실패: {}: {e}", path.display()))
        })?;
        debug!("저장소 파일 로드 완료: {}", path.display());
        Ok(map)
    }

    fn save_to_file(&self, map: &HashMap<String, String>) -> Result<(), CoreError> {
        let content = serde_json::to_string_pretty(map)
            .map_err(|e| CoreError::Storage(format!("저장소 직렬화 실패: {e}")))?;
        fs::write(&self.path, content).map_err(|e| {
            CoreError::Storage(format!(
                "저장소 파일 저장 실패: {}: {e}",
                self.path.display()
            ))
        })
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self, key: &str) -> Result<Option<String>, CoreError> {
        Ok(self.cache.read().get(key).cloned())
    }

    async fn store(&self, key: &str, value: &str) -> Result<(), CoreError> {
        let snapshot = {
            let mut cache = self.cache.write();
            cache.insert(key.to_string(), value.to_string());
            cache.clone()
        };
        self.save_to_file(&snapshot)?;
        debug!("세션 저장 완료: {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn persists_across_instances() {
        let temp_dir = TempDir::new().unwrap();

        let store = FileSessionStore::in_dir(temp_dir.path()).unwrap();
        store.store("pagebeat:session_id", "abc123").await.unwrap();

        // 새 인스턴스로 다시 로드
        let store2 = FileSessionStore::in_dir(temp_dir.path()).unwrap();
        assert_eq!(
            store2.load("pagebeat:session_id").await.unwrap().as_deref(),
            Some("abc123")
        );
    }

    #[tokio::test]
    async fn missing_file_starts_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::in_dir(temp_dir.path()).unwrap();
        assert_eq!(store.load("pagebeat:session_id").await.unwrap(), None);
    }

    #[tokio::test]
    async fn creates_missing_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b").join("session.json");

        let store = FileSessionStore::with_path(nested.clone()).unwrap();
        store.store("k", "v").await.unwrap();

        assert!(nested.exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.json");
        fs::write(&path, "json 아님").unwrap();

        assert!(FileSessionStore::with_path(path).is_err());
    }
}
