//! JSON 파일 원장 저장소
//!
//! 문서 형식은 `{ "<findingId>": <epochMillis>, ... }` (pretty JSON)입니다.
//! 저장 시 같은 디렉토리의 임시 파일에 쓴 뒤 rename하므로,
//! 쓰는 도중 프로세스가 죽어도 이전 문서가 남습니다.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::ScannerError;
use crate::ledger::{LedgerEntries, LedgerStore};

/// JSON 파일 원장 저장소
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// 저장소를 엽니다. 파일이 없으면 빈 문서(`{}`)로 생성합니다.
    ///
    /// # Errors
    ///
    /// 상위 디렉토리 생성이나 파일 생성에 실패하면 `Ledger` 에러.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ScannerError> {
        let store = Self { path: path.into() };

        if !store.path.exists() {
            if let Some(parent) = store.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| store.error(e))?;
            }
            store.save(&LedgerEntries::new())?;
            info!(path = %store.path.display(), "created empty ledger file");
        }

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn error(&self, reason: impl ToString) -> ScannerError {
        ScannerError::Ledger {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl LedgerStore for JsonFileStore {
    fn load(&self) -> Result<LedgerEntries, ScannerError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(LedgerEntries::new());
            }
            Err(e) => return Err(self.error(e)),
        };

        if content.trim().is_empty() {
            return Ok(LedgerEntries::new());
        }

        serde_json::from_str(&content).map_err(|e| self.error(e))
    }

    fn save(&self, entries: &LedgerEntries) -> Result<(), ScannerError> {
        let json = serde_json::to_string_pretty(entries).map_err(|e| self.error(e))?;
        let tmp = self.temp_path();
        std::fs::write(&tmp, json).map_err(|e| self.error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.error(e))
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
