//! 메모리 원장 저장소 (테스트용)

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::ScannerError;
use crate::ledger::{LedgerEntries, LedgerStore};

#[derive(Default)]
struct Inner {
    entries: Mutex<LedgerEntries>,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

/// 프로세스 메모리에만 존재하는 원장 저장소
///
/// 복제본은 같은 문서를 공유하므로 "재시작" 시나리오를 흉내 낼 수 있습니다.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 초기 문서를 가진 저장소
    pub fn with_entries(entries: LedgerEntries) -> Self {
        let store = Self::new();
        if let Ok(mut guard) = store.inner.entries.lock() {
            *guard = entries;
        }
        store
    }

    /// `true`면 이후 저장이 모두 실패합니다.
    pub fn fail_saves(&self, fail: bool) {
        self.inner.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// 성공한 저장 횟수
    pub fn save_count(&self) -> usize {
        self.inner.saves.load(Ordering::SeqCst)
    }

    /// 현재 저장된 문서 사본
    pub fn snapshot(&self) -> LedgerEntries {
        self.inner
            .entries
            .lock()
            .map(|g| g.clone())
            .unwrap_or_default()
    }

    fn poisoned(&self) -> ScannerError {
        ScannerError::Ledger {
            path: self.location(),
            reason: "store lock poisoned".to_owned(),
        }
    }
}

impl LedgerStore for MemoryStore {
    fn load(&self) -> Result<LedgerEntries, ScannerError> {
        let guard = self.inner.entries.lock().map_err(|_| self.poisoned())?;
        Ok(guard.clone())
    }

    fn save(&self, entries: &LedgerEntries) -> Result<(), ScannerError> {
        if self.inner.fail_saves.load(Ordering::SeqCst) {
            return Err(ScannerError::Ledger {
                path: self.location(),
                reason: "save rejected".to_owned(),
            });
        }
        let mut guard = self.inner.entries.lock().map_err(|_| self.poisoned())?;
        *guard = entries.clone();
        self.inner.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_owned()
    }
}
