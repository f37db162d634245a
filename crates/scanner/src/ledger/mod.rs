//! 중복 알림 원장 -- 취약점 ID별 마지막 알림 시각
//!
//! [`DedupLedger`]는 `finding id -> 마지막 알림 시각(epoch millis)` 맵을 들고,
//! 윈도우(기본 7일) 안에 이미 알린 취약점을 걸러냅니다.
//!
//! # 쓰기 정책
//!
//! [`DedupLedger::record_notified`]는 메모리 갱신 직후 저장소 전체를 다시 씁니다 (write-through).
//! 저장이 실패해도 메모리 기록은 유지합니다. 이미 전송된 알림이므로 같은 프로세스에서는
//! 다시 보내지 않으며, 저장은 항상 문서 전체를 쓰므로 다음 저장 성공 때 함께 기록됩니다.
//!
//! # 저장소
//!
//! - [`JsonFileStore`]: `{ "<id>": <epochMillis> }` JSON 파일
//! - [`MemoryStore`]: 테스트용 메모리 저장소
//!
//! 단일 작성자를 가정합니다. 동시 스캔 방지는 [`ScanService`](crate::service::ScanService)가 담당합니다.

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use std::collections::BTreeMap;

use tracing::{debug, info};

use lockwatch_core::config::DEFAULT_DEDUP_WINDOW_SECS;
use lockwatch_core::metrics as m;

use crate::error::ScannerError;

/// 원장 문서: 취약점 ID -> 마지막 알림 시각 (epoch millis)
pub type LedgerEntries = BTreeMap<String, u64>;

/// 기본 억제 윈도우 (밀리초)
pub const DEFAULT_WINDOW_MS: u64 = DEFAULT_DEDUP_WINDOW_SECS * 1000;

/// 원장 저장소 trait
///
/// 저장은 항상 문서 전체를 교체합니다.
pub trait LedgerStore: Send + Sync {
    /// 저장된 문서를 읽습니다. 저장소가 비어 있으면 빈 맵을 반환합니다.
    fn load(&self) -> Result<LedgerEntries, ScannerError>;

    /// 문서 전체를 저장합니다.
    fn save(&self, entries: &LedgerEntries) -> Result<(), ScannerError>;

    /// 로그용 저장 위치 설명
    fn location(&self) -> String;
}

/// 중복 알림 원장
pub struct DedupLedger<S: LedgerStore> {
    store: S,
    entries: LedgerEntries,
    window_ms: u64,
}

impl<S: LedgerStore> DedupLedger<S> {
    /// 저장소에서 원장을 불러옵니다 (기본 7일 윈도우).
    pub fn open(store: S) -> Result<Self, ScannerError> {
        Self::with_window(store, DEFAULT_WINDOW_MS)
    }

    /// 지정한 윈도우(밀리초)로 원장을 불러옵니다.
    pub fn with_window(store: S, window_ms: u64) -> Result<Self, ScannerError> {
        let entries = store.load()?;
        info!(
            location = %store.location(),
            entries = entries.len(),
            window_ms,
            "dedup ledger loaded"
        );
        let ledger = Self {
            store,
            entries,
            window_ms,
        };
        ledger.report_size();
        Ok(ledger)
    }

    /// 알림 대상인지 판단합니다.
    ///
    /// 기록이 없거나 마지막 알림 후 윈도우 이상 지났으면 `true`.
    /// 시계가 뒤로 간 경우(`now_ms` < 기록 시각)는 윈도우 안으로 봅니다.
    pub fn should_notify(&self, finding_id: &str, now_ms: u64) -> bool {
        match self.entries.get(finding_id) {
            None => true,
            Some(&recorded) => now_ms.saturating_sub(recorded) >= self.window_ms,
        }
    }

    /// 알림 완료를 기록하고 즉시 저장합니다.
    ///
    /// 같은 ID를 다시 기록하면 시각만 덮어씁니다.
    ///
    /// # Errors
    ///
    /// 저장 실패 시 `Ledger` 에러. 메모리 기록은 그대로 남아 윈도우 동안 재알림을 막습니다.
    pub fn record_notified(&mut self, finding_id: &str, now_ms: u64) -> Result<(), ScannerError> {
        self.entries.insert(finding_id.to_owned(), now_ms);
        self.report_size();

        self.store.save(&self.entries)?;
        debug!(finding_id, now_ms, "ledger entry recorded");
        Ok(())
    }

    /// 윈도우가 지난 항목을 제거하고, 제거한 개수를 반환합니다.
    ///
    /// 제거된 항목은 정확히 `should_notify`가 `true`를 반환했을 항목이므로
    /// 알림 동작은 바뀌지 않습니다. 제거한 것이 있을 때만 저장합니다.
    pub fn prune_expired(&mut self, now_ms: u64) -> Result<usize, ScannerError> {
        let window_ms = self.window_ms;
        let expired: Vec<(String, u64)> = self
            .entries
            .iter()
            .filter(|(_, t)| now_ms.saturating_sub(**t) >= window_ms)
            .map(|(id, t)| (id.clone(), *t))
            .collect();

        if expired.is_empty() {
            return Ok(0);
        }

        for (id, _) in &expired {
            self.entries.remove(id);
        }

        if let Err(e) = self.store.save(&self.entries) {
            self.entries.extend(expired);
            return Err(e);
        }

        info!(removed = expired.len(), remaining = self.entries.len(), "ledger pruned");
        self.report_size();
        Ok(expired.len())
    }

    /// 마지막 알림 시각
    pub fn last_notified(&self, finding_id: &str) -> Option<u64> {
        self.entries.get(finding_id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    fn report_size(&self) {
        metrics::gauge!(m::LEDGER_ENTRIES).set(self.entries.len() as f64);
    }
}
