//! 주기적 스캔 서비스 -- 사이클 단일 실행 보장
//!
//! [`ScanService`]는 오케스트레이터를 `tokio::sync::Mutex` 뒤에 두고,
//! 이미 사이클이 진행 중이면 새 요청을 건너뜁니다 (single-flight).
//! [`ScanService::run`]은 첫 tick을 즉시 실행한 뒤 주기마다 사이클을 시작하고,
//! `CancellationToken`이 취소되면 진행 중인 사이클을 중단하고 반환합니다.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use lockwatch_core::metrics as m;

use crate::error::ScannerError;
use crate::ledger::LedgerStore;
use crate::scanner::{CycleReport, FindingSink, ScanOrchestrator};
use crate::types::{RepositoryList, RepositoryTarget};

/// 저장소 목록 JSON 파일을 읽습니다.
///
/// `repositories` 키가 없으면 빈 목록입니다.
///
/// # Errors
///
/// - 파일 읽기 실패: `Io`
/// - JSON 해석 실패: `Config`
pub fn load_repositories(path: &Path) -> Result<Vec<RepositoryTarget>, ScannerError> {
    let content = std::fs::read_to_string(path).map_err(|e| ScannerError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let list: RepositoryList =
        serde_json::from_str(&content).map_err(|e| ScannerError::Config {
            field: "repositories_file".to_owned(),
            reason: format!("{}: {e}", path.display()),
        })?;
    Ok(list.repositories)
}

struct ServiceState<S: LedgerStore> {
    orchestrator: ScanOrchestrator<S>,
    targets: Vec<RepositoryTarget>,
}

/// 스캔 서비스
pub struct ScanService<S: LedgerStore> {
    state: Mutex<ServiceState<S>>,
    sink: Arc<dyn FindingSink>,
    repositories_file: Option<PathBuf>,
}

impl<S: LedgerStore + 'static> ScanService<S> {
    /// 고정된 대상 목록으로 서비스를 생성합니다.
    pub fn new(
        orchestrator: ScanOrchestrator<S>,
        sink: Arc<dyn FindingSink>,
        targets: Vec<RepositoryTarget>,
    ) -> Self {
        Self {
            state: Mutex::new(ServiceState {
                orchestrator,
                targets,
            }),
            sink,
            repositories_file: None,
        }
    }

    /// 사이클마다 저장소 목록 파일을 다시 읽도록 합니다.
    ///
    /// 다시 읽기에 실패하면 경고를 남기고 이전 목록을 씁니다.
    pub fn with_repositories_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.repositories_file = Some(path.into());
        self
    }

    /// 사이클을 한 번 실행합니다.
    ///
    /// 다른 사이클이 진행 중이면 기다리지 않고 `None`을 반환합니다.
    pub async fn trigger(&self) -> Option<CycleReport> {
        let Ok(mut state) = self.state.try_lock() else {
            metrics::counter!(m::SCAN_CYCLES_SKIPPED_TOTAL).increment(1);
            info!("previous scan cycle still running, skipping tick");
            return None;
        };

        if let Some(path) = &self.repositories_file {
            match load_repositories(path) {
                Ok(targets) => state.targets = targets,
                Err(e) => warn!(
                    path = %path.display(),
                    error = %e,
                    kept = state.targets.len(),
                    "failed to reload repository list, keeping previous"
                ),
            }
        }

        let state = &mut *state;
        Some(
            state
                .orchestrator
                .run_cycle(&state.targets, self.sink.as_ref())
                .await,
        )
    }

    /// 현재 대상 목록 사본
    ///
    /// 사이클이 진행 중이면 끝날 때까지 기다립니다.
    pub async fn targets(&self) -> Vec<RepositoryTarget> {
        self.state.lock().await.targets.clone()
    }

    /// 주기적으로 사이클을 실행합니다. `shutdown`이 취소될 때까지 반환하지 않습니다.
    ///
    /// 각 사이클은 별도 태스크에서 돌기 때문에, 사이클이 주기보다 길어지면
    /// 그동안의 tick은 [`trigger`](Self::trigger)에서 건너뜁니다.
    pub async fn run(self: Arc<Self>, interval: Duration, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut in_flight: Option<JoinHandle<()>> = None;

        info!(interval_secs = interval.as_secs(), "periodic scan started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    if in_flight.as_ref().is_some_and(|h| h.is_finished()) {
                        in_flight = None;
                    }
                    let service = Arc::clone(&self);
                    let handle = tokio::spawn(async move {
                        service.trigger().await;
                    });
                    // 진행 중인 사이클이 있으면 새 태스크는 곧바로 건너뛰고 끝남
                    if in_flight.is_none() {
                        in_flight = Some(handle);
                    }
                }
            }
        }

        if let Some(handle) = in_flight {
            if !handle.is_finished() {
                info!("aborting in-flight scan cycle");
            }
            handle.abort();
            let _ = handle.await;
        }

        info!("periodic scan stopped");
    }
}
