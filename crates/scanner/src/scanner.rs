//! 스캔 오케스트레이터 -- 한 사이클의 전체 흐름 관리
//!
//! [`ScanOrchestrator`]는 대상 저장소마다 매니페스트를 가져와 파싱하고,
//! 패키지마다 취약점을 조회한 뒤 원장으로 걸러낸 결과를 [`FindingSink`]에 넘깁니다.
//!
//! # 내부 아키텍처
//!
//! ```text
//! RepositoryTarget --> ManifestFetcher --> ParserRegistry --> Vec<PackageRef>
//!                                                                  |
//!                                              buffered(lookup_concurrency)
//!                                                                  |
//!                                                        VulnerabilityLookup
//!                                                                  |
//!                                                      Finding --> DedupLedger
//!                                                                  |
//!                                                   FindingSink::deliver --> record_notified
//! ```
//!
//! # 실패 처리
//!
//! 실패는 가장 좁은 범위에서 [`UnitFailure`]로 기록되고 사이클은 계속됩니다.
//! 전송이 실패한 취약점은 원장에 기록하지 않으므로 다음 사이클에서 다시 시도됩니다.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, info, warn};

use lockwatch_core::metrics as m;

use crate::error::ScannerError;
use crate::fetcher::ManifestFetcher;
use crate::ledger::{DedupLedger, LedgerStore};
use crate::osv::VulnerabilityLookup;
use crate::parser::ParserRegistry;
use crate::types::{Advisory, Finding, PackageRef, RepositoryTarget};

/// 알림 대상 취약점을 받는 쪽
///
/// `Ok`를 반환해야만 원장에 기록됩니다.
#[async_trait]
pub trait FindingSink: Send + Sync {
    async fn deliver(&self, finding: &Finding) -> Result<(), ScannerError>;
}

/// 현재 시각 (epoch millis)
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// 시스템 시계
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// 실패가 발생한 범위
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureScope {
    /// 대상 저장소 전체를 건너뜀 (fetch, parse)
    Target,
    /// 패키지 하나를 건너뜀 (lookup, delivery, ledger)
    Package,
}

impl fmt::Display for FailureScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Target => f.write_str("target"),
            Self::Package => f.write_str("package"),
        }
    }
}

/// 건너뛴 작업 단위 하나
#[derive(Debug)]
pub struct UnitFailure {
    pub scope: FailureScope,
    pub target: RepositoryTarget,
    pub package: Option<PackageRef>,
    /// 전송 또는 원장 기록 실패 시 해당 취약점 ID
    pub finding_id: Option<String>,
    pub error: ScannerError,
}

/// 사이클 결과 요약
#[derive(Debug)]
pub struct CycleReport {
    pub cycle_id: String,
    pub targets_total: usize,
    /// 파싱까지 성공한 대상 수
    pub targets_scanned: usize,
    pub packages_checked: usize,
    /// 전송에 성공한 취약점 (전송 순서)
    pub notified: Vec<Finding>,
    /// 윈도우 안이라 억제된 수
    pub suppressed: usize,
    /// 사이클 시작 시 정리된 원장 항목 수
    pub pruned: usize,
    pub failures: Vec<UnitFailure>,
    pub duration: Duration,
}

impl CycleReport {
    fn new(targets_total: usize) -> Self {
        Self {
            cycle_id: uuid::Uuid::new_v4().to_string(),
            targets_total,
            targets_scanned: 0,
            packages_checked: 0,
            notified: Vec::new(),
            suppressed: 0,
            pruned: 0,
            failures: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    /// 특정 범위의 실패만 반환합니다.
    pub fn failures_in(&self, scope: FailureScope) -> impl Iterator<Item = &UnitFailure> {
        self.failures.iter().filter(move |f| f.scope == scope)
    }

    /// 실패 없이 끝났는지 여부
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cycle {}: {}/{} targets, {} packages, {} notified, {} suppressed, {} failures in {:.2}s",
            self.cycle_id,
            self.targets_scanned,
            self.targets_total,
            self.packages_checked,
            self.notified.len(),
            self.suppressed,
            self.failures.len(),
            self.duration.as_secs_f64()
        )
    }
}

/// 스캔 오케스트레이터
///
/// 원장을 독점 소유하며 `run_cycle`은 `&mut self`를 요구하므로 사이클이 겹칠 수 없습니다.
pub struct ScanOrchestrator<S: LedgerStore> {
    fetcher: Arc<dyn ManifestFetcher>,
    registry: ParserRegistry,
    lookup: Arc<dyn VulnerabilityLookup>,
    ledger: DedupLedger<S>,
    clock: Arc<dyn Clock>,
    lookup_concurrency: usize,
    prune_expired: bool,
}

impl<S: LedgerStore> ScanOrchestrator<S> {
    /// 원장 읽기 전용 접근
    pub fn ledger(&self) -> &DedupLedger<S> {
        &self.ledger
    }

    /// 한 사이클을 실행합니다.
    ///
    /// 대상과 패키지는 입력 순서대로 처리하며, 개별 실패는 보고서에 담고 계속 진행합니다.
    pub async fn run_cycle(
        &mut self,
        targets: &[RepositoryTarget],
        sink: &dyn FindingSink,
    ) -> CycleReport {
        let started = Instant::now();
        let mut report = CycleReport::new(targets.len());
        info!(cycle_id = %report.cycle_id, targets = targets.len(), "scan cycle started");

        if self.prune_expired {
            match self.ledger.prune_expired(self.clock.now_ms()) {
                Ok(removed) => report.pruned = removed,
                Err(e) => warn!(error = %e, "failed to prune ledger, continuing"),
            }
        }

        for target in targets {
            self.scan_target(target, sink, &mut report).await;
        }

        report.duration = started.elapsed();
        metrics::counter!(m::SCAN_CYCLES_TOTAL).increment(1);
        metrics::histogram!(m::SCAN_CYCLE_DURATION_SECONDS).record(report.duration.as_secs_f64());

        info!(
            cycle_id = %report.cycle_id,
            targets_scanned = report.targets_scanned,
            packages = report.packages_checked,
            notified = report.notified.len(),
            suppressed = report.suppressed,
            failures = report.failures.len(),
            duration_ms = report.duration.as_millis() as u64,
            "scan cycle completed"
        );

        report
    }

    async fn scan_target(
        &mut self,
        target: &RepositoryTarget,
        sink: &dyn FindingSink,
        report: &mut CycleReport,
    ) {
        let content = match self.fetcher.fetch(target).await {
            Ok(c) => c,
            Err(e) => {
                record_failure(report, FailureScope::Target, target, None, None, e);
                return;
            }
        };

        let packages = match self.registry.parse(&content, &target.config_path) {
            Ok(p) => p,
            Err(e) => {
                record_failure(report, FailureScope::Target, target, None, None, e);
                return;
            }
        };

        report.targets_scanned += 1;
        debug!(
            owner = %target.owner,
            repo = %target.repo_name,
            packages = packages.len(),
            "manifest parsed"
        );

        // 조회는 최대 lookup_concurrency개까지 앞서 실행되지만, 결과는 매니페스트 순서로 소비
        let lookup = Arc::clone(&self.lookup);
        let mut results = futures::stream::iter(packages.into_iter().map(move |package| {
            let lookup = Arc::clone(&lookup);
            async move {
                let version = package.normalized_version();
                let result = lookup.query(&package, &version).await;
                (package, result)
            }
        }))
        .buffered(self.lookup_concurrency.max(1));

        while let Some((package, result)) = results.next().await {
            report.packages_checked += 1;
            metrics::counter!(m::PACKAGES_CHECKED_TOTAL, m::LABEL_ECOSYSTEM => package.ecosystem.osv_name())
                .increment(1);

            match result {
                Ok(advisories) => {
                    self.handle_advisories(target, &package, advisories, sink, report)
                        .await;
                }
                Err(e) => {
                    record_failure(report, FailureScope::Package, target, Some(&package), None, e);
                }
            }
        }
    }

    async fn handle_advisories(
        &mut self,
        target: &RepositoryTarget,
        package: &PackageRef,
        advisories: Vec<Advisory>,
        sink: &dyn FindingSink,
        report: &mut CycleReport,
    ) {
        if advisories.is_empty() {
            debug!(package = %package.name, version = %package.version, "no vulnerabilities");
            return;
        }

        for advisory in advisories {
            let finding = Finding::from_advisory(advisory, package, target);

            if !self.ledger.should_notify(&finding.id, self.clock.now_ms()) {
                debug!(vuln_id = %finding.id, package = %package.name, "already notified within window");
                report.suppressed += 1;
                metrics::counter!(m::NOTIFICATIONS_SUPPRESSED_TOTAL).increment(1);
                continue;
            }

            if let Err(e) = sink.deliver(&finding).await {
                metrics::counter!(m::NOTIFICATIONS_FAILED_TOTAL).increment(1);
                let id = finding.id.clone();
                record_failure(report, FailureScope::Package, target, Some(package), Some(id), e);
                continue;
            }

            metrics::counter!(m::NOTIFICATIONS_SENT_TOTAL).increment(1);
            info!(
                vuln_id = %finding.id,
                package = %package.name,
                owner = %target.owner,
                repo = %target.repo_name,
                "vulnerability notified"
            );

            if let Err(e) = self.ledger.record_notified(&finding.id, self.clock.now_ms()) {
                let id = finding.id.clone();
                record_failure(report, FailureScope::Package, target, Some(package), Some(id), e);
            }
            report.notified.push(finding);
        }
    }
}

fn record_failure(
    report: &mut CycleReport,
    scope: FailureScope,
    target: &RepositoryTarget,
    package: Option<&PackageRef>,
    finding_id: Option<String>,
    error: ScannerError,
) {
    metrics::counter!(m::UNIT_FAILURES_TOTAL, m::LABEL_KIND => error.kind()).increment(1);
    warn!(
        scope = %scope,
        owner = %target.owner,
        repo = %target.repo_name,
        path = %target.config_path,
        package = package.map(|p| p.name.as_str()).unwrap_or("-"),
        vuln_id = finding_id.as_deref().unwrap_or("-"),
        kind = error.kind(),
        error = %error,
        "skipping unit of work"
    );
    report.failures.push(UnitFailure {
        scope,
        target: target.clone(),
        package: package.cloned(),
        finding_id,
        error,
    });
}

/// 스캔 오케스트레이터 빌더
///
/// 가져오기, 조회, 원장은 필수이며 나머지는 기본값을 씁니다.
pub struct ScanOrchestratorBuilder<S: LedgerStore> {
    fetcher: Option<Arc<dyn ManifestFetcher>>,
    registry: Option<ParserRegistry>,
    lookup: Option<Arc<dyn VulnerabilityLookup>>,
    ledger: Option<DedupLedger<S>>,
    clock: Arc<dyn Clock>,
    lookup_concurrency: usize,
    prune_expired: bool,
}

impl<S: LedgerStore> ScanOrchestratorBuilder<S> {
    pub fn new() -> Self {
        Self {
            fetcher: None,
            registry: None,
            lookup: None,
            ledger: None,
            clock: Arc::new(SystemClock),
            lookup_concurrency: 1,
            prune_expired: false,
        }
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn ManifestFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// 파서 레지스트리를 지정합니다 (기본: npm + Packagist).
    pub fn registry(mut self, registry: ParserRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn lookup(mut self, lookup: Arc<dyn VulnerabilityLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn ledger(mut self, ledger: DedupLedger<S>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn lookup_concurrency(mut self, concurrency: usize) -> Self {
        self.lookup_concurrency = concurrency;
        self
    }

    /// 사이클 시작 시 만료된 원장 항목을 정리할지 지정합니다.
    pub fn prune_expired(mut self, prune: bool) -> Self {
        self.prune_expired = prune;
        self
    }

    pub fn build(self) -> Result<ScanOrchestrator<S>, ScannerError> {
        let missing = |field: &str| ScannerError::Config {
            field: field.to_owned(),
            reason: "required component is not set".to_owned(),
        };

        if self.lookup_concurrency == 0 {
            return Err(ScannerError::Config {
                field: "lookup_concurrency".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        Ok(ScanOrchestrator {
            fetcher: self.fetcher.ok_or_else(|| missing("fetcher"))?,
            registry: self.registry.unwrap_or_default(),
            lookup: self.lookup.ok_or_else(|| missing("lookup"))?,
            ledger: self.ledger.ok_or_else(|| missing("ledger"))?,
            clock: self.clock,
            lookup_concurrency: self.lookup_concurrency,
            prune_expired: self.prune_expired,
        })
    }
}

impl<S: LedgerStore> Default for ScanOrchestratorBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}
