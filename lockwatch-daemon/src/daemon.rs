//! Daemon assembly and lifecycle.
//!
//! [`Daemon`] turns a validated [`LockwatchConfig`] into a running
//! [`ScanService`]: GitHub fetcher, parser registry, OSV client with retry,
//! file-backed dedup ledger and Discord sink.
//!
//! # Startup failures
//!
//! Missing credentials, an unreadable repository list and a corrupt
//! ledger file abort startup. Everything after that is handled per cycle.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use lockwatch_core::config::LockwatchConfig;
use lockwatch_scanner::{
    CycleReport, DedupLedger, GithubFetcher, JsonFileStore, NotifyingSink, OsvClient,
    ParserRegistry, RepositoryTarget, RetryConfig, RetryingLookup, ScanOrchestratorBuilder,
    ScanService, ScannerConfig, load_repositories,
};

/// The assembled daemon.
pub struct Daemon {
    service: Arc<ScanService<JsonFileStore>>,
    interval: Duration,
}

impl Daemon {
    /// Build from an already-loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or any component fails to
    /// initialize.
    pub fn build_from_config(config: &LockwatchConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;
        config
            .validate_credentials()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        let scanner = ScannerConfig::from_core(config);
        scanner
            .validate()
            .map_err(|e| anyhow::anyhow!("scanner config validation failed: {}", e))?;

        let repositories_file = PathBuf::from(&scanner.repositories_file);
        let targets = load_repositories(&repositories_file)
            .map_err(|e| anyhow::anyhow!("failed to load repository list: {}", e))?;
        log_targets(&targets);

        let store = JsonFileStore::open(&scanner.ledger_path)
            .map_err(|e| anyhow::anyhow!("failed to open ledger: {}", e))?;
        let ledger = DedupLedger::with_window(store, scanner.window_ms)
            .map_err(|e| anyhow::anyhow!("failed to load ledger: {}", e))?;
        tracing::info!(
            path = %scanner.ledger_path,
            entries = ledger.len(),
            window_ms = scanner.window_ms,
            "dedup ledger loaded"
        );

        let fetcher = GithubFetcher::from_config(&config.github)
            .map_err(|e| anyhow::anyhow!("failed to build GitHub client: {}", e))?;
        let osv = OsvClient::from_config(&config.osv)
            .map_err(|e| anyhow::anyhow!("failed to build OSV client: {}", e))?;
        let lookup = RetryingLookup::new(osv, RetryConfig::from_config(&config.osv));
        let sink = NotifyingSink::discord(&config.discord)
            .map_err(|e| anyhow::anyhow!("failed to build Discord notifier: {}", e))?;

        let registry =
            ParserRegistry::with_defaults().with_max_manifest_size(scanner.max_manifest_size);

        let orchestrator = ScanOrchestratorBuilder::new()
            .fetcher(Arc::new(fetcher))
            .registry(registry)
            .lookup(Arc::new(lookup))
            .ledger(ledger)
            .lookup_concurrency(scanner.lookup_concurrency)
            .prune_expired(scanner.prune_expired)
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build scan orchestrator: {}", e))?;

        let service = ScanService::new(orchestrator, Arc::new(sink), targets)
            .with_repositories_file(repositories_file);

        Ok(Self {
            service: Arc::new(service),
            interval: scanner.interval,
        })
    }

    /// Run a single cycle. `None` means another cycle already held the service.
    pub async fn run_once(&self) -> Option<CycleReport> {
        let report = self.service.trigger().await;
        if let Some(report) = &report {
            tracing::info!(report = %report, "scan cycle finished");
        }
        report
    }

    /// Scan periodically until `shutdown` is cancelled.
    pub async fn run(&self, shutdown: CancellationToken) {
        Arc::clone(&self.service).run(self.interval, shutdown).await;
    }

    /// Scan interval taken from `scan.interval_secs`.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

fn log_targets(targets: &[RepositoryTarget]) {
    if targets.is_empty() {
        tracing::warn!("repository list is empty, nothing will be scanned");
        return;
    }
    for target in targets {
        tracing::debug!(target_repo = %target, "watching repository");
    }
    tracing::info!(count = targets.len(), "repository list loaded");
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
///
/// # Errors
///
/// Returns an error if signal handlers cannot be installed.
pub async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}
