use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use lockwatch_core::config::LockwatchConfig;
use lockwatch_daemon::cli::DaemonCli;
use lockwatch_daemon::daemon::{Daemon, wait_for_shutdown_signal};
use lockwatch_daemon::{logging, metrics_server};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    // 파일 -> 환경변수 -> CLI 순으로 덮어쓰기
    let mut config = LockwatchConfig::from_file(&cli.config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
    config.apply_env_overrides();
    cli.apply_overrides(&mut config);

    if cli.validate {
        config.validate()?;
        config.validate_credentials()?;
        println!("configuration is valid: {}", cli.config.display());
        return Ok(());
    }

    logging::init_tracing(&config.general)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "lockwatch-daemon starting"
    );

    if config.metrics.enabled {
        metrics_server::install_metrics_recorder(&config.metrics)?;
    }

    let daemon = Daemon::build_from_config(&config)?;

    if cli.once {
        if daemon.run_once().await.is_none() {
            tracing::warn!("scan cycle skipped");
        }
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    let signal_task = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            match wait_for_shutdown_signal().await {
                Ok(signal) => tracing::info!(signal = signal, "shutdown signal received"),
                Err(e) => tracing::error!(error = %e, "signal handling failed, shutting down"),
            }
            shutdown.cancel();
        })
    };

    daemon.run(shutdown).await;
    signal_task.abort();

    tracing::info!("lockwatch-daemon shut down");
    Ok(())
}
