//! 스캐너 설정
//!
//! [`ScannerConfig`]는 core의 [`LockwatchConfig`]에서 스캔 파이프라인이 쓰는 값만
//! 모아 단위를 맞춘 것입니다 (윈도우는 밀리초, 주기는 [`Duration`]).
//!
//! ```
//! use lockwatch_core::config::LockwatchConfig;
//! use lockwatch_scanner::ScannerConfig;
//!
//! let config = ScannerConfig::from_core(&LockwatchConfig::default());
//! assert_eq!(config.window_ms, 7 * 24 * 60 * 60 * 1000);
//! config.validate().unwrap();
//! ```

use std::time::Duration;

use lockwatch_core::config::LockwatchConfig;

use crate::error::ScannerError;
use crate::ledger::DEFAULT_WINDOW_MS;
use crate::parser::DEFAULT_MAX_MANIFEST_SIZE;

const MAX_LOOKUP_CONCURRENCY: usize = 32;

/// 스캔 파이프라인 설정
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// 저장소 목록 JSON 경로
    pub repositories_file: String,
    /// 스캔 주기
    pub interval: Duration,
    /// 패키지 조회 동시 실행 수
    pub lookup_concurrency: usize,
    /// 매니페스트 최대 크기 (바이트)
    pub max_manifest_size: usize,
    /// 원장 파일 경로
    pub ledger_path: String,
    /// 재알림 억제 윈도우 (밀리초)
    pub window_ms: u64,
    /// 사이클 시작 시 만료 항목 정리 여부
    pub prune_expired: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            repositories_file: "config/repositories.json".to_owned(),
            interval: Duration::from_secs(3600),
            lookup_concurrency: 1,
            max_manifest_size: DEFAULT_MAX_MANIFEST_SIZE,
            ledger_path: "data/sent_vulns.json".to_owned(),
            window_ms: DEFAULT_WINDOW_MS,
            prune_expired: true,
        }
    }
}

impl ScannerConfig {
    /// core 설정에서 스캐너 설정을 생성합니다.
    pub fn from_core(core: &LockwatchConfig) -> Self {
        Self {
            repositories_file: core.scan.repositories_file.clone(),
            interval: Duration::from_secs(core.scan.interval_secs),
            lookup_concurrency: core.scan.lookup_concurrency,
            max_manifest_size: core.scan.max_manifest_size,
            ledger_path: core.ledger.path.clone(),
            window_ms: core.ledger.window_secs.saturating_mul(1000),
            prune_expired: core.ledger.prune_expired,
        }
    }

    /// 설정 값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ScannerError> {
        if self.interval.is_zero() {
            return Err(config_error("interval", "must be greater than 0"));
        }
        if self.lookup_concurrency == 0 || self.lookup_concurrency > MAX_LOOKUP_CONCURRENCY {
            return Err(config_error(
                "lookup_concurrency",
                format!("must be between 1 and {MAX_LOOKUP_CONCURRENCY}"),
            ));
        }
        if self.max_manifest_size == 0 {
            return Err(config_error("max_manifest_size", "must be greater than 0"));
        }
        if self.window_ms == 0 {
            return Err(config_error("window_ms", "must be greater than 0"));
        }
        if self.ledger_path.is_empty() {
            return Err(config_error("ledger_path", "must not be empty"));
        }
        Ok(())
    }
}

fn config_error(field: &str, reason: impl Into<String>) -> ScannerError {
    ScannerError::Config {
        field: field.to_owned(),
        reason: reason.into(),
    }
}
