//! 지수 백오프 재시도 래퍼

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use lockwatch_core::config::OsvConfig;

use crate::error::ScannerError;
use crate::osv::VulnerabilityLookup;
use crate::types::{Advisory, NormalizedVersion, PackageRef};

/// 재시도 설정
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// 최대 시도 횟수 (첫 시도 포함)
    pub max_attempts: u32,
    /// 첫 재시도 전 대기 시간
    pub initial_delay: Duration,
    /// 대기 시간 상한
    pub max_delay: Duration,
    /// 재시도마다 곱해지는 배수
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// 코어 OSV 설정에서 재시도 설정을 만듭니다.
    pub fn from_config(config: &OsvConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_delay: Duration::from_millis(config.initial_backoff_ms),
            max_delay: Duration::from_millis(config.max_backoff_ms),
            ..Self::default()
        }
    }

    /// 재시도 없이 한 번만 시도하는 설정
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }
}

/// 재시도 가능한 에러(`Transport`, `RateLimited`)에 한해 조회를 반복하는 래퍼
///
/// `RateLimited`에 `Retry-After`가 있으면 그 값(상한 적용)만큼 기다립니다.
pub struct RetryingLookup<L> {
    inner: L,
    config: RetryConfig,
}

impl<L> RetryingLookup<L> {
    pub fn new(inner: L, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }
}

#[async_trait]
impl<L: VulnerabilityLookup> VulnerabilityLookup for RetryingLookup<L> {
    async fn query(
        &self,
        package: &PackageRef,
        version: &NormalizedVersion,
    ) -> Result<Vec<Advisory>, ScannerError> {
        let mut attempts = 0;
        let mut delay = self.config.initial_delay;

        loop {
            attempts += 1;

            match self.inner.query(package, version).await {
                Ok(advisories) => return Ok(advisories),
                Err(error) => {
                    if attempts >= self.config.max_attempts || !error.is_retryable() {
                        return Err(error);
                    }

                    let wait = match &error {
                        ScannerError::RateLimited {
                            retry_after_secs: Some(secs),
                        } => Duration::from_secs(*secs).min(self.config.max_delay),
                        _ => delay,
                    };

                    debug!(
                        package = %package.name,
                        attempt = attempts,
                        max_attempts = self.config.max_attempts,
                        delay_ms = wait.as_millis() as u64,
                        error = %error,
                        "retrying osv query"
                    );

                    tokio::time::sleep(wait).await;

                    delay = std::cmp::min(
                        Duration::from_millis(
                            (delay.as_millis() as f64 * self.config.backoff_multiplier) as u64,
                        ),
                        self.config.max_delay,
                    );
                }
            }
        }
    }
}
