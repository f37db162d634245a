//! OSV `/v1/query` HTTP 클라이언트

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use lockwatch_core::config::OsvConfig;

use crate::error::ScannerError;
use crate::osv::VulnerabilityLookup;
use crate::types::{Advisory, NormalizedVersion, PackageRef};

/// OSV 쿼리 요청 본문
#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    version: &'a str,
    package: QueryPackage<'a>,
}

#[derive(Debug, Serialize)]
struct QueryPackage<'a> {
    name: &'a str,
    ecosystem: &'a str,
}

/// OSV 쿼리 응답 본문. 결과가 없으면 `{}`가 옵니다.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    vulns: Vec<Advisory>,
}

/// OSV API 클라이언트
///
/// 한 번의 호출은 한 번의 HTTP 요청입니다. 재시도는 [`RetryingLookup`](super::RetryingLookup)이 담당합니다.
#[derive(Debug, Clone)]
pub struct OsvClient {
    http: reqwest::Client,
    query_url: String,
}

impl OsvClient {
    /// 기본 URL과 요청 타임아웃으로 클라이언트를 생성합니다.
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, ScannerError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("lockwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ScannerError::Config {
                field: "osv".to_owned(),
                reason: format!("failed to build http client: {e}"),
            })?;

        Ok(Self {
            http,
            query_url: format!("{}/v1/query", api_url.trim_end_matches('/')),
        })
    }

    /// 코어 설정에서 클라이언트를 생성합니다.
    pub fn from_config(config: &OsvConfig) -> Result<Self, ScannerError> {
        Self::new(&config.api_url, Duration::from_secs(config.timeout_secs))
    }
}

#[async_trait]
impl VulnerabilityLookup for OsvClient {
    async fn query(
        &self,
        package: &PackageRef,
        version: &NormalizedVersion,
    ) -> Result<Vec<Advisory>, ScannerError> {
        let body = QueryRequest {
            version: version.as_str(),
            package: QueryPackage {
                name: &package.name,
                ecosystem: package.ecosystem.osv_name(),
            },
        };

        let response = self
            .http
            .post(&self.query_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ScannerError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            return Err(ScannerError::RateLimited { retry_after_secs });
        }
        if !status.is_success() {
            return Err(ScannerError::InvalidResponse(format!(
                "unexpected status {status} for {}",
                package.name
            )));
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| ScannerError::InvalidResponse(e.to_string()))?;

        debug!(
            package = %package.name,
            ecosystem = %package.ecosystem,
            version = %version,
            count = parsed.vulns.len(),
            "osv query completed"
        );

        Ok(parsed.vulns)
    }
}
