//! 매니페스트 가져오기 -- GitHub 콘텐츠 API
//!
//! [`ManifestFetcher`]는 `(owner, repo, path)`의 원본 바이트를 돌려줍니다.
//! [`GithubFetcher`]는 `GET /repos/{owner}/{repo}/contents/{path}` 응답의
//! base64 `content` 필드를 디코딩합니다.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use lockwatch_core::config::GithubConfig;

use crate::error::ScannerError;
use crate::types::RepositoryTarget;

/// 매니페스트 가져오기 trait
#[async_trait]
pub trait ManifestFetcher: Send + Sync {
    /// 대상 저장소의 매니페스트 원본을 가져옵니다.
    ///
    /// # Errors
    ///
    /// - `NotFound`: 경로가 없음
    /// - `Transport`: 네트워크 실패, 그 밖의 비정상 응답
    async fn fetch(&self, target: &RepositoryTarget) -> Result<Vec<u8>, ScannerError>;
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

/// GitHub 콘텐츠 API 클라이언트
#[derive(Debug, Clone)]
pub struct GithubFetcher {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

impl GithubFetcher {
    pub fn new(api_url: &str, token: impl Into<String>) -> Result<Self, ScannerError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent("lockwatch")
            .build()
            .map_err(|e| ScannerError::Config {
                field: "github".to_owned(),
                reason: format!("failed to build http client: {e}"),
            })?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_owned(),
            token: token.into(),
        })
    }

    pub fn from_config(config: &GithubConfig) -> Result<Self, ScannerError> {
        Self::new(&config.api_url, config.token.clone())
    }

    fn contents_url(&self, target: &RepositoryTarget) -> String {
        let path = target
            .config_path
            .trim_start_matches('/')
            .split('/')
            .map(encode_segment)
            .collect::<Vec<_>>()
            .join("/");
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_url,
            encode_segment(&target.owner),
            encode_segment(&target.repo_name),
            path
        )
    }
}

/// 경로 세그먼트 하나를 퍼센트 인코딩 (RFC 3986 unreserved 외 전부)
fn encode_segment(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(char::from(byte));
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}

#[async_trait]
impl ManifestFetcher for GithubFetcher {
    async fn fetch(&self, target: &RepositoryTarget) -> Result<Vec<u8>, ScannerError> {
        let mut request = self
            .http
            .get(self.contents_url(target))
            .header(reqwest::header::ACCEPT, "application/vnd.github+json");
        if !self.token.is_empty() {
            request = request.bearer_auth(&self.token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ScannerError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ScannerError::NotFound {
                owner: target.owner.clone(),
                repo: target.repo_name.clone(),
                path: target.config_path.clone(),
            });
        }
        if !status.is_success() {
            return Err(ScannerError::Transport(format!(
                "github returned {status} for {target}"
            )));
        }

        let body: ContentResponse = response
            .json()
            .await
            .map_err(|e| ScannerError::Transport(format!("unreadable contents response: {e}")))?;

        if let Some(encoding) = body.encoding.as_deref().filter(|e| *e != "base64") {
            return Err(ScannerError::Transport(format!(
                "unexpected content encoding {encoding} for {target}"
            )));
        }

        let encoded = body.content.ok_or_else(|| {
            ScannerError::Transport(format!("contents response has no content for {target}"))
        })?;

        // GitHub은 60자마다 줄바꿈을 넣음
        let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        let bytes = STANDARD
            .decode(compact)
            .map_err(|e| ScannerError::Transport(format!("invalid base64 content: {e}")))?;

        debug!(
            owner = %target.owner,
            repo = %target.repo_name,
            path = %target.config_path,
            bytes = bytes.len(),
            "manifest fetched"
        );

        Ok(bytes)
    }
}
