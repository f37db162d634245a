//! 통합 테스트 공용 가짜 구현

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use lockwatch_scanner::{
    Advisory, Clock, Finding, FindingSink, ManifestFetcher, NormalizedVersion, PackageRef,
    Reference, RepositoryTarget, ScannerError, VulnerabilityLookup,
};

pub const T0: u64 = 1_700_000_000_000;
pub const DAY_MS: u64 = 24 * 60 * 60 * 1000;

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn fixture(name: &str) -> Vec<u8> {
    std::fs::read(fixture_path(name)).unwrap()
}

pub fn advisory(id: &str) -> Advisory {
    Advisory {
        id: id.to_owned(),
        summary: format!("summary of {id}"),
        details: String::new(),
        references: vec![Reference {
            url: "http://x".to_owned(),
        }],
    }
}

/// 경로별 고정 응답을 돌려주는 fetcher. 등록되지 않은 대상은 `NotFound`.
#[derive(Default)]
pub struct MapFetcher {
    files: HashMap<(String, String, String), Vec<u8>>,
    transport_failures: Vec<(String, String)>,
}

impl MapFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, target: &RepositoryTarget, content: impl Into<Vec<u8>>) -> Self {
        self.files.insert(
            (
                target.owner.clone(),
                target.repo_name.clone(),
                target.config_path.clone(),
            ),
            content.into(),
        );
        self
    }

    pub fn with_transport_failure(mut self, owner: &str, repo: &str) -> Self {
        self.transport_failures
            .push((owner.to_owned(), repo.to_owned()));
        self
    }
}

#[async_trait]
impl ManifestFetcher for MapFetcher {
    async fn fetch(&self, target: &RepositoryTarget) -> Result<Vec<u8>, ScannerError> {
        if self
            .transport_failures
            .iter()
            .any(|(o, r)| *o == target.owner && *r == target.repo_name)
        {
            return Err(ScannerError::Transport("connection reset".to_owned()));
        }
        self.files
            .get(&(
                target.owner.clone(),
                target.repo_name.clone(),
                target.config_path.clone(),
            ))
            .cloned()
            .ok_or_else(|| ScannerError::NotFound {
                owner: target.owner.clone(),
                repo: target.repo_name.clone(),
                path: target.config_path.clone(),
            })
    }
}

/// 패키지 이름별 고정 응답을 돌려주는 조회기. 받은 (이름, 정규화 버전)을 기록합니다.
#[derive(Default)]
pub struct MapLookup {
    advisories: HashMap<String, Vec<Advisory>>,
    failures: HashMap<String, fn() -> ScannerError>,
    queries: Mutex<Vec<(String, String)>>,
}

impl MapLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, package: &str, advisories: Vec<Advisory>) -> Self {
        self.advisories.insert(package.to_owned(), advisories);
        self
    }

    pub fn failing(mut self, package: &str, error: fn() -> ScannerError) -> Self {
        self.failures.insert(package.to_owned(), error);
        self
    }

    pub fn queries(&self) -> Vec<(String, String)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl VulnerabilityLookup for MapLookup {
    async fn query(
        &self,
        package: &PackageRef,
        version: &NormalizedVersion,
    ) -> Result<Vec<Advisory>, ScannerError> {
        self.queries
            .lock()
            .unwrap()
            .push((package.name.clone(), version.as_str().to_owned()));
        if let Some(make_error) = self.failures.get(&package.name) {
            return Err(make_error());
        }
        Ok(self
            .advisories
            .get(&package.name)
            .cloned()
            .unwrap_or_default())
    }
}

/// 전달받은 취약점을 기록하는 sink. 지정한 ID는 전송 실패로 처리합니다.
#[derive(Default)]
pub struct RecordingSink {
    delivered: Mutex<Vec<Finding>>,
    failing_ids: Mutex<Vec<String>>,
    attempts: AtomicUsize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(&self, id: &str) {
        self.failing_ids.lock().unwrap().push(id.to_owned());
    }

    pub fn recover(&self) {
        self.failing_ids.lock().unwrap().clear();
    }

    pub fn delivered_ids(&self) -> Vec<String> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .map(|f| f.id.clone())
            .collect()
    }

    pub fn delivered(&self) -> Vec<Finding> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FindingSink for RecordingSink {
    async fn deliver(&self, finding: &Finding) -> Result<(), ScannerError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing_ids.lock().unwrap().contains(&finding.id) {
            return Err(ScannerError::Delivery("channel unavailable".to_owned()));
        }
        self.delivered.lock().unwrap().push(finding.clone());
        Ok(())
    }
}

/// 열릴 때까지 전달을 막는 sink (single-flight 테스트용)
#[derive(Default)]
pub struct GateSink {
    pub entered: Notify,
    pub release: Notify,
}

#[async_trait]
impl FindingSink for GateSink {
    async fn deliver(&self, _: &Finding) -> Result<(), ScannerError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(())
    }
}

/// 테스트가 직접 움직이는 시계
pub struct ManualClock(AtomicU64);

impl ManualClock {
    pub fn at(now_ms: u64) -> Arc<Self> {
        Arc::new(Self(AtomicU64::new(now_ms)))
    }

    pub fn advance(&self, ms: u64) {
        self.0.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}
