//! 취약점 조회 -- OSV API 클라이언트
//!
//! [`VulnerabilityLookup`] trait은 (패키지, 정규화된 버전) 하나에 대해 알려진 취약점 목록을
//! 반환합니다. 오케스트레이터는 이 trait에만 의존하므로 테스트에서는 가짜 구현으로,
//! 운영에서는 [`OsvClient`]를 [`RetryingLookup`]으로 감싸서 사용합니다.

pub mod client;
pub mod retry;

pub use client::OsvClient;
pub use retry::{RetryConfig, RetryingLookup};

use async_trait::async_trait;

use crate::error::ScannerError;
use crate::types::{Advisory, NormalizedVersion, PackageRef};

/// 취약점 조회 trait
///
/// 구현체는 결과 순서를 보존해야 합니다. 결과가 없으면 빈 목록을 반환합니다.
#[async_trait]
pub trait VulnerabilityLookup: Send + Sync {
    /// 패키지 하나의 취약점을 조회합니다.
    ///
    /// # Errors
    ///
    /// - `Transport`: 네트워크 실패
    /// - `RateLimited`: 요청 한도 초과
    /// - `InvalidResponse`: 응답 상태 또는 본문 이상
    async fn query(
        &self,
        package: &PackageRef,
        version: &NormalizedVersion,
    ) -> Result<Vec<Advisory>, ScannerError>;
}

#[async_trait]
impl<T: VulnerabilityLookup + ?Sized> VulnerabilityLookup for std::sync::Arc<T> {
    async fn query(
        &self,
        package: &PackageRef,
        version: &NormalizedVersion,
    ) -> Result<Vec<Advisory>, ScannerError> {
        (**self).query(package, version).await
    }
}
