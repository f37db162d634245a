//! 스캐너 에러 타입
//!
//! [`ScannerError`]는 스캔 파이프라인의 각 단계에서 발생할 수 있는 모든 에러를 나타냅니다.
//! 오케스트레이터는 이 에러를 가장 좁은 범위(패키지, 대상 저장소)에서 잡아 기록하고
//! 다음 작업 단위로 넘어갑니다.
//!
//! # 에러 카테고리와 처리 범위
//!
//! - **대상 건너뜀**: `NotFound`, `Transport`(fetch), `UnsupportedFormat`, `MalformedManifest`
//! - **패키지 건너뜀**: `Transport`(lookup), `RateLimited`, `InvalidResponse`
//! - **원장 미기록**: `Delivery` -- 다음 사이클에서 재시도됨
//! - **원장**: `Ledger`
//! - **설정/파일**: `Config`, `Io`

use lockwatch_core::error::{ConfigError, LockwatchError, ScanError};

/// 스캐너 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum ScannerError {
    /// 저장소에 매니페스트 경로가 없음
    #[error("manifest not found: {owner}/{repo}/{path}")]
    NotFound {
        /// 저장소 소유자
        owner: String,
        /// 저장소 이름
        repo: String,
        /// 매니페스트 경로
        path: String,
    },

    /// 외부 호출 네트워크 실패
    #[error("transport error: {0}")]
    Transport(String),

    /// 등록된 파서가 없는 매니페스트 형식
    #[error("unsupported manifest format: {path}")]
    UnsupportedFormat {
        /// 매니페스트 경로
        path: String,
    },

    /// 매니페스트 해석 실패
    #[error("malformed manifest: {path}: {reason}")]
    MalformedManifest {
        /// 매니페스트 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 조회 API 요청 한도 초과
    #[error("rate limited (retry after {retry_after_secs:?}s)")]
    RateLimited {
        /// `Retry-After` 헤더 값 (초)
        retry_after_secs: Option<u64>,
    },

    /// 조회 API 응답 이상
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// 알림 전송 실패
    #[error("delivery error: {0}")]
    Delivery(String),

    /// 원장 로드/저장 실패
    #[error("ledger error: {path}: {reason}")]
    Ledger {
        /// 원장 저장 위치
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 파일 I/O 에러
    #[error("io error: {path}: {source}")]
    Io {
        /// 관련 파일 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },
}

impl ScannerError {
    /// 메트릭 레이블과 로그에 쓰는 짧은 종류명
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Transport(_) => "transport",
            Self::UnsupportedFormat { .. } => "unsupported_format",
            Self::MalformedManifest { .. } => "malformed_manifest",
            Self::RateLimited { .. } => "rate_limited",
            Self::InvalidResponse(_) => "invalid_response",
            Self::Delivery(_) => "delivery",
            Self::Ledger { .. } => "ledger",
            Self::Config { .. } => "config",
            Self::Io { .. } => "io",
        }
    }

    /// 재시도로 회복될 수 있는 에러인지 반환합니다.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::RateLimited { .. })
    }
}

impl From<ScannerError> for LockwatchError {
    fn from(err: ScannerError) -> Self {
        match err {
            ScannerError::NotFound { .. }
            | ScannerError::UnsupportedFormat { .. }
            | ScannerError::MalformedManifest { .. } => {
                LockwatchError::Scan(ScanError::Manifest(err.to_string()))
            }
            ScannerError::Transport(_)
            | ScannerError::RateLimited { .. }
            | ScannerError::InvalidResponse(_) => {
                LockwatchError::Scan(ScanError::Lookup(err.to_string()))
            }
            ScannerError::Delivery(msg) => LockwatchError::Scan(ScanError::Delivery(msg)),
            ScannerError::Ledger { .. } => {
                LockwatchError::Scan(ScanError::Ledger(err.to_string()))
            }
            ScannerError::Config { field, reason } => {
                LockwatchError::Config(ConfigError::InvalidValue { field, reason })
            }
            ScannerError::Io { source, .. } => LockwatchError::Io(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = ScannerError::NotFound {
            owner: "acme".to_owned(),
            repo: "web".to_owned(),
            path: "package-lock.json".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "manifest not found: acme/web/package-lock.json"
        );
    }

    #[test]
    fn malformed_manifest_display() {
        let err = ScannerError::MalformedManifest {
            path: "composer.lock".to_owned(),
            reason: "missing packages".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("composer.lock"));
        assert!(msg.contains("missing packages"));
    }

    #[test]
    fn rate_limited_display() {
        let err = ScannerError::RateLimited {
            retry_after_secs: Some(5),
        };
        assert!(err.to_string().contains("Some(5)"));
    }

    #[test]
    fn retryable_classification() {
        assert!(ScannerError::Transport("reset".to_owned()).is_retryable());
        assert!(ScannerError::RateLimited { retry_after_secs: None }.is_retryable());
        assert!(!ScannerError::InvalidResponse("bad json".to_owned()).is_retryable());
        assert!(!ScannerError::Delivery("500".to_owned()).is_retryable());
    }

    #[test]
    fn kind_names_are_snake_case() {
        let err = ScannerError::UnsupportedFormat {
            path: "yarn.lock".to_owned(),
        };
        assert_eq!(err.kind(), "unsupported_format");
    }

    #[test]
    fn converts_manifest_errors() {
        let err: LockwatchError = ScannerError::UnsupportedFormat {
            path: "Gemfile.lock".to_owned(),
        }
        .into();
        assert!(matches!(err, LockwatchError::Scan(ScanError::Manifest(_))));
    }

    #[test]
    fn converts_lookup_errors() {
        let err: LockwatchError = ScannerError::InvalidResponse("x".to_owned()).into();
        assert!(matches!(err, LockwatchError::Scan(ScanError::Lookup(_))));
    }

    #[test]
    fn converts_delivery_errors() {
        let err: LockwatchError = ScannerError::Delivery("gone".to_owned()).into();
        assert!(matches!(err, LockwatchError::Scan(ScanError::Delivery(_))));
    }

    #[test]
    fn converts_config_errors() {
        let err: LockwatchError = ScannerError::Config {
            field: "lookup_concurrency".to_owned(),
            reason: "must be > 0".to_owned(),
        }
        .into();
        assert!(matches!(err, LockwatchError::Config(_)));
    }
}
