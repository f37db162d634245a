//! 에러 타입 -- 도메인별 에러 정의

/// Lockwatch 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum LockwatchError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 스캔 파이프라인 에러 (조회, 파싱, 알림, 원장)
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// 필수 자격 증명 누락
    #[error("missing credential: {field}")]
    MissingCredential { field: String },
}

/// 스캔 파이프라인 에러 (모듈 에러를 상위로 전파할 때 사용)
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// 매니페스트 조회/파싱 실패
    #[error("manifest error: {0}")]
    Manifest(String),

    /// 취약점 조회 실패
    #[error("lookup error: {0}")]
    Lookup(String),

    /// 알림 전송 실패
    #[error("delivery error: {0}")]
    Delivery(String),

    /// 중복 제거 원장 저장 실패
    #[error("ledger error: {0}")]
    Ledger(String),
}
