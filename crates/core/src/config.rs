//! 설정 관리 -- lockwatch.toml 파싱 및 런타임 설정
//!
//! [`LockwatchConfig`]는 데몬과 스캐너가 사용하는 모든 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선, 데몬에서 적용)
//! 2. 환경변수 (`LOCKWATCH_SCAN_INTERVAL_SECS=600` 형식)
//! 3. 레거시 환경변수 (`GITHUB_TOKEN`, `DISCORD_TOKEN`, `DISCORD_CHANNEL_ID`,
//!    `DISCORD_USER_ID`, `REFRESH_TIME`) -- 해당 값이 비어 있을 때만 사용
//! 4. 설정 파일 (`lockwatch.toml`)
//! 5. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), lockwatch_core::error::LockwatchError> {
//! use lockwatch_core::config::LockwatchConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드 + 검증
//! let config = LockwatchConfig::load("lockwatch.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = LockwatchConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, LockwatchError};

/// 중복 알림 억제 기본 윈도우: 7일
pub const DEFAULT_DEDUP_WINDOW_SECS: u64 = 7 * 24 * 60 * 60;

const MAX_INTERVAL_SECS: u64 = 7 * 24 * 60 * 60;
const MAX_LOOKUP_CONCURRENCY: usize = 32;
const MAX_MANIFEST_SIZE: usize = 100 * 1024 * 1024;
const MAX_ATTEMPTS_LIMIT: u32 = 10;

/// Lockwatch 통합 설정
///
/// `lockwatch.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LockwatchConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 스캔 주기 및 대상
    #[serde(default)]
    pub scan: ScanConfig,
    /// 중복 제거 원장
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// OSV 취약점 DB 클라이언트
    #[serde(default)]
    pub osv: OsvConfig,
    /// GitHub 콘텐츠 API
    #[serde(default)]
    pub github: GithubConfig,
    /// Discord 알림 채널
    #[serde(default)]
    pub discord: DiscordConfig,
    /// Prometheus 메트릭 엔드포인트
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl LockwatchConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용한 뒤 검증합니다.
    ///
    /// 자격 증명 누락도 이 단계에서 에러가 됩니다 (프로세스 시작 실패).
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LockwatchError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        config.validate_credentials()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LockwatchError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LockwatchError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LockwatchError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LockwatchError> {
        toml::from_str(toml_str).map_err(|e| {
            LockwatchError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOCKWATCH_{SECTION}_{FIELD}`
    /// 예: `LOCKWATCH_DISCORD_CHANNEL_ID=1234`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOCKWATCH_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOCKWATCH_GENERAL_LOG_FORMAT");

        // Scan
        override_u64(&mut self.scan.interval_secs, "LOCKWATCH_SCAN_INTERVAL_SECS");
        override_string(
            &mut self.scan.repositories_file,
            "LOCKWATCH_SCAN_REPOSITORIES_FILE",
        );
        override_usize(
            &mut self.scan.lookup_concurrency,
            "LOCKWATCH_SCAN_LOOKUP_CONCURRENCY",
        );
        override_usize(
            &mut self.scan.max_manifest_size,
            "LOCKWATCH_SCAN_MAX_MANIFEST_SIZE",
        );

        // Ledger
        override_string(&mut self.ledger.path, "LOCKWATCH_LEDGER_PATH");
        override_u64(&mut self.ledger.window_secs, "LOCKWATCH_LEDGER_WINDOW_SECS");
        override_bool(
            &mut self.ledger.prune_expired,
            "LOCKWATCH_LEDGER_PRUNE_EXPIRED",
        );

        // OSV
        override_string(&mut self.osv.api_url, "LOCKWATCH_OSV_API_URL");
        override_u64(&mut self.osv.timeout_secs, "LOCKWATCH_OSV_TIMEOUT_SECS");
        override_u32(&mut self.osv.max_attempts, "LOCKWATCH_OSV_MAX_ATTEMPTS");
        override_u64(
            &mut self.osv.initial_backoff_ms,
            "LOCKWATCH_OSV_INITIAL_BACKOFF_MS",
        );
        override_u64(&mut self.osv.max_backoff_ms, "LOCKWATCH_OSV_MAX_BACKOFF_MS");

        // GitHub
        override_string(&mut self.github.api_url, "LOCKWATCH_GITHUB_API_URL");
        override_string(&mut self.github.token, "LOCKWATCH_GITHUB_TOKEN");

        // Discord
        override_string(&mut self.discord.api_url, "LOCKWATCH_DISCORD_API_URL");
        override_string(&mut self.discord.token, "LOCKWATCH_DISCORD_TOKEN");
        override_string(&mut self.discord.channel_id, "LOCKWATCH_DISCORD_CHANNEL_ID");
        override_string(
            &mut self.discord.mention_user_id,
            "LOCKWATCH_DISCORD_MENTION_USER_ID",
        );

        // Metrics
        override_bool(&mut self.metrics.enabled, "LOCKWATCH_METRICS_ENABLED");
        override_string(&mut self.metrics.listen_addr, "LOCKWATCH_METRICS_LISTEN_ADDR");
        override_u16(&mut self.metrics.port, "LOCKWATCH_METRICS_PORT");

        self.apply_legacy_env();
    }

    /// 이전 봇 배포에서 쓰던 환경변수를 빈 값에 한해 채웁니다.
    fn apply_legacy_env(&mut self) {
        fill_if_empty(&mut self.github.token, "GITHUB_TOKEN");
        fill_if_empty(&mut self.discord.token, "DISCORD_TOKEN");
        fill_if_empty(&mut self.discord.channel_id, "DISCORD_CHANNEL_ID");
        fill_if_empty(&mut self.discord.mention_user_id, "DISCORD_USER_ID");

        if std::env::var("LOCKWATCH_SCAN_INTERVAL_SECS").is_err() {
            override_u64(&mut self.scan.interval_secs, "REFRESH_TIME");
        }
    }

    /// 설정값의 유효성을 검증합니다 (자격 증명 제외).
    pub fn validate(&self) -> Result<(), LockwatchError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.scan.interval_secs == 0 || self.scan.interval_secs > MAX_INTERVAL_SECS {
            return Err(invalid(
                "scan.interval_secs",
                format!("must be 1-{MAX_INTERVAL_SECS}"),
            ));
        }

        if self.scan.repositories_file.is_empty() {
            return Err(invalid("scan.repositories_file", "must not be empty"));
        }

        if self.scan.lookup_concurrency == 0
            || self.scan.lookup_concurrency > MAX_LOOKUP_CONCURRENCY
        {
            return Err(invalid(
                "scan.lookup_concurrency",
                format!("must be 1-{MAX_LOOKUP_CONCURRENCY}"),
            ));
        }

        if self.scan.max_manifest_size == 0 || self.scan.max_manifest_size > MAX_MANIFEST_SIZE {
            return Err(invalid(
                "scan.max_manifest_size",
                format!("must be 1-{MAX_MANIFEST_SIZE}"),
            ));
        }

        if self.ledger.path.is_empty() {
            return Err(invalid("ledger.path", "must not be empty"));
        }

        if self.ledger.window_secs == 0 {
            return Err(invalid("ledger.window_secs", "must be greater than 0"));
        }

        for (field, url) in [
            ("osv.api_url", &self.osv.api_url),
            ("github.api_url", &self.github.api_url),
            ("discord.api_url", &self.discord.api_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(invalid(field, "must be an http(s) URL"));
            }
        }

        if self.osv.timeout_secs == 0 {
            return Err(invalid("osv.timeout_secs", "must be greater than 0"));
        }

        if self.osv.max_attempts == 0 || self.osv.max_attempts > MAX_ATTEMPTS_LIMIT {
            return Err(invalid(
                "osv.max_attempts",
                format!("must be 1-{MAX_ATTEMPTS_LIMIT}"),
            ));
        }

        if self.osv.initial_backoff_ms > self.osv.max_backoff_ms {
            return Err(invalid(
                "osv.initial_backoff_ms",
                "must not exceed osv.max_backoff_ms",
            ));
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(invalid("metrics.port", "must be greater than 0"));
        }

        Ok(())
    }

    /// GitHub / Discord 자격 증명이 모두 설정되었는지 확인합니다.
    ///
    /// 누락은 사이클 단위가 아닌 프로세스 시작 실패로 취급합니다.
    pub fn validate_credentials(&self) -> Result<(), LockwatchError> {
        for (field, value) in [
            ("github.token", &self.github.token),
            ("discord.token", &self.discord.token),
            ("discord.channel_id", &self.discord.channel_id),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingCredential {
                    field: field.to_owned(),
                }
                .into());
            }
        }
        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 스캔 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// 스캔 주기 (초)
    pub interval_secs: u64,
    /// 감시 대상 저장소 목록 JSON 경로
    pub repositories_file: String,
    /// 패키지 조회 동시 실행 수 (1이면 순차)
    pub lookup_concurrency: usize,
    /// 매니페스트 최대 크기 (바이트)
    pub max_manifest_size: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3600,
            repositories_file: "config/repositories.json".to_owned(),
            lookup_concurrency: 1,
            max_manifest_size: 10 * 1024 * 1024,
        }
    }
}

/// 중복 제거 원장 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// 원장 JSON 파일 경로
    pub path: String,
    /// 재알림 억제 윈도우 (초)
    pub window_secs: u64,
    /// 사이클 시작 시 윈도우가 지난 항목 정리 여부
    pub prune_expired: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: "data/sent_vulns.json".to_owned(),
            window_secs: DEFAULT_DEDUP_WINDOW_SECS,
            prune_expired: true,
        }
    }
}

/// OSV 클라이언트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OsvConfig {
    /// API 기본 URL
    pub api_url: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// 최대 시도 횟수 (재시도 포함)
    pub max_attempts: u32,
    /// 첫 재시도 대기 (밀리초)
    pub initial_backoff_ms: u64,
    /// 재시도 대기 상한 (밀리초)
    pub max_backoff_ms: u64,
}

impl Default for OsvConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.osv.dev".to_owned(),
            timeout_secs: 30,
            max_attempts: 3,
            initial_backoff_ms: 1000,
            max_backoff_ms: 30_000,
        }
    }
}

/// GitHub 콘텐츠 API 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// API 기본 URL (GitHub Enterprise 지원)
    pub api_url: String,
    /// 액세스 토큰
    pub token: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_owned(),
            token: String::new(),
        }
    }
}

/// Discord 알림 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// API 기본 URL
    pub api_url: String,
    /// 봇 토큰
    pub token: String,
    /// 알림 채널 ID
    pub channel_id: String,
    /// 멘션할 사용자 ID (비어 있으면 멘션 생략)
    pub mention_user_id: String,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            api_url: "https://discord.com/api/v10".to_owned(),
            token: String::new(),
            channel_id: String::new(),
            mention_user_id: String::new(),
        }
    }
}

/// 메트릭 엔드포인트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 바인드 주소
    pub listen_addr: String,
    /// 포트
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9100,
        }
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> LockwatchError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.into(),
    }
    .into()
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn fill_if_empty(target: &mut String, env_key: &str) {
    if target.is_empty() {
        override_string(target, env_key);
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u32 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn with_credentials() -> LockwatchConfig {
        let mut config = LockwatchConfig::default();
        config.github.token = "ghp_test".to_owned();
        config.discord.token = "discord-test".to_owned();
        config.discord.channel_id = "123456".to_owned();
        config
    }

    #[test]
    fn default_config_has_sane_values() {
        let config = LockwatchConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.scan.interval_secs, 3600);
        assert_eq!(config.scan.lookup_concurrency, 1);
        assert_eq!(config.ledger.window_secs, 604_800);
        assert!(config.ledger.prune_expired);
        assert_eq!(config.osv.api_url, "https://api.osv.dev");
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn default_config_passes_validation() {
        LockwatchConfig::default().validate().unwrap();
    }

    #[test]
    fn default_config_lacks_credentials() {
        let err = LockwatchConfig::default()
            .validate_credentials()
            .unwrap_err();
        assert!(err.to_string().contains("github.token"));
    }

    #[test]
    fn credentials_accepted_when_present() {
        with_credentials().validate_credentials().unwrap();
    }

    #[test]
    fn whitespace_channel_id_is_missing() {
        let mut config = with_credentials();
        config.discord.channel_id = "   ".to_owned();
        let err = config.validate_credentials().unwrap_err();
        assert!(err.to_string().contains("discord.channel_id"));
    }

    #[test]
    fn parse_empty_string_gives_defaults() {
        let config = LockwatchConfig::parse("").unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.ledger.path, "data/sent_vulns.json");
    }

    #[test]
    fn parse_partial_toml_merges_with_defaults() {
        let toml = r#"
[scan]
interval_secs = 600

[discord]
channel_id = "42"
"#;
        let config = LockwatchConfig::parse(toml).unwrap();
        assert_eq!(config.scan.interval_secs, 600);
        assert_eq!(config.scan.repositories_file, "config/repositories.json");
        assert_eq!(config.discord.channel_id, "42");
        assert_eq!(config.discord.api_url, "https://discord.com/api/v10");
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[general]
log_level = "debug"
log_format = "pretty"

[scan]
interval_secs = 1800
repositories_file = "/etc/lockwatch/repositories.json"
lookup_concurrency = 4
max_manifest_size = 2097152

[ledger]
path = "/var/lib/lockwatch/ledger.json"
window_secs = 86400
prune_expired = false

[osv]
api_url = "http://osv.internal"
timeout_secs = 10
max_attempts = 5
initial_backoff_ms = 200
max_backoff_ms = 5000

[github]
api_url = "https://github.example.com/api/v3"
token = "ghp_x"

[discord]
token = "bot"
channel_id = "1"
mention_user_id = "2"

[metrics]
enabled = true
listen_addr = "0.0.0.0"
port = 9200
"#;
        let config = LockwatchConfig::parse(toml).unwrap();
        assert_eq!(config.general.log_format, "pretty");
        assert_eq!(config.scan.lookup_concurrency, 4);
        assert_eq!(config.ledger.window_secs, 86400);
        assert!(!config.ledger.prune_expired);
        assert_eq!(config.osv.max_attempts, 5);
        assert_eq!(config.github.api_url, "https://github.example.com/api/v3");
        assert_eq!(config.discord.mention_user_id, "2");
        assert_eq!(config.metrics.port, 9200);
        config.validate().unwrap();
        config.validate_credentials().unwrap();
    }

    #[test]
    fn parse_invalid_toml_returns_error() {
        let err = LockwatchConfig::parse("invalid = [[[toml").unwrap_err();
        assert!(matches!(
            err,
            LockwatchError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = LockwatchConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_invalid_log_format() {
        let mut config = LockwatchConfig::default();
        config.general.log_format = "xml".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_format"));
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let mut config = LockwatchConfig::default();
        config.scan.interval_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("interval_secs"));
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = LockwatchConfig::default();
        config.scan.lookup_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_window() {
        let mut config = LockwatchConfig::default();
        config.ledger.window_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("window_secs"));
    }

    #[test]
    fn validate_rejects_non_http_url() {
        let mut config = LockwatchConfig::default();
        config.osv.api_url = "ftp://osv.dev".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("osv.api_url"));
    }

    #[test]
    fn validate_rejects_inverted_backoff() {
        let mut config = LockwatchConfig::default();
        config.osv.initial_backoff_ms = 10_000;
        config.osv.max_backoff_ms = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn env_override_applies_structured_variables() {
        // SAFETY: serial_test로 환경변수 접근을 직렬화
        unsafe {
            std::env::set_var("LOCKWATCH_SCAN_INTERVAL_SECS", "120");
            std::env::set_var("LOCKWATCH_DISCORD_CHANNEL_ID", "999");
        }
        let mut config = LockwatchConfig::default();
        config.apply_env_overrides();
        unsafe {
            std::env::remove_var("LOCKWATCH_SCAN_INTERVAL_SECS");
            std::env::remove_var("LOCKWATCH_DISCORD_CHANNEL_ID");
        }
        assert_eq!(config.scan.interval_secs, 120);
        assert_eq!(config.discord.channel_id, "999");
    }

    #[test]
    #[serial]
    fn env_override_applies_osv_backoff() {
        // SAFETY: serial_test로 환경변수 접근을 직렬화
        unsafe {
            std::env::set_var("LOCKWATCH_OSV_INITIAL_BACKOFF_MS", "250");
            std::env::set_var("LOCKWATCH_OSV_MAX_BACKOFF_MS", "4000");
        }
        let mut config = LockwatchConfig::default();
        config.apply_env_overrides();
        unsafe {
            std::env::remove_var("LOCKWATCH_OSV_INITIAL_BACKOFF_MS");
            std::env::remove_var("LOCKWATCH_OSV_MAX_BACKOFF_MS");
        }
        assert_eq!(config.osv.initial_backoff_ms, 250);
        assert_eq!(config.osv.max_backoff_ms, 4000);
        config.validate().unwrap();
    }

    #[test]
    #[serial]
    fn legacy_env_fills_only_empty_values() {
        unsafe {
            std::env::set_var("GITHUB_TOKEN", "legacy-gh");
            std::env::set_var("DISCORD_TOKEN", "legacy-discord");
            std::env::set_var("REFRESH_TIME", "900");
        }
        let mut config = LockwatchConfig::default();
        config.discord.token = "from-file".to_owned();
        config.apply_env_overrides();
        unsafe {
            std::env::remove_var("GITHUB_TOKEN");
            std::env::remove_var("DISCORD_TOKEN");
            std::env::remove_var("REFRESH_TIME");
        }
        assert_eq!(config.github.token, "legacy-gh");
        assert_eq!(config.discord.token, "from-file");
        assert_eq!(config.scan.interval_secs, 900);
    }

    #[test]
    #[serial]
    fn structured_interval_wins_over_refresh_time() {
        unsafe {
            std::env::set_var("LOCKWATCH_SCAN_INTERVAL_SECS", "300");
            std::env::set_var("REFRESH_TIME", "900");
        }
        let mut config = LockwatchConfig::default();
        config.apply_env_overrides();
        unsafe {
            std::env::remove_var("LOCKWATCH_SCAN_INTERVAL_SECS");
            std::env::remove_var("REFRESH_TIME");
        }
        assert_eq!(config.scan.interval_secs, 300);
    }

    #[test]
    #[serial]
    fn invalid_env_value_is_ignored() {
        unsafe {
            std::env::set_var("LOCKWATCH_LEDGER_PRUNE_EXPIRED", "maybe");
        }
        let mut config = LockwatchConfig::default();
        config.apply_env_overrides();
        unsafe {
            std::env::remove_var("LOCKWATCH_LEDGER_PRUNE_EXPIRED");
        }
        assert!(config.ledger.prune_expired);
    }

    #[tokio::test]
    async fn from_file_missing_returns_file_not_found() {
        let err = LockwatchConfig::from_file("/nonexistent/lockwatch.toml")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LockwatchError::Config(ConfigError::FileNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lockwatch.toml");
        std::fs::write(&path, "[scan]\ninterval_secs = 42\n").unwrap();
        let config = LockwatchConfig::from_file(&path).await.unwrap();
        assert_eq!(config.scan.interval_secs, 42);
    }
}
