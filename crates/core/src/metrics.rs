//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 스캐너는 이 상수를 사용하여 `metrics::counter!()`, `metrics::histogram!()`
//! 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `lockwatch_`
//! - 접미어: `_total` (counter), `_seconds` (histogram), 없음 (gauge)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 에코시스템 레이블 키 (npm, Packagist)
pub const LABEL_ECOSYSTEM: &str = "ecosystem";

/// 실패 종류 레이블 키 (not_found, transport, ...)
pub const LABEL_KIND: &str = "kind";

// ─── 스캔 사이클 메트릭 ────────────────────────────────────────────

/// 완료된 스캔 사이클 수 (counter)
pub const SCAN_CYCLES_TOTAL: &str = "lockwatch_scan_cycles_total";

/// 이전 사이클이 진행 중이라 건너뛴 tick 수 (counter)
pub const SCAN_CYCLES_SKIPPED_TOTAL: &str = "lockwatch_scan_cycles_skipped_total";

/// 스캔 사이클 소요 시간 (histogram, 초)
pub const SCAN_CYCLE_DURATION_SECONDS: &str = "lockwatch_scan_cycle_duration_seconds";

/// 조회한 패키지 수 (counter, label: ecosystem)
pub const PACKAGES_CHECKED_TOTAL: &str = "lockwatch_packages_checked_total";

/// 작업 단위 실패 수 (counter, label: kind)
pub const UNIT_FAILURES_TOTAL: &str = "lockwatch_unit_failures_total";

// ─── 알림 메트릭 ────────────────────────────────────────────────────

/// 전송된 알림 수 (counter)
pub const NOTIFICATIONS_SENT_TOTAL: &str = "lockwatch_notifications_sent_total";

/// 전송 실패한 알림 수 (counter)
pub const NOTIFICATIONS_FAILED_TOTAL: &str = "lockwatch_notifications_failed_total";

/// 윈도우 내 중복이라 억제된 알림 수 (counter)
pub const NOTIFICATIONS_SUPPRESSED_TOTAL: &str = "lockwatch_notifications_suppressed_total";

/// 원장 항목 수 (gauge)
pub const LEDGER_ENTRIES: &str = "lockwatch_ledger_entries";

/// 모든 메트릭의 설명을 등록합니다.
///
/// 레코더 설치 직후 한 번 호출합니다. 레코더가 없어도 패닉하지 않습니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    describe_counter!(SCAN_CYCLES_TOTAL, "Total number of completed scan cycles");
    describe_counter!(
        SCAN_CYCLES_SKIPPED_TOTAL,
        "Ticks skipped because the previous scan cycle was still running"
    );
    describe_histogram!(
        SCAN_CYCLE_DURATION_SECONDS,
        "Wall-clock duration of a scan cycle in seconds"
    );
    describe_counter!(
        PACKAGES_CHECKED_TOTAL,
        "Packages queried against the vulnerability database"
    );
    describe_counter!(
        UNIT_FAILURES_TOTAL,
        "Per-target or per-package failures that were logged and skipped"
    );
    describe_counter!(NOTIFICATIONS_SENT_TOTAL, "Vulnerability notifications delivered");
    describe_counter!(
        NOTIFICATIONS_FAILED_TOTAL,
        "Vulnerability notifications that failed to deliver"
    );
    describe_counter!(
        NOTIFICATIONS_SUPPRESSED_TOTAL,
        "Findings suppressed because they were notified within the dedup window"
    );
    describe_gauge!(LEDGER_ENTRIES, "Number of entries in the dedup ledger");
}
