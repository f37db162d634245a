//! 도메인 타입 -- 스캔 파이프라인 데이터 구조
//!
//! 감시 대상 저장소, 패키지 참조, 정규화된 버전, 취약점 발견 항목을 정의합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 패키지 생태계 (레지스트리 네임스페이스)
///
/// 매니페스트의 파일 이름으로 결정되며, 내용에서 추론하지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ecosystem {
    /// JavaScript (package-lock.json)
    #[serde(rename = "npm")]
    Npm,
    /// PHP (composer.lock)
    #[serde(rename = "Packagist")]
    Packagist,
}

impl Ecosystem {
    /// OSV API가 기대하는 생태계 이름을 반환합니다.
    pub fn osv_name(&self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Packagist => "Packagist",
        }
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.osv_name())
    }
}

/// 감시 대상 매니페스트 하나
///
/// 저장소 목록 문서의 `{owner, repo, configPath}` 항목에 대응합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryTarget {
    /// 저장소 소유자 (사용자 또는 조직)
    pub owner: String,
    /// 저장소 이름
    #[serde(rename = "repo")]
    pub repo_name: String,
    /// 저장소 내 매니페스트 경로
    #[serde(rename = "configPath")]
    pub config_path: String,
}

impl RepositoryTarget {
    pub fn new(
        owner: impl Into<String>,
        repo_name: impl Into<String>,
        config_path: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo_name: repo_name.into(),
            config_path: config_path.into(),
        }
    }
}

impl fmt::Display for RepositoryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.owner, self.repo_name, self.config_path)
    }
}

/// 저장소 목록 문서 (`{"repositories": [...]}`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryList {
    #[serde(default)]
    pub repositories: Vec<RepositoryTarget>,
}

/// 매니페스트에서 읽은 패키지 참조
///
/// `version`은 매니페스트의 원본 문자열입니다 (`^1.3.0`, `v2.3.5` 등).
/// 조회 직전에 [`NormalizedVersion`]으로 변환됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRef {
    /// 패키지 이름
    pub name: String,
    /// 원본 버전 문자열
    pub version: String,
    /// 패키지 생태계
    pub ecosystem: Ecosystem,
}

impl PackageRef {
    pub fn new(name: impl Into<String>, version: impl Into<String>, ecosystem: Ecosystem) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ecosystem,
        }
    }

    /// 생태계 규칙으로 정규화한 버전을 반환합니다.
    pub fn normalized_version(&self) -> NormalizedVersion {
        NormalizedVersion::new(self.ecosystem, &self.version)
    }
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} ({})", self.name, self.version, self.ecosystem)
    }
}

/// 조회 API 형식에 맞춘 버전 문자열
///
/// # 정규화 규칙
///
/// - **npm**: 앞쪽의 숫자가 아닌 문자를 모두 제거 (`^1.3.0` -> `1.3.0`)
/// - **Packagist**: 숫자 앞의 `v` 접두어 하나를 제거한 뒤
///   영문자, 숫자, `.` 이외의 문자를 모두 제거 (`v2.3.5` -> `2.3.5`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NormalizedVersion(String);

impl NormalizedVersion {
    pub fn new(ecosystem: Ecosystem, raw: &str) -> Self {
        let normalized = match ecosystem {
            Ecosystem::Npm => raw
                .trim_start_matches(|c: char| !c.is_ascii_digit())
                .to_owned(),
            Ecosystem::Packagist => {
                let without_prefix = match raw.strip_prefix(['v', 'V']) {
                    Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
                    _ => raw,
                };
                without_prefix
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric() || *c == '.')
                    .collect()
            }
        };
        Self(normalized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 참고 링크
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub url: String,
}

/// 조회 API가 반환한 취약점 (저장소 정보 없음)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    /// 취약점 식별자 (GHSA-..., CVE-... 등)
    pub id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub references: Vec<Reference>,
}

/// 알림 대상 취약점
///
/// 식별자(`id`)가 동일성 기준이며, 스캔마다 새로 만들어지고 저장되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub id: String,
    pub package_name: String,
    pub ecosystem: Ecosystem,
    pub owner: String,
    pub repo_name: String,
    pub summary: String,
    pub details: String,
    pub references: Vec<Reference>,
}

impl Finding {
    /// 조회 결과에 패키지와 저장소 정보를 붙입니다.
    pub fn from_advisory(
        advisory: Advisory,
        package: &PackageRef,
        target: &RepositoryTarget,
    ) -> Self {
        Self {
            id: advisory.id,
            package_name: package.name.clone(),
            ecosystem: package.ecosystem,
            owner: target.owner.clone(),
            repo_name: target.repo_name.clone(),
            summary: advisory.summary,
            details: advisory.details,
            references: advisory.references,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} in {} ({}) of {}/{}",
            self.id, self.package_name, self.ecosystem, self.owner, self.repo_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ecosystem_osv_names() {
        assert_eq!(Ecosystem::Npm.osv_name(), "npm");
        assert_eq!(Ecosystem::Packagist.osv_name(), "Packagist");
        assert_eq!(Ecosystem::Packagist.to_string(), "Packagist");
    }

    #[test]
    fn ecosystem_serializes_to_osv_name() {
        assert_eq!(serde_json::to_string(&Ecosystem::Npm).unwrap(), "\"npm\"");
        assert_eq!(
            serde_json::to_string(&Ecosystem::Packagist).unwrap(),
            "\"Packagist\""
        );
    }

    #[test]
    fn npm_strips_leading_non_digits() {
        let cases = [
            ("^1.3.0", "1.3.0"),
            ("~2.0.1", "2.0.1"),
            (">=4.17.21", "4.17.21"),
            ("1.0.0", "1.0.0"),
            ("v3.1.0", "3.1.0"),
            ("1.0.0-rc.1", "1.0.0-rc.1"),
        ];
        for (raw, expected) in cases {
            assert_eq!(NormalizedVersion::new(Ecosystem::Npm, raw).as_str(), expected);
        }
    }

    #[test]
    fn npm_non_numeric_range_becomes_empty() {
        assert_eq!(NormalizedVersion::new(Ecosystem::Npm, "latest").as_str(), "");
    }

    #[test]
    fn packagist_keeps_alphanumerics_and_dots() {
        let cases = [
            ("v2.3.5", "2.3.5"),
            ("2.3.5", "2.3.5"),
            ("1.0.0-beta1", "1.0.0beta1"),
            ("dev-main", "devmain"),
            ("V10.0", "10.0"),
            ("version", "version"),
        ];
        for (raw, expected) in cases {
            assert_eq!(
                NormalizedVersion::new(Ecosystem::Packagist, raw).as_str(),
                expected
            );
        }
    }

    #[test]
    fn distinct_common_versions_stay_distinct() {
        let a = NormalizedVersion::new(Ecosystem::Npm, "^1.2.3");
        let b = NormalizedVersion::new(Ecosystem::Npm, "^1.2.4");
        assert_ne!(a, b);
        let c = NormalizedVersion::new(Ecosystem::Packagist, "v1.10.0");
        let d = NormalizedVersion::new(Ecosystem::Packagist, "v1.1.0");
        assert_ne!(c, d);
    }

    #[test]
    fn repository_target_uses_document_field_names() {
        let json = r#"{"owner":"acme","repo":"shop","configPath":"app/composer.lock"}"#;
        let target: RepositoryTarget = serde_json::from_str(json).unwrap();
        assert_eq!(target, RepositoryTarget::new("acme", "shop", "app/composer.lock"));
        assert_eq!(target.to_string(), "acme/shop:app/composer.lock");
    }

    #[test]
    fn repository_list_defaults_to_empty() {
        let list: RepositoryList = serde_json::from_str("{}").unwrap();
        assert!(list.repositories.is_empty());
    }

    #[test]
    fn advisory_optional_fields_default() {
        let advisory: Advisory = serde_json::from_str(r#"{"id":"GHSA-1"}"#).unwrap();
        assert_eq!(advisory.summary, "");
        assert!(advisory.references.is_empty());
    }

    #[test]
    fn finding_from_advisory_attaches_context() {
        let advisory = Advisory {
            id: "GHSA-xxxx".to_owned(),
            summary: "Prototype pollution".to_owned(),
            details: String::new(),
            references: vec![Reference {
                url: "http://x".to_owned(),
            }],
        };
        let package = PackageRef::new("left-pad", "^1.3.0", Ecosystem::Npm);
        let target = RepositoryTarget::new("acme", "web", "package-lock.json");
        let finding = Finding::from_advisory(advisory, &package, &target);
        assert_eq!(finding.id, "GHSA-xxxx");
        assert_eq!(finding.package_name, "left-pad");
        assert_eq!(finding.owner, "acme");
        assert_eq!(finding.repo_name, "web");
        assert_eq!(finding.to_string(), "GHSA-xxxx in left-pad (npm) of acme/web");
    }
}
