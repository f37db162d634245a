//! 매니페스트 파서 -- package-lock.json, composer.lock
//!
//! [`ManifestParser`] trait은 각 lockfile 형식의 파서가 구현해야 하는 인터페이스입니다.
//! [`ParserRegistry`]는 파일 이름 접미사로 파서를 고릅니다 (내용 추론 없음).
//!
//! # 지원 형식
//!
//! - `package-lock.json` (JSON) -- [`NpmLockParser`](npm::NpmLockParser)
//! - `composer.lock` (JSON) -- [`ComposerLockParser`](composer::ComposerLockParser)
//!
//! # 확장
//!
//! 새로운 생태계를 지원하려면 `ManifestParser`를 구현하고
//! [`ParserRegistry::register`]로 등록합니다. 분기문을 고칠 필요가 없습니다.

pub mod composer;
pub mod npm;

use std::path::Path;

use crate::error::ScannerError;
use crate::types::{Ecosystem, PackageRef};

/// 매니페스트 파서 trait
///
/// 원본 바이트를 [`PackageRef`] 목록으로 변환합니다. 버전은 원본 그대로 둡니다.
pub trait ManifestParser: Send + Sync {
    /// 로그용 파서 이름
    fn name(&self) -> &'static str;

    /// 이 파서가 만드는 패키지의 생태계
    fn ecosystem(&self) -> Ecosystem;

    /// 이 파서가 담당하는 파일 이름 접미사 (예: "package-lock.json")
    fn file_suffix(&self) -> &'static str;

    /// 주어진 경로를 이 파서가 처리할 수 있는지 확인합니다.
    fn can_parse(&self, path: &Path) -> bool {
        path.to_str()
            .is_some_and(|p| p.ends_with(self.file_suffix()))
    }

    /// 매니페스트 내용을 파싱합니다.
    ///
    /// # Arguments
    ///
    /// - `content`: 매니페스트 원본 바이트
    /// - `source_path`: 매니페스트 경로 (에러 메시지용)
    fn parse(&self, content: &[u8], source_path: &str) -> Result<Vec<PackageRef>, ScannerError>;
}

/// 접미사 -> 파서 레지스트리
pub struct ParserRegistry {
    parsers: Vec<Box<dyn ManifestParser>>,
    /// 매니페스트 최대 허용 크기 (바이트)
    max_manifest_size: usize,
}

/// 기본 매니페스트 크기 상한: 10 MB
pub const DEFAULT_MAX_MANIFEST_SIZE: usize = 10 * 1024 * 1024;

impl ParserRegistry {
    /// 파서가 하나도 없는 레지스트리를 생성합니다.
    pub fn empty() -> Self {
        Self {
            parsers: Vec::new(),
            max_manifest_size: DEFAULT_MAX_MANIFEST_SIZE,
        }
    }

    /// npm, Packagist 파서가 등록된 레지스트리를 생성합니다.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(npm::NpmLockParser));
        registry.register(Box::new(composer::ComposerLockParser));
        registry
    }

    /// 매니페스트 크기 상한을 설정합니다.
    pub fn with_max_manifest_size(mut self, max: usize) -> Self {
        self.max_manifest_size = max;
        self
    }

    /// 파서를 등록합니다. 먼저 등록된 파서가 우선합니다.
    pub fn register(&mut self, parser: Box<dyn ManifestParser>) {
        self.parsers.push(parser);
    }

    /// 등록된 파일 접미사 목록을 반환합니다.
    pub fn known_suffixes(&self) -> Vec<&'static str> {
        self.parsers.iter().map(|p| p.file_suffix()).collect()
    }

    /// 경로에 맞는 파서를 찾습니다.
    pub fn find(&self, path: &str) -> Option<&dyn ManifestParser> {
        let path = Path::new(path);
        self.parsers
            .iter()
            .find(|p| p.can_parse(path))
            .map(|p| &**p)
    }

    /// 경로로 파서를 고르고 내용을 파싱합니다.
    ///
    /// # Errors
    ///
    /// - 맞는 파서가 없으면 `UnsupportedFormat`
    /// - 크기 초과 또는 해석 실패 시 `MalformedManifest`
    pub fn parse(&self, content: &[u8], path: &str) -> Result<Vec<PackageRef>, ScannerError> {
        let parser = self.find(path).ok_or_else(|| ScannerError::UnsupportedFormat {
            path: path.to_owned(),
        })?;

        if content.len() > self.max_manifest_size {
            return Err(ScannerError::MalformedManifest {
                path: path.to_owned(),
                reason: format!(
                    "manifest too large: {} bytes (max: {})",
                    content.len(),
                    self.max_manifest_size
                ),
            });
        }

        parser.parse(content, path)
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// UTF-8 JSON 본문을 역직렬화합니다. 실패는 `MalformedManifest`로 변환합니다.
pub(crate) fn decode_json<T: serde::de::DeserializeOwned>(
    content: &[u8],
    source_path: &str,
) -> Result<T, ScannerError> {
    let text = std::str::from_utf8(content).map_err(|e| ScannerError::MalformedManifest {
        path: source_path.to_owned(),
        reason: format!("not valid UTF-8: {e}"),
    })?;
    serde_json::from_str(text).map_err(|e| ScannerError::MalformedManifest {
        path: source_path.to_owned(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct YarnStub;

    impl ManifestParser for YarnStub {
        fn name(&self) -> &'static str {
            "yarn"
        }
        fn ecosystem(&self) -> Ecosystem {
            Ecosystem::Npm
        }
        fn file_suffix(&self) -> &'static str {
            "yarn.lock"
        }
        fn parse(&self, _: &[u8], _: &str) -> Result<Vec<PackageRef>, ScannerError> {
            Ok(vec![PackageRef::new("stub", "1.0.0", Ecosystem::Npm)])
        }
    }

    #[test]
    fn registry_selects_by_suffix() {
        let registry = ParserRegistry::with_defaults();
        assert_eq!(registry.find("package-lock.json").unwrap().name(), "npm");
        assert_eq!(
            registry.find("frontend/package-lock.json").unwrap().ecosystem(),
            Ecosystem::Npm
        );
        assert_eq!(
            registry.find("backend/composer.lock").unwrap().ecosystem(),
            Ecosystem::Packagist
        );
    }

    #[test]
    fn registry_rejects_unknown_suffix() {
        let registry = ParserRegistry::with_defaults();
        assert!(registry.find("Cargo.lock").is_none());
        assert!(registry.find("package.json").is_none());

        let err = registry.parse(b"{}", "yarn.lock").unwrap_err();
        assert!(matches!(err, ScannerError::UnsupportedFormat { .. }));
    }

    #[test]
    fn registered_parser_is_used() {
        let mut registry = ParserRegistry::with_defaults();
        registry.register(Box::new(YarnStub));
        let packages = registry.parse(b"", "web/yarn.lock").unwrap();
        assert_eq!(packages[0].name, "stub");
        assert_eq!(
            registry.known_suffixes(),
            vec!["package-lock.json", "composer.lock", "yarn.lock"]
        );
    }

    #[test]
    fn oversized_manifest_is_malformed() {
        let registry = ParserRegistry::with_defaults().with_max_manifest_size(8);
        let err = registry
            .parse(br#"{"packages": {}}"#, "package-lock.json")
            .unwrap_err();
        match err {
            ScannerError::MalformedManifest { reason, .. } => {
                assert!(reason.contains("too large"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn invalid_utf8_is_malformed() {
        let registry = ParserRegistry::with_defaults();
        let err = registry.parse(&[0xff, 0xfe], "composer.lock").unwrap_err();
        assert!(matches!(err, ScannerError::MalformedManifest { .. }));
    }
}
