//! package-lock.json 파서
//!
//! [`NpmLockParser`]는 NPM의 package-lock.json (v2/v3)에서 최상위 패키지 항목(`""` 키)의
//! `dependencies` 맵을 읽어 [`PackageRef`] 목록을 만듭니다.
//!
//! # package-lock.json v3 형식 예시
//!
//! ```json
//! {
//!   "name": "my-app",
//!   "lockfileVersion": 3,
//!   "packages": {
//!     "": { "name": "my-app", "dependencies": { "left-pad": "^1.3.0" } },
//!     "node_modules/left-pad": { "version": "1.3.0" }
//!   }
//! }
//! ```
//!
//! 버전은 선언된 범위 문자열 그대로 보존됩니다 (`^1.3.0`). 정규화는 조회 직전에 합니다.
//! 의존성은 문서에 적힌 순서대로 반환됩니다.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::error::ScannerError;
use crate::parser::{ManifestParser, decode_json};
use crate::types::{Ecosystem, PackageRef};

/// 루트 패키지를 가리키는 `packages` 키
const ROOT_PACKAGE_KEY: &str = "";

/// package-lock.json 파서
pub struct NpmLockParser;

/// package-lock.json 구조 (파싱용)
#[derive(Deserialize)]
struct NpmLockFile {
    #[serde(default)]
    packages: Option<BTreeMap<String, NpmPackageEntry>>,
}

/// package-lock.json 내 개별 패키지 (파싱용)
#[derive(Deserialize)]
struct NpmPackageEntry {
    #[serde(default, deserialize_with = "ordered_dependencies")]
    dependencies: Option<Vec<(String, String)>>,
}

/// JSON 객체를 문서 순서 그대로 `(이름, 버전)` 목록으로 읽습니다.
fn ordered_dependencies<'de, D>(deserializer: D) -> Result<Option<Vec<(String, String)>>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedVisitor;

    impl<'de> Visitor<'de> for OrderedVisitor {
        type Value = Option<Vec<(String, String)>>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of package name to version range")
        }

        fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((name, version)) = map.next_entry::<String, String>()? {
                entries.push((name, version));
            }
            Ok(Some(entries))
        }
    }

    deserializer.deserialize_any(OrderedVisitor)
}

impl ManifestParser for NpmLockParser {
    fn name(&self) -> &'static str {
        "npm"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Npm
    }

    fn file_suffix(&self) -> &'static str {
        "package-lock.json"
    }

    fn parse(&self, content: &[u8], source_path: &str) -> Result<Vec<PackageRef>, ScannerError> {
        let lock_file: NpmLockFile = decode_json(content, source_path)?;

        let packages = match lock_file.packages {
            Some(p) if !p.is_empty() => p,
            _ => {
                return Err(ScannerError::MalformedManifest {
                    path: source_path.to_owned(),
                    reason: "package list is empty or absent".to_owned(),
                });
            }
        };

        let root = packages
            .get(ROOT_PACKAGE_KEY)
            .ok_or_else(|| ScannerError::MalformedManifest {
                path: source_path.to_owned(),
                reason: "top-level package entry is missing".to_owned(),
            })?;

        let refs = root
            .dependencies
            .iter()
            .flatten()
            .map(|(name, version)| PackageRef::new(name.as_str(), version.as_str(), Ecosystem::Npm))
            .collect();

        Ok(refs)
    }
}
