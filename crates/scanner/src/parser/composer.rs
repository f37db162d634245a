//! composer.lock 파서
//!
//! [`ComposerLockParser`]는 Composer lockfile의 `packages` 배열을 순회하여
//! 각 레코드의 `name`, `version`을 [`PackageRef`]로 변환합니다.
//!
//! # composer.lock 형식 예시
//!
//! ```json
//! {
//!   "content-hash": "...",
//!   "packages": [
//!     { "name": "monolog/monolog", "version": "v2.3.5", "type": "library" }
//!   ],
//!   "packages-dev": []
//! }
//! ```
//!
//! `packages-dev`는 배포 대상이 아니므로 읽지 않습니다.

use serde::Deserialize;

use crate::error::ScannerError;
use crate::parser::{ManifestParser, decode_json};
use crate::types::{Ecosystem, PackageRef};

/// composer.lock 파서
pub struct ComposerLockParser;

#[derive(Deserialize)]
struct ComposerLockFile {
    #[serde(default)]
    packages: Option<Vec<ComposerPackage>>,
}

#[derive(Deserialize)]
struct ComposerPackage {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
}

impl ManifestParser for ComposerLockParser {
    fn name(&self) -> &'static str {
        "composer"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Packagist
    }

    fn file_suffix(&self) -> &'static str {
        "composer.lock"
    }

    fn parse(&self, content: &[u8], source_path: &str) -> Result<Vec<PackageRef>, ScannerError> {
        let lock_file: ComposerLockFile = decode_json(content, source_path)?;

        let packages = lock_file
            .packages
            .ok_or_else(|| ScannerError::MalformedManifest {
                path: source_path.to_owned(),
                reason: "package list is absent".to_owned(),
            })?;

        packages
            .into_iter()
            .enumerate()
            .map(|(index, record)| match (record.name, record.version) {
                (Some(name), Some(version)) => {
                    Ok(PackageRef::new(name, version, Ecosystem::Packagist))
                }
                _ => Err(ScannerError::MalformedManifest {
                    path: source_path.to_owned(),
                    reason: format!("package record {index} lacks name or version"),
                }),
            })
            .collect()
    }
}
