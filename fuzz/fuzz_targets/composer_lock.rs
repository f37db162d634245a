#![no_main]

use libfuzzer_sys::fuzz_target;
use lockwatch_scanner::parser::ManifestParser;
use lockwatch_scanner::parser::composer::ComposerLockParser;

fuzz_target!(|data: &[u8]| {
    if let Ok(packages) = ComposerLockParser.parse(data, "fuzz/composer.lock") {
        for package in &packages {
            let _ = package.normalized_version();
        }
    }
});
