#![no_main]

use libfuzzer_sys::fuzz_target;
use lockwatch_scanner::parser::ManifestParser;
use lockwatch_scanner::parser::npm::NpmLockParser;

fuzz_target!(|data: &[u8]| {
    if let Ok(packages) = NpmLockParser.parse(data, "fuzz/package-lock.json") {
        for package in &packages {
            let _ = package.normalized_version();
        }
    }
});
