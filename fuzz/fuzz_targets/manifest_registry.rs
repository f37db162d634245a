#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use lockwatch_scanner::ParserRegistry;

/// 경로와 내용을 함께 만들어 확장자 분기까지 퍼징
#[derive(Arbitrary, Debug)]
struct RegistryInput {
    path: String,
    content: Vec<u8>,
}

fuzz_target!(|input: RegistryInput| {
    let registry = ParserRegistry::with_defaults().with_max_manifest_size(64 * 1024);
    let _ = registry.parse(&input.content, &input.path);
});
