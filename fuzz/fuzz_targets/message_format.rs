#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use lockwatch_scanner::{Ecosystem, Finding, MessageFormatter, Reference};

#[derive(Arbitrary, Debug)]
struct FuzzFinding {
    packagist: bool,
    mention: String,
    limit: u16,
    id: String,
    package_name: String,
    summary: String,
    details: String,
    references: Vec<String>,
}

fuzz_target!(|input: FuzzFinding| {
    // 참고 링크 수 제한 (퍼징 성능)
    if input.references.len() > 64 {
        return;
    }

    let finding = Finding {
        id: input.id,
        package_name: input.package_name,
        ecosystem: if input.packagist {
            Ecosystem::Packagist
        } else {
            Ecosystem::Npm
        },
        owner: "fuzz".to_owned(),
        repo_name: "repo".to_owned(),
        summary: input.summary,
        details: input.details,
        references: input
            .references
            .into_iter()
            .map(|url| Reference { url })
            .collect(),
    };

    let limit = usize::from(input.limit.max(1));
    let formatter = MessageFormatter::new(input.mention).with_limit(limit);
    let _ = formatter.format(&finding);
});
