#![no_main]

use consign::locator::RepoLocator;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(locator) = RepoLocator::parse(input) {
            // Invariants:
            // 1. Accepted locators always carry usable coordinates
            assert!(!locator.owner.is_empty());
            assert!(!locator.repository.is_empty());
            assert!(locator.api_base.contains("://"));

            // 2. Reassembling the locator parses back to the same target
            let rebuilt = format!(
                "consign+{}/{}/{}",
                locator.api_base, locator.owner, locator.repository
            );
            let reparsed = RepoLocator::parse(&rebuilt).expect("rebuilt locator must parse");
            assert_eq!(reparsed.owner, locator.owner);
            assert_eq!(reparsed.repository, locator.repository);
            assert_eq!(reparsed.api_base, locator.api_base);
        }
    }
});
