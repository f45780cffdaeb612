#![no_main]

use consign::classify::classify;
use consign::sniff;
use consign::types::FileRole;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: (&[u8], &str, &str)| {
    let (head, dest_name, source_name) = data;

    let detected = sniff::detect(head, source_name);

    // Invariants:
    // 1. Detection output is a closed set
    assert!(matches!(
        detected,
        "application/java-archive"
            | "application/x-war"
            | "application/x-ear"
            | "application/x-aar"
            | "application/zip"
            | "application/xml"
            | "application/octet-stream"
    ));

    // 2. XML always lands on the descriptor role
    let role = classify(detected, dest_name, source_name);
    if detected == "application/xml" {
        assert_eq!(role, FileRole::Descriptor);
    }

    // 3. Classification accepts arbitrary media type strings without panicking
    let _ = classify(dest_name, source_name, dest_name);
});
