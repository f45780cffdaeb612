#![no_main]

use consign::types::{PackageHandle, PackageStatus, UploadRegistration};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(json_str) = std::str::from_utf8(data) {
        if let Ok(status) = serde_json::from_str::<PackageStatus>(json_str) {
            // Terminal state follows the two flags and nothing else.
            assert_eq!(
                status.is_terminal(),
                status.is_sync_completed || status.is_sync_failed
            );

            if let Ok(roundtripped) = serde_json::to_string(&status) {
                let parsed: PackageStatus =
                    serde_json::from_str(&roundtripped).expect("serialized status must parse");
                assert_eq!(parsed.status_str, status.status_str);
                assert_eq!(parsed.sync_progress, status.sync_progress);
                assert_eq!(parsed.is_terminal(), status.is_terminal());
            }
        }

        if let Ok(registration) = serde_json::from_str::<UploadRegistration>(json_str) {
            // The fields map always defaults rather than failing.
            let _ = registration.upload_fields.len();
        }

        let _ = serde_json::from_str::<PackageHandle>(json_str);
    }
});
