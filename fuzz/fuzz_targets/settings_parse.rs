#![no_main]

use consign::report::NullReporter;
use consign::settings::Settings;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(mut settings) = toml::from_str::<Settings>(text) {
            let mut reporter = NullReporter;
            settings.clamp(&mut reporter);

            // Invariants after clamping:
            // 1. Every interval and timeout is a usable nonzero duration
            assert!(settings.http.connect_timeout >= 1);
            assert!(settings.http.read_timeout >= 1);
            assert!(settings.http.write_timeout >= 1);
            assert!(settings.sync_wait.interval >= 1);
            if let Some(max_wait) = settings.sync_wait.max_wait {
                assert!(max_wait >= 1);
            }

            // 2. The duration accessors never panic
            let _ = settings.connect_timeout();
            let _ = settings.read_timeout();
            let _ = settings.write_timeout();
            let _ = settings.sync_interval();
            let _ = settings.max_sync_wait();
        }
    }
});
