#![no_main]

use consign::auth::{ENV_API_KEY, resolve_api_key};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: (Option<&str>, Option<&str>, Option<&str>)| {
    let (explicit, env_value, configured) = data;

    // NUL bytes cannot be placed into the process environment.
    if env_value.is_some_and(|v| v.contains('\0')) {
        return;
    }

    temp_env::with_vars([(ENV_API_KEY, env_value)], || {
        let resolved = resolve_api_key(explicit, configured);

        if let Some(key) = &resolved {
            // Invariants:
            // 1. Resolved keys are trimmed and non-empty
            assert!(!key.is_empty());
            assert_eq!(key, key.trim());
        }

        // 2. A non-blank explicit key always wins
        if explicit.is_some_and(|k| !k.trim().is_empty()) {
            assert_eq!(resolved.as_deref(), explicit.map(str::trim));
        }
    });
});
