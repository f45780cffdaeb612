use std::env;

/// Environment variable carrying the API key.
pub const ENV_API_KEY: &str = "CONSIGN_API_KEY";

/// Resolve the API key the way operators typically configure it.
///
/// Resolution order:
/// 1) Host-provided credential (CLI flag or embedding application)
/// 2) `CONSIGN_API_KEY` environment variable
/// 3) `api_key` from `.consign.toml`
///
/// Returns `None` when nothing is configured; API requests are then sent
/// unauthenticated and the repository decides what anonymous callers may do.
pub fn resolve_api_key(explicit: Option<&str>, configured: Option<&str>) -> Option<String> {
    if let Some(key) = non_empty(explicit) {
        return Some(key);
    }

    if let Ok(v) = env::var(ENV_API_KEY) {
        let v = v.trim().to_string();
        if !v.is_empty() {
            return Some(v);
        }
    }

    non_empty(configured)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    let v = value?.trim();
    if v.is_empty() {
        None
    } else {
        Some(v.to_string())
    }
}
