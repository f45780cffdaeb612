//! Configuration file support for consign (`.consign.toml`) plus the
//! `CONSIGN_*` environment overlay.
//!
//! Resolution precedence is environment variable over file value over
//! built-in default. Hosts merge their own overrides (CLI flags) on top via
//! [`Settings::apply_overrides`].

use std::env;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::report::Reporter;

/// File name searched for in the working directory.
pub const CONFIG_FILE: &str = ".consign.toml";

pub const ENV_DEBUG: &str = "CONSIGN_DEBUG";
pub const ENV_STRICT_ROLES: &str = "CONSIGN_STRICT_ROLES";
pub const ENV_CONNECT_TIMEOUT: &str = "CONSIGN_HTTP_CONNECT_TIMEOUT";
pub const ENV_READ_TIMEOUT: &str = "CONSIGN_HTTP_READ_TIMEOUT";
pub const ENV_WRITE_TIMEOUT: &str = "CONSIGN_HTTP_WRITE_TIMEOUT";
pub const ENV_SYNC_WAIT_ENABLED: &str = "CONSIGN_SYNC_WAIT_ENABLED";
pub const ENV_SYNC_WAIT_INTERVAL: &str = "CONSIGN_SYNC_WAIT_INTERVAL";
pub const ENV_SYNC_WAIT_VERBOSE: &str = "CONSIGN_SYNC_WAIT_VERBOSE";
pub const ENV_SYNC_WAIT_TIMEOUT: &str = "CONSIGN_SYNC_WAIT_TIMEOUT";

/// Nested HTTP timeout configuration. All values are whole seconds, matching
/// the `CONSIGN_HTTP_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Connection establishment timeout.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Timeout for API calls and downloads.
    #[serde(default = "default_read_timeout")]
    pub read_timeout: u64,

    /// Timeout for upload transfers; larger because artifact files are.
    #[serde(default = "default_write_timeout")]
    pub write_timeout: u64,
}

/// Nested sync-wait configuration controlling the post-create poll loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncWaitConfig {
    /// When false, package creation completes the run without polling.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds between status polls.
    #[serde(default = "default_sync_interval")]
    pub interval: u64,

    /// When false, per-poll status lines are logged at debug instead of info.
    #[serde(default = "default_true")]
    pub verbose: bool,

    /// Optional overall deadline in seconds; absent means wait indefinitely.
    #[serde(default)]
    pub max_wait: Option<u64>,
}

/// Configuration loaded from `.consign.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// API credential; usually provided via `CONSIGN_API_KEY` instead.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Emit per-file classification and skip decisions.
    #[serde(default)]
    pub debug: bool,

    /// Treat a second upload for an occupied role as a fatal error instead
    /// of replacing the earlier identifier.
    #[serde(default)]
    pub strict_roles: bool,

    /// HTTP timeout configuration.
    #[serde(default)]
    pub http: HttpConfig,

    /// Sync-wait configuration.
    #[serde(default)]
    pub sync_wait: SyncWaitConfig,
}

/// Host overrides for merging on top of resolved settings.
///
/// `Option` fields mean "host did not pass this" when `None`; `bool` fields
/// mean "host explicitly enabled this" when `true`. Credentials are not
/// merged here: hosts hand their explicit key to
/// [`crate::auth::resolve_api_key`] so it outranks the environment.
#[derive(Debug, Default)]
pub struct SettingsOverrides {
    pub debug: bool,
    pub strict_roles: bool,
    pub sync_interval: Option<u64>,
    pub max_sync_wait: Option<u64>,
    pub no_sync_wait: bool,
    pub quiet_sync: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            read_timeout: default_read_timeout(),
            write_timeout: default_write_timeout(),
        }
    }
}

impl Default for SyncWaitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: default_sync_interval(),
            verbose: true,
            max_wait: None,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            debug: false,
            strict_roles: false,
            http: HttpConfig::default(),
            sync_wait: SyncWaitConfig::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_connect_timeout() -> u64 {
    15
}

fn default_read_timeout() -> u64 {
    30
}

fn default_write_timeout() -> u64 {
    120
}

fn default_sync_interval() -> u64 {
    5
}

impl Settings {
    /// Load configuration from a directory by searching for `.consign.toml`.
    ///
    /// Returns `Ok(None)` if no config file exists.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(None);
        }
        Self::load_from_file(&config_path).map(Some)
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;

        Ok(settings)
    }

    /// Resolve effective settings: config file (explicit path, or
    /// `.consign.toml` in the working directory), then the `CONSIGN_*`
    /// environment overlay, then clamping.
    pub fn resolve(config_path: Option<&Path>, reporter: &mut dyn Reporter) -> Result<Self> {
        let mut settings = match config_path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load_from_dir(Path::new("."))?.unwrap_or_default(),
        };
        settings.overlay_env(reporter);
        settings.clamp(reporter);
        Ok(settings)
    }

    /// Apply the `CONSIGN_*` environment variables on top of file values.
    ///
    /// The API key is the exception: [`crate::auth::resolve_api_key`] owns
    /// its resolution so hosts can inject credentials of their own.
    pub fn overlay_env(&mut self, reporter: &mut dyn Reporter) {
        if let Some(v) = bool_env(ENV_DEBUG) {
            self.debug = v;
        }
        if let Some(v) = bool_env(ENV_STRICT_ROLES) {
            self.strict_roles = v;
        }
        if let Some(v) = secs_env(ENV_CONNECT_TIMEOUT, reporter) {
            self.http.connect_timeout = v;
        }
        if let Some(v) = secs_env(ENV_READ_TIMEOUT, reporter) {
            self.http.read_timeout = v;
        }
        if let Some(v) = secs_env(ENV_WRITE_TIMEOUT, reporter) {
            self.http.write_timeout = v;
        }
        if let Some(v) = bool_env(ENV_SYNC_WAIT_ENABLED) {
            self.sync_wait.enabled = v;
        }
        if let Some(v) = secs_env(ENV_SYNC_WAIT_INTERVAL, reporter) {
            self.sync_wait.interval = v;
        }
        if let Some(v) = bool_env(ENV_SYNC_WAIT_VERBOSE) {
            self.sync_wait.verbose = v;
        }
        if let Some(v) = secs_env(ENV_SYNC_WAIT_TIMEOUT, reporter) {
            self.sync_wait.max_wait = Some(v);
        }
    }

    /// Merge host overrides on top of the resolved settings.
    pub fn apply_overrides(&mut self, overrides: SettingsOverrides, reporter: &mut dyn Reporter) {
        self.debug = overrides.debug || self.debug;
        self.strict_roles = overrides.strict_roles || self.strict_roles;
        if let Some(interval) = overrides.sync_interval {
            self.sync_wait.interval = clamp_secs("sync_wait.interval", interval, reporter);
        }
        if let Some(max_wait) = overrides.max_sync_wait {
            self.sync_wait.max_wait = Some(clamp_secs("sync_wait.max_wait", max_wait, reporter));
        }
        if overrides.no_sync_wait {
            self.sync_wait.enabled = false;
        }
        if overrides.quiet_sync {
            self.sync_wait.verbose = false;
        }
    }

    /// Clamp every interval and timeout to at least one second, warning for
    /// each adjusted value.
    pub fn clamp(&mut self, reporter: &mut dyn Reporter) {
        self.http.connect_timeout =
            clamp_secs("http.connect_timeout", self.http.connect_timeout, reporter);
        self.http.read_timeout = clamp_secs("http.read_timeout", self.http.read_timeout, reporter);
        self.http.write_timeout =
            clamp_secs("http.write_timeout", self.http.write_timeout, reporter);
        self.sync_wait.interval =
            clamp_secs("sync_wait.interval", self.sync_wait.interval, reporter);
        if let Some(max_wait) = self.sync_wait.max_wait {
            self.sync_wait.max_wait = Some(clamp_secs("sync_wait.max_wait", max_wait, reporter));
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.http.connect_timeout)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.http.read_timeout)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.http.write_timeout)
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_wait.interval)
    }

    pub fn max_sync_wait(&self) -> Option<Duration> {
        self.sync_wait.max_wait.map(Duration::from_secs)
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    let v = env::var(name).ok()?;
    let v = v.trim().to_string();
    if v.is_empty() { None } else { Some(v) }
}

fn bool_env(name: &str) -> Option<bool> {
    non_empty_env(name).map(|v| v.eq_ignore_ascii_case("true"))
}

fn secs_env(name: &str, reporter: &mut dyn Reporter) -> Option<u64> {
    let raw = non_empty_env(name)?;
    match raw.parse::<u64>() {
        Ok(v) => Some(v),
        Err(_) => {
            reporter.warn(&format!("ignoring {name}: '{raw}' is not a whole number of seconds"));
            None
        }
    }
}

fn clamp_secs(name: &str, value: u64, reporter: &mut dyn Reporter) -> u64 {
    if value < 1 {
        reporter.warn(&format!("{name} must be at least 1 second; clamping to 1"));
        1
    } else {
        value
    }
}
