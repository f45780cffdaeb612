//! Poll a created package until its synchronization reaches a terminal state.

use std::thread;
use std::time::{Duration, Instant};

use crate::api::ApiClient;
use crate::error::PublishError;
use crate::report::Reporter;
use crate::types::PackageStatus;

/// Polling knobs, resolved from settings before the wait starts.
#[derive(Debug, Clone, Copy)]
pub struct SyncWait {
    pub interval: Duration,
    pub max_wait: Option<Duration>,
    pub verbose: bool,
}

/// Block until the package's sync completes or fails.
///
/// The first poll happens immediately; afterwards the loop sleeps for the
/// configured interval between polls. A terminal snapshot is returned to
/// the caller whether the remote sync succeeded or not; only transport
/// failures and an elapsed deadline abort the wait.
pub fn await_terminal(
    api: &ApiClient,
    owner: &str,
    repository: &str,
    slug: &str,
    wait: SyncWait,
    reporter: &mut dyn Reporter,
) -> Result<PackageStatus, PublishError> {
    let started = Instant::now();
    loop {
        let status = api.package_status(owner, repository, slug)?;
        let line = format!(
            "Package sync: {} / {} ({}%)",
            status.status_str, status.stage_str, status.sync_progress
        );
        if wait.verbose {
            reporter.info(&line);
        } else {
            reporter.debug(&line);
        }

        if status.is_terminal() {
            return Ok(status);
        }
        if let Some(max_wait) = wait.max_wait
            && started.elapsed() >= max_wait
        {
            return Err(PublishError::PollTimeout { waited: max_wait });
        }
        thread::sleep(wait.interval);
    }
}
