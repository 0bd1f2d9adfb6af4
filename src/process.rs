use std::{
    process::{Command, Stdio},
    thread,
    time::Duration,
};

use tracing::{debug, info};

use crate::command::resolve_tool;
use crate::probe::matching_pids;

pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(2);

/// Terminates every process whose command line matches an application name,
/// apart from appcycle itself and the processes that started it.
#[derive(Debug, Clone)]
pub struct ProcessController {
    grace_period: Duration,
}

impl Default for ProcessController {
    fn default() -> Self {
        Self::new(DEFAULT_GRACE_PERIOD)
    }
}

impl ProcessController {
    pub fn new(grace_period: Duration) -> Self {
        Self { grace_period }
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Signal matching processes, then wait out the grace period.
    ///
    /// Never fails: nothing to signal is the common case. The wait happens
    /// either way so the subsequent install never races an exiting process.
    pub fn terminate(&self, app_name: &str) {
        let signalled = signal_matching(app_name);
        if signalled {
            info!(app = app_name, "sent terminate signal");
        } else {
            debug!(app = app_name, "no matching process to terminate");
        }
        thread::sleep(self.grace_period);
    }
}

fn signal_matching(app_name: &str) -> bool {
    let pids = matching_pids(app_name);
    if pids.is_empty() {
        return false;
    }
    let Ok(kill) = resolve_tool("kill") else {
        debug!("kill unavailable");
        return false;
    };
    // A pid can exit between lookup and signal; kill still signals the rest.
    let status = Command::new(kill)
        .arg("-TERM")
        .args(pids.iter().map(u32::to_string))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    match status {
        Ok(status) => {
            debug!(?pids, success = status.success(), "signalled processes");
            true
        }
        Err(err) => {
            debug!(error = %err, "failed to run kill");
            false
        }
    }
}
