//! Point-in-time host queries. Nothing here has side effects or fails.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    process::{self, Command, Stdio},
};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::command::resolve_tool;

/// `<install_dir>/<app>.app`
pub fn bundle_path(install_dir: &Path, app_name: &str) -> PathBuf {
    install_dir.join(format!("{app_name}.app"))
}

/// `<install_dir>/<app>.app/Contents/MacOS/<app>`
pub fn executable_path(install_dir: &Path, app_name: &str) -> PathBuf {
    bundle_path(install_dir, app_name)
        .join("Contents")
        .join("MacOS")
        .join(app_name)
}

/// True when a process other than this one or its ancestors matches `name`.
pub fn is_process_running(name: &str) -> bool {
    !matching_pids(name).is_empty()
}

/// Pids whose command line contains `name`.
///
/// This process and its ancestors are left out, since their command lines
/// routinely mention the app (`--project-root ~/code/Notes`). A missing
/// `pgrep`, a spawn failure, or a non-zero status all yield no pids.
pub fn matching_pids(name: &str) -> Vec<u32> {
    let Ok(pgrep) = resolve_tool("pgrep") else {
        debug!("pgrep unavailable; treating {name} as not running");
        return Vec::new();
    };
    let output = match Command::new(pgrep)
        .arg("-f")
        .arg(name)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
    {
        Ok(output) => output,
        Err(err) => {
            debug!(error = %err, "pgrep failed; treating {name} as not running");
            return Vec::new();
        }
    };
    if !output.status.success() {
        return Vec::new();
    }

    let lineage = own_lineage();
    parse_pids(&String::from_utf8_lossy(&output.stdout))
        .into_iter()
        .filter(|pid| !lineage.contains(pid))
        .collect()
}

fn parse_pids(output: &str) -> Vec<u32> {
    output
        .split_whitespace()
        .filter_map(|token| token.parse().ok())
        .collect()
}

/// This process and every ancestor below init.
fn own_lineage() -> HashSet<u32> {
    let mut lineage = HashSet::new();
    let mut pid = process::id();
    while pid > 1 && lineage.insert(pid) {
        match parent_pid(pid) {
            Some(parent) => pid = parent,
            None => break,
        }
    }
    lineage
}

fn parent_pid(pid: u32) -> Option<u32> {
    let ps = resolve_tool("ps").ok()?;
    let output = Command::new(ps)
        .args(["-o", "ppid=", "-p"])
        .arg(pid.to_string())
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout).trim().parse().ok()
}

pub fn is_application_installed(install_dir: &Path, app_name: &str) -> bool {
    fs::metadata(bundle_path(install_dir, app_name)).is_ok()
}

/// Seconds since `path` was last modified, or `None` if it cannot be read.
pub fn file_age_seconds(path: &Path) -> Option<u64> {
    let modified = fs::metadata(path).and_then(|meta| meta.modified()).ok()?;
    let modified: DateTime<Utc> = modified.into();
    let age = Utc::now().signed_duration_since(modified).num_seconds();
    Some(age.max(0) as u64)
}
