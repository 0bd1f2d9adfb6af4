use std::{
    path::{Path, PathBuf},
    process::{self, Command, Stdio},
};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::error::StepError;
use crate::probe::{bundle_path, executable_path};

/// A verified, ready-to-start installed application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    app_name: String,
    executable: PathBuf,
}

impl LaunchPlan {
    /// Check the installed bundle and its executable before committing to a launch.
    pub fn prepare(install_dir: &Path, app_name: &str) -> Result<Self> {
        let bundle = bundle_path(install_dir, app_name);
        if !bundle.exists() {
            return Err(StepError::NotInstalled {
                app: app_name.to_string(),
                path: bundle,
            }
            .into());
        }
        let executable = executable_path(install_dir, app_name);
        if !executable.is_file() {
            return Err(StepError::ExecutableMissing {
                app: app_name.to_string(),
                path: executable,
            }
            .into());
        }
        Ok(Self {
            app_name: app_name.to_string(),
            executable,
        })
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Start the application with the terminal's stdio and wait for it.
    pub fn run_to_exit(&self) -> Result<i32> {
        info!(app = %self.app_name, executable = %self.executable.display(), "launching");
        let status = Command::new(&self.executable)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .with_context(|| format!("Failed to launch {}", self.executable.display()))?;
        match status.code() {
            Some(code) => Ok(code),
            None => {
                warn!(app = %self.app_name, "application terminated by a signal");
                Ok(1)
            }
        }
    }

    /// Hand the rest of this process's life to the application.
    pub fn handoff(self) -> ! {
        match self.run_to_exit() {
            Ok(code) => process::exit(code),
            Err(err) => {
                eprintln!("Error: {err:#}");
                process::exit(1);
            }
        }
    }
}
