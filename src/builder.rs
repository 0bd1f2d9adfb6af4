use std::process::Stdio;

use anyhow::{Context, Result};
use tracing::info;

use crate::command::CommandSpec;
use crate::config::ProjectRoot;
use crate::error::StepError;

/// Run the project's build command with output streamed to the terminal.
pub fn run_build(command: &CommandSpec, root: &ProjectRoot) -> Result<()> {
    info!(command = %command.describe(), root = %root.path().display(), "running build");
    let status = command
        .to_command(root.path())?
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .with_context(|| format!("Failed to start `{}`", command.describe()))?;

    if status.success() {
        return Ok(());
    }
    let err = match status.code() {
        Some(code) => StepError::BuildFailed {
            command: command.describe(),
            code,
        },
        None => StepError::BuildInterrupted {
            command: command.describe(),
        },
    };
    Err(err.into())
}
