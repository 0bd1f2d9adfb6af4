use std::{
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::{Context, Result, bail};

/// External command description, resolved to a binary only when it is run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from an argv-style list such as `["npm", "run", "dist"]`.
    pub fn from_argv(argv: &[String]) -> Result<Self> {
        let Some((program, args)) = argv.split_first() else {
            bail!("command must name at least a program");
        };
        if program.trim().is_empty() {
            bail!("command program must not be empty");
        }
        Ok(Self::new(program.clone(), args.to_vec()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Materialise a `Command` running in `cwd`, resolving the program on `PATH`.
    pub fn to_command(&self, cwd: &Path) -> Result<Command> {
        let binary = resolve_tool(&self.program)?;
        let mut command = Command::new(binary);
        command.args(&self.args).current_dir(cwd);
        Ok(command)
    }

    pub fn describe(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Locate a host tool, accepting explicit paths as-is.
pub fn resolve_tool(name: &str) -> Result<PathBuf> {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        if candidate.exists() {
            return Ok(candidate.to_path_buf());
        }
        bail!("{} does not exist", candidate.display());
    }
    which::which(name).with_context(|| format!("`{name}` not found on PATH"))
}
