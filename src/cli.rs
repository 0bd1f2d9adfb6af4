use std::{env, path::PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::info_span;
use uuid::Uuid;

use crate::{
    Orchestrator,
    config::{ProfileSource, ProjectRoot},
    error::{ConfigNotFound, StepError},
    gate::{self, GateDecision},
    init::{InitOptions, run_init},
    locator::Platform,
    workflow::Outcome,
};

#[derive(Parser, Debug)]
#[command(
    name = "appcycle",
    version,
    about = "Build, reinstall and relaunch a desktop app in one step",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Project directory (defaults to the current directory).
    #[arg(long, global = true, value_name = "DIR")]
    pub project_root: Option<PathBuf>,

    /// Where to read the application name from.
    #[arg(long, value_enum, default_value_t = ProfileSource::Config)]
    pub source: ProfileSource,

    /// Skip the confirmation screen and run the default plan.
    #[arg(long, short = 'y', action = ArgAction::SetTrue)]
    pub yes: bool,

    /// Increase logging verbosity.
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create appcycle.json for this project.
    Init(InitArgs),
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Application name; prompts when omitted.
    #[arg(long)]
    pub name: Option<String>,

    /// Overwrite an existing appcycle.json.
    #[arg(long, action = ArgAction::SetTrue)]
    pub force: bool,
}

/// Parse arguments, run, and return the process exit code.
pub fn run(cli: Cli) -> Result<i32> {
    let root = match &cli.project_root {
        Some(path) => ProjectRoot::new(path),
        None => ProjectRoot::new(env::current_dir().context("Unable to read current directory")?),
    };

    if let Some(Command::Init(args)) = cli.command {
        let path = run_init(
            &root,
            InitOptions {
                name: args.name,
                force: args.force,
            },
        )?;
        println!("Wrote {}", path.display());
        return Ok(0);
    }

    let platform = Platform::current();
    if platform != Platform::MacOs {
        return Err(StepError::UnsupportedPlatform {
            detected: env::consts::OS.to_string(),
        }
        .into());
    }

    let span = info_span!("workflow.run", run = %Uuid::new_v4(), root = %root.path().display());
    let span_guard = span.enter();

    let resolver = cli.source.resolver();
    let mut orchestrator = match Orchestrator::init(root, resolver.as_ref()) {
        Ok(orchestrator) => orchestrator,
        Err(err) if err.downcast_ref::<ConfigNotFound>().is_some() => {
            println!("{err}");
            println!("Run `appcycle init` in your project to create one.");
            return Ok(0);
        }
        Err(err) => return Err(err),
    };

    if !cli.yes {
        match gate::run_gate(orchestrator.state_mut())? {
            GateDecision::Quit => return Ok(0),
            GateDecision::Confirm => {}
        }
    }

    let host = orchestrator.system_host();
    let app_name = orchestrator.profile().app_name.clone();
    match orchestrator.execute(&host)? {
        Outcome::Completed { installed } => {
            println!("Done. {app_name} installed to {}.", installed.display());
            Ok(0)
        }
        Outcome::Launch(plan) => {
            println!("Done. Launching {app_name}...");
            drop(span_guard);
            plan.handoff()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_runs_the_workflow() {
        let cli = Cli::try_parse_from(["appcycle"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.source, ProfileSource::Config);
        assert!(!cli.yes);
    }

    #[test]
    fn init_accepts_name_and_force() {
        let cli = Cli::try_parse_from(["appcycle", "init", "--name", "Notes", "--force"]).unwrap();
        match cli.command {
            Some(Command::Init(args)) => {
                assert_eq!(args.name.as_deref(), Some("Notes"));
                assert!(args.force);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn manifest_source_is_selectable() {
        let cli = Cli::try_parse_from(["appcycle", "--source", "manifest", "-y"]).unwrap();
        assert_eq!(cli.source, ProfileSource::Manifest);
        assert!(cli.yes);
    }
}
