//! Workflow state, the confirmation gate's transitions, and the ordered
//! execution of a confirmed plan.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, info};

use crate::error::StepError;
use crate::launcher::LaunchPlan;

/// Host state observed once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub app_name: String,
    pub installer_path: PathBuf,
    pub installer_exists: bool,
    pub installer_age_seconds: Option<u64>,
    pub app_running: bool,
    pub app_installed: bool,
}

/// Observations plus the two user-toggleable selections.
///
/// `rebuild_selected` stays `true` whenever no installer was observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowState {
    observed: Observation,
    rebuild_selected: bool,
    launch_selected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateInput {
    ToggleBuild,
    ToggleRun,
    Quit,
    Confirm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStep {
    /// Stay on the gate and re-render.
    Continue,
    Quit,
    Confirm,
}

impl WorkflowState {
    pub fn new(observed: Observation) -> Self {
        Self {
            observed,
            rebuild_selected: true,
            launch_selected: true,
        }
    }

    pub fn observed(&self) -> &Observation {
        &self.observed
    }

    pub fn rebuild_selected(&self) -> bool {
        self.rebuild_selected
    }

    pub fn launch_selected(&self) -> bool {
        self.launch_selected
    }

    /// Building is mandatory when there is no installer to fall back on.
    pub fn build_locked(&self) -> bool {
        !self.observed.installer_exists
    }

    pub fn apply(&mut self, input: GateInput) -> GateStep {
        match input {
            GateInput::ToggleBuild => {
                if !self.build_locked() {
                    self.rebuild_selected = !self.rebuild_selected;
                }
                GateStep::Continue
            }
            GateInput::ToggleRun => {
                self.launch_selected = !self.launch_selected;
                GateStep::Continue
            }
            GateInput::Quit => GateStep::Quit,
            GateInput::Confirm => GateStep::Confirm,
        }
    }

    /// Freeze the current selections into an executable plan.
    pub fn plan(&self) -> Plan {
        Plan {
            app_name: self.observed.app_name.clone(),
            installer_path: self.observed.installer_path.clone(),
            build: self.rebuild_selected || self.build_locked(),
            terminate: self.observed.app_running,
            launch: self.launch_selected,
        }
    }
}

/// `42s old`, `5m old`, `1h old`, `3d old`.
pub fn format_age(seconds: u64) -> String {
    match seconds {
        s if s < 60 => format!("{s}s old"),
        s if s < 3_600 => format!("{}m old", s / 60),
        s if s < 86_400 => format!("{}h old", s / 3_600),
        s => format!("{}d old", s / 86_400),
    }
}

fn checkbox(selected: bool) -> &'static str {
    if selected { "[x]" } else { "[ ]" }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

/// Full status view for the gate, one entry per line.
pub fn render_status(state: &WorkflowState) -> Vec<String> {
    let observed = state.observed();
    let installer = if observed.installer_exists {
        match observed.installer_age_seconds {
            Some(age) => format!("{} ({})", observed.installer_path.display(), format_age(age)),
            None => observed.installer_path.display().to_string(),
        }
    } else {
        format!("{} (not built yet)", observed.installer_path.display())
    };
    let running = if observed.app_running {
        "yes (will be terminated)"
    } else {
        "no"
    };
    let build_note = if state.build_locked() {
        "  (required: no installer yet)"
    } else {
        ""
    };

    vec![
        format!("appcycle: {}", observed.app_name),
        String::new(),
        format!("  Installer : {installer}"),
        format!("  Installed : {}", yes_no(observed.app_installed)),
        format!("  Running   : {running}"),
        String::new(),
        format!(
            "  {} Build installer [b]{build_note}",
            checkbox(state.plan().build)
        ),
        format!(
            "  {} Launch after install [r]",
            checkbox(state.launch_selected())
        ),
        String::new(),
        "  Enter: run    q: quit".to_string(),
    ]
}

/// Confirmed actions, in the order they run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub app_name: String,
    pub installer_path: PathBuf,
    pub build: bool,
    /// From the startup probe; a process started after it is not seen.
    pub terminate: bool,
    pub launch: bool,
}

/// Side-effecting steps the executing state drives.
pub trait HostOps {
    fn build(&self) -> Result<()>;
    fn installer_exists(&self, path: &Path) -> bool;
    fn terminate(&self, app_name: &str);
    fn install(&self, installer: &Path, app_name: &str) -> Result<PathBuf>;
    fn prepare_launch(&self, app_name: &str) -> Result<LaunchPlan>;
}

/// How a successful run ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed { installed: PathBuf },
    /// The caller must hand off to the application; nothing runs after it.
    Launch(LaunchPlan),
}

/// Run `plan` in order, stopping at the first failing step.
pub fn execute<H: HostOps + ?Sized>(plan: &Plan, host: &H) -> Result<Outcome> {
    if plan.build {
        info!("step 1/5: building installer");
        host.build()?;
    } else {
        debug!("step 1/5: build skipped");
    }

    if !host.installer_exists(&plan.installer_path) {
        return Err(StepError::InstallerMissing {
            path: plan.installer_path.clone(),
        }
        .into());
    }
    info!(installer = %plan.installer_path.display(), "step 2/5: installer verified");

    if plan.terminate {
        info!(app = %plan.app_name, "step 3/5: terminating running instance");
        host.terminate(&plan.app_name);
    } else {
        debug!("step 3/5: application not running");
    }

    info!("step 4/5: installing");
    let installed = host.install(&plan.installer_path, &plan.app_name)?;

    if plan.launch {
        info!("step 5/5: preparing launch");
        let launch = host.prepare_launch(&plan.app_name)?;
        return Ok(Outcome::Launch(launch));
    }
    debug!("step 5/5: launch skipped");
    Ok(Outcome::Completed { installed })
}
