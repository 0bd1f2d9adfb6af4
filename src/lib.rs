pub mod builder;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod gate;
pub mod host;
pub mod init;
pub mod installer;
pub mod launcher;
pub mod locator;
pub mod mount;
pub mod probe;
pub mod process;
pub mod telemetry;
pub mod workflow;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::{Manifest, ProjectProfile, ProjectResolver, ProjectRoot};
use crate::host::SystemHost;
use crate::locator::{Arch, Platform, locate_installer};
use crate::workflow::{HostOps, Observation, Outcome, WorkflowState};

/// Ties project resolution, host probing and the workflow state together.
pub struct Orchestrator {
    root: ProjectRoot,
    profile: ProjectProfile,
    state: WorkflowState,
}

impl Orchestrator {
    /// Resolve the project and observe the host as it is right now.
    pub fn init(root: ProjectRoot, resolver: &dyn ProjectResolver) -> Result<Self> {
        Self::init_for(root, resolver, Platform::current(), Arch::current())
    }

    pub fn init_for(
        root: ProjectRoot,
        resolver: &dyn ProjectResolver,
        platform: Platform,
        arch: Arch,
    ) -> Result<Self> {
        let profile = resolver.resolve(&root)?;
        let manifest = Manifest::load(&root)?;
        let version = manifest
            .version()
            .context("Unable to determine the version to install")?;

        let installer_path = locate_installer(
            &profile.output_dir,
            &profile.app_name,
            version,
            platform,
            arch,
        );
        let observed = Observation {
            app_name: profile.app_name.clone(),
            installer_exists: installer_path.is_file(),
            installer_age_seconds: probe::file_age_seconds(&installer_path),
            installer_path,
            app_running: probe::is_process_running(&profile.app_name),
            app_installed: probe::is_application_installed(
                &profile.install_dir,
                &profile.app_name,
            ),
        };
        info!(
            app = %observed.app_name,
            version,
            installer = %observed.installer_path.display(),
            installer_exists = observed.installer_exists,
            running = observed.app_running,
            installed = observed.app_installed,
            "observed host state"
        );
        if !observed.installer_exists {
            debug!("no installer yet; build is mandatory");
        }

        Ok(Self {
            root,
            profile,
            state: WorkflowState::new(observed),
        })
    }

    pub fn profile(&self) -> &ProjectProfile {
        &self.profile
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut WorkflowState {
        &mut self.state
    }

    pub fn system_host(&self) -> SystemHost {
        SystemHost::new(self.root.clone(), self.profile.clone())
    }

    /// Run the currently selected plan against `host`.
    pub fn execute<H: HostOps + ?Sized>(&self, host: &H) -> Result<Outcome> {
        workflow::execute(&self.state.plan(), host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CONFIG_FILE_NAME, ConfigFileResolver, MANIFEST_FILE_NAME};
    use std::fs;
    use tempfile::tempdir;

    const APP: &str = "AppcycleFixture4c1d";

    fn project(dir: &std::path::Path, install_dir: &std::path::Path) -> ProjectRoot {
        fs::write(
            dir.join(CONFIG_FILE_NAME),
            format!(
                r#"{{ "appName": "{APP}", "installDir": "{}" }}"#,
                install_dir.display()
            ),
        )
        .unwrap();
        fs::write(dir.join(MANIFEST_FILE_NAME), r#"{ "version": "1.2.0" }"#).unwrap();
        ProjectRoot::new(dir)
    }

    #[test]
    fn fresh_project_requires_build() {
        let dir = tempdir().unwrap();
        let apps = tempdir().unwrap();
        let root = project(dir.path(), apps.path());

        let orchestrator = Orchestrator::init_for(
            root,
            &ConfigFileResolver::with_dirs(vec![]),
            Platform::MacOs,
            Arch::Arm64,
        )
        .unwrap();

        let observed = orchestrator.state().observed();
        assert_eq!(
            observed.installer_path,
            dir.path().join(format!("dist/{APP}-1.2.0-arm64.dmg"))
        );
        assert!(!observed.installer_exists);
        assert_eq!(observed.installer_age_seconds, None);
        assert!(!observed.app_running);
        assert!(!observed.app_installed);
        assert!(orchestrator.state().build_locked());
    }

    #[test]
    fn existing_installer_and_bundle_are_observed() {
        let dir = tempdir().unwrap();
        let apps = tempdir().unwrap();
        let root = project(dir.path(), apps.path());
        fs::create_dir_all(dir.path().join("dist")).unwrap();
        fs::write(dir.path().join(format!("dist/{APP}-1.2.0.dmg")), b"image").unwrap();
        fs::create_dir_all(apps.path().join(format!("{APP}.app"))).unwrap();

        let orchestrator = Orchestrator::init_for(
            root,
            &ConfigFileResolver::with_dirs(vec![]),
            Platform::MacOs,
            Arch::X86_64,
        )
        .unwrap();

        let observed = orchestrator.state().observed();
        assert!(observed.installer_exists);
        assert!(observed.installer_age_seconds.is_some());
        assert!(observed.app_installed);
        assert!(!orchestrator.state().build_locked());
    }

    #[test]
    fn missing_manifest_version_fails_init() {
        let dir = tempdir().unwrap();
        let apps = tempdir().unwrap();
        let root = project(dir.path(), apps.path());
        fs::write(dir.path().join(MANIFEST_FILE_NAME), r#"{ "name": "x" }"#).unwrap();

        let result = Orchestrator::init_for(
            root,
            &ConfigFileResolver::with_dirs(vec![]),
            Platform::MacOs,
            Arch::X86_64,
        );
        assert!(result.is_err());
    }
}
