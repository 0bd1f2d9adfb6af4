use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::builder::run_build;
use crate::config::{ProjectProfile, ProjectRoot};
use crate::installer::PackageInstaller;
use crate::launcher::LaunchPlan;
use crate::mount::Hdiutil;
use crate::process::ProcessController;
use crate::workflow::HostOps;

/// The real machine: build tool, `pkill`, `hdiutil`, and the install directory.
#[derive(Debug, Clone)]
pub struct SystemHost {
    root: ProjectRoot,
    profile: ProjectProfile,
    controller: ProcessController,
    installer: PackageInstaller<Hdiutil>,
}

impl SystemHost {
    pub fn new(root: ProjectRoot, profile: ProjectProfile) -> Self {
        let installer = PackageInstaller::new(Hdiutil, profile.install_dir.clone());
        Self {
            root,
            profile,
            controller: ProcessController::default(),
            installer,
        }
    }
}

impl HostOps for SystemHost {
    fn build(&self) -> Result<()> {
        run_build(&self.profile.build_command, &self.root)
    }

    fn installer_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn terminate(&self, app_name: &str) {
        self.controller.terminate(app_name);
    }

    fn install(&self, installer: &Path, app_name: &str) -> Result<PathBuf> {
        self.installer.install(installer, app_name)
    }

    fn prepare_launch(&self, app_name: &str) -> Result<LaunchPlan> {
        LaunchPlan::prepare(self.installer.install_dir(), app_name)
    }
}
