use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tracing::{debug, info, info_span};
use walkdir::WalkDir;

use crate::error::StepError;
use crate::mount::{Mount, VolumeTool};
use crate::probe::bundle_path;

/// Replaces the installed bundle with the one packaged in a disk image.
#[derive(Debug, Clone)]
pub struct PackageInstaller<V> {
    volumes: V,
    install_dir: PathBuf,
}

impl<V: VolumeTool> PackageInstaller<V> {
    pub fn new(volumes: V, install_dir: impl Into<PathBuf>) -> Self {
        Self {
            volumes,
            install_dir: install_dir.into(),
        }
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    /// Install `<app>.app` from `image`, returning the installed bundle path.
    ///
    /// The image is detached on every path out of this call. A failure
    /// during the copy leaves the installed bundle partially written.
    pub fn install(&self, image: &Path, app_name: &str) -> Result<PathBuf> {
        let span = info_span!("installer.install", image = %image.display(), app = app_name);
        let _guard = span.enter();

        if !image.exists() {
            return Err(StepError::ImageMissing {
                path: image.to_path_buf(),
            }
            .into());
        }

        let mount = Mount::attach(&self.volumes, image)?;
        match self.replace_bundle(mount.point(), app_name) {
            Ok(target) => {
                mount.release()?;
                info!(target = %target.display(), "installed bundle");
                Ok(target)
            }
            Err(err) => {
                drop(mount);
                Err(err)
            }
        }
    }

    fn replace_bundle(&self, mount_point: &Path, app_name: &str) -> Result<PathBuf> {
        let source = bundle_path(mount_point, app_name);
        if !source.is_dir() {
            return Err(StepError::BundleMissingInImage {
                app: app_name.to_string(),
                mount: mount_point.to_path_buf(),
            }
            .into());
        }

        let target = bundle_path(&self.install_dir, app_name);
        remove_existing(&target)?;
        fs::create_dir_all(&self.install_dir).with_context(|| {
            format!("Failed to create install directory {}", self.install_dir.display())
        })?;
        copy_tree(&source, &target).with_context(|| {
            format!("Failed to copy {} to {}", source.display(), target.display())
        })?;
        Ok(target)
    }
}

fn remove_existing(target: &Path) -> Result<()> {
    let metadata = match fs::symlink_metadata(target) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(target = %target.display(), "no existing bundle to remove");
            return Ok(());
        }
        Err(err) => {
            return Err(err)
                .with_context(|| format!("Unable to inspect {}", target.display()));
        }
    };
    let removed = if metadata.is_dir() {
        fs::remove_dir_all(target)
    } else {
        fs::remove_file(target)
    };
    removed.with_context(|| format!("Failed to remove existing bundle {}", target.display()))?;
    debug!(target = %target.display(), "removed existing bundle");
    Ok(())
}

/// Recursively copy `source` to `target`, keeping symlinks and permissions.
pub fn copy_tree(source: &Path, target: &Path) -> Result<()> {
    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(source)?;
        let destination = target.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&destination)
                .with_context(|| format!("Failed to create {}", destination.display()))?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &destination)?;
        } else {
            fs::copy(entry.path(), &destination)
                .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(link: &Path, destination: &Path) -> Result<()> {
    let pointee = fs::read_link(link)
        .with_context(|| format!("Failed to read link {}", link.display()))?;
    std::os::unix::fs::symlink(&pointee, destination)
        .with_context(|| format!("Failed to create link {}", destination.display()))
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, destination: &Path) -> Result<()> {
    fs::copy(link, destination)
        .map(|_| ())
        .with_context(|| format!("Failed to copy {}", link.display()))
}
