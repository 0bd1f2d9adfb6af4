use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use anyhow::{Context, Result, bail};
use tracing::{debug, warn};

use crate::command::resolve_tool;
use crate::error::StepError;

/// Attaches and detaches disk images.
pub trait VolumeTool {
    /// Mount `image` and return where its volume appeared.
    fn attach(&self, image: &Path) -> Result<PathBuf>;
    fn detach(&self, mount_point: &Path) -> Result<()>;
}

/// `hdiutil`, the macOS disk image tool.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hdiutil;

impl VolumeTool for Hdiutil {
    fn attach(&self, image: &Path) -> Result<PathBuf> {
        let binary = resolve_tool("hdiutil")?;
        let output = Command::new(binary)
            .arg("attach")
            .arg("-nobrowse")
            .arg(image)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to run hdiutil attach for {}", image.display()))?;
        if !output.status.success() {
            bail!(
                "hdiutil attach {} failed: {}",
                image.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        volume_or_detach(self, image, &stdout)
    }

    fn detach(&self, mount_point: &Path) -> Result<()> {
        let binary = resolve_tool("hdiutil")?;
        let output = Command::new(binary)
            .arg("detach")
            .arg(mount_point)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to run hdiutil detach for {}", mount_point.display()))?;
        if !output.status.success() {
            bail!(
                "hdiutil detach {} failed: {}",
                mount_point.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

/// The mount point in `stdout`, or `MountPointNotFound` after detaching the
/// device the image was attached to.
fn volume_or_detach<V: VolumeTool + ?Sized>(
    tool: &V,
    image: &Path,
    stdout: &str,
) -> Result<PathBuf> {
    if let Some(point) = parse_mount_point(stdout) {
        return Ok(point);
    }
    if let Some(device) = parse_device(stdout) {
        if let Err(err) = tool.detach(&device) {
            warn!(device = %device.display(), error = %err, "Failed to detach unmounted image");
        }
    }
    Err(StepError::MountPointNotFound {
        image: image.to_path_buf(),
    }
    .into())
}

/// Extract the mount point from `hdiutil attach` output.
///
/// Input: the tool's stdout, one device per line, columns separated by tabs
/// or runs of spaces, with the mounted volume (if any) in the last column.
/// Output: the text from `/Volumes/` to the end of the last line mentioning
/// it, trimmed. Volume names may contain spaces, so columns are not split.
/// Returns `None` when no line mentions `/Volumes/`.
pub fn parse_mount_point(output: &str) -> Option<PathBuf> {
    output
        .lines()
        .filter_map(|line| line.find("/Volumes/").map(|start| line[start..].trim()))
        .filter(|point| point.len() > "/Volumes/".len())
        .last()
        .map(PathBuf::from)
}

/// The whole-disk device `hdiutil attach` reports first, e.g. `/dev/disk4`.
pub fn parse_device(output: &str) -> Option<PathBuf> {
    output
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .find(|token| token.starts_with("/dev/"))
        .map(PathBuf::from)
}

/// An attached image. Detached exactly once: by [`Mount::release`] or on drop.
pub struct Mount<'a, V: VolumeTool + ?Sized> {
    tool: &'a V,
    point: PathBuf,
    attached: bool,
}

impl<'a, V: VolumeTool + ?Sized> Mount<'a, V> {
    pub fn attach(tool: &'a V, image: &Path) -> Result<Self> {
        let point = tool.attach(image)?;
        debug!(image = %image.display(), mount = %point.display(), "attached image");
        Ok(Self {
            tool,
            point,
            attached: true,
        })
    }

    pub fn point(&self) -> &Path {
        &self.point
    }

    /// Detach now, surfacing any failure.
    pub fn release(mut self) -> Result<()> {
        self.attached = false;
        self.tool.detach(&self.point)?;
        debug!(mount = %self.point.display(), "detached image");
        Ok(())
    }
}

impl<V: VolumeTool + ?Sized> Drop for Mount<'_, V> {
    fn drop(&mut self) {
        if !self.attached {
            return;
        }
        self.attached = false;
        match self.tool.detach(&self.point) {
            Ok(()) => debug!(mount = %self.point.display(), "detached image during cleanup"),
            Err(err) => warn!(
                mount = %self.point.display(),
                error = %err,
                "Failed to detach image during cleanup"
            ),
        }
    }
}
