use std::path::PathBuf;

use thiserror::Error;

/// Failures that identify which workflow step stopped the run.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("appcycle only runs on macOS (detected {detected})")]
    UnsupportedPlatform { detected: String },

    #[error("build command `{command}` exited with code {code}")]
    BuildFailed { command: String, code: i32 },

    #[error("build command `{command}` was terminated by a signal")]
    BuildInterrupted { command: String },

    #[error("installer not found at {}; did the build succeed?", .path.display())]
    InstallerMissing { path: PathBuf },

    #[error("installer image not found at {}", .path.display())]
    ImageMissing { path: PathBuf },

    #[error("could not determine mount point for {}", .image.display())]
    MountPointNotFound { image: PathBuf },

    #[error("{app}.app not found inside mounted image at {}", .mount.display())]
    BundleMissingInImage { app: String, mount: PathBuf },

    #[error("{app} is not installed at {}", .path.display())]
    NotInstalled { app: String, path: PathBuf },

    #[error("executable for {app} not found at {}", .path.display())]
    ExecutableMissing { app: String, path: PathBuf },
}

/// Raised when no `appcycle.json` exists in any candidate directory.
#[derive(Debug, Error)]
#[error("no {file_name} found (searched {})", render_searched(.searched))]
pub struct ConfigNotFound {
    pub file_name: &'static str,
    pub searched: Vec<PathBuf>,
}

fn render_searched(searched: &[PathBuf]) -> String {
    searched
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
