use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::command::CommandSpec;
use crate::error::ConfigNotFound;

pub const CONFIG_FILE_NAME: &str = "appcycle.json";
pub const MANIFEST_FILE_NAME: &str = "package.json";
pub const DEFAULT_INSTALL_DIR: &str = "/Applications";
pub const DEFAULT_OUTPUT_DIR: &str = "dist";

/// Directory every relative path of a run is resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRoot(PathBuf);

impl ProjectRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.0.join(relative)
    }
}

/// On-disk `appcycle.json` contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub app_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_command: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            build_command: None,
            install_dir: None,
            output_dir: None,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Unable to read config at {}", path.display()))?;
        let parsed: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Malformed config at {}", path.display()))?;
        if parsed.app_name.trim().is_empty() {
            bail!("appName in {} must not be empty", path.display());
        }
        Ok(parsed)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory {}", parent.display())
            })?;
        }
        let mut serialised = serde_json::to_string_pretty(self)?;
        serialised.push('\n');
        fs::write(path, serialised)
            .with_context(|| format!("Failed to persist config to {}", path.display()))
    }
}

/// The slice of `package.json` the workflow reads.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub build: Option<ManifestBuild>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestBuild {
    #[serde(default)]
    pub product_name: Option<String>,
}

impl Manifest {
    pub fn load(root: &ProjectRoot) -> Result<Self> {
        let path = root.join(MANIFEST_FILE_NAME);
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Unable to read manifest at {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Malformed manifest at {}", path.display()))
    }

    /// Semantic version string; required for locating the installer.
    pub fn version(&self) -> Result<&str> {
        match self.version.as_deref().map(str::trim) {
            Some(version) if !version.is_empty() => Ok(version),
            _ => bail!("{MANIFEST_FILE_NAME} has no version field"),
        }
    }

    /// Display name a packager would give the application bundle.
    pub fn product_name(&self) -> Option<&str> {
        self.build
            .as_ref()
            .and_then(|build| build.product_name.as_deref())
            .or(self.product_name.as_deref())
            .or(self.name.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Everything the workflow needs to know about the target application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectProfile {
    pub app_name: String,
    pub build_command: CommandSpec,
    pub install_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl ProjectProfile {
    fn from_config(config: AppConfig, root: &ProjectRoot) -> Result<Self> {
        let build_command = match &config.build_command {
            Some(argv) => CommandSpec::from_argv(argv).context("Invalid buildCommand")?,
            None => default_build_command(),
        };
        let output_dir = config
            .output_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
        Ok(Self {
            app_name: config.app_name.trim().to_string(),
            build_command,
            install_dir: config
                .install_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INSTALL_DIR)),
            output_dir: root.join(output_dir),
        })
    }
}

pub fn default_build_command() -> CommandSpec {
    CommandSpec::new("npm", vec!["run".into(), "dist".into()])
}

/// Strategy that turns a project root into a [`ProjectProfile`].
pub trait ProjectResolver {
    fn resolve(&self, root: &ProjectRoot) -> Result<ProjectProfile>;
}

/// Reads `appcycle.json` from the first candidate directory containing one.
#[derive(Debug, Clone, Default)]
pub struct ConfigFileResolver {
    extra_dirs: Vec<PathBuf>,
}

impl ConfigFileResolver {
    /// Search only project-local directories plus `extra_dirs`.
    pub fn with_dirs(extra_dirs: Vec<PathBuf>) -> Self {
        Self { extra_dirs }
    }

    pub fn user_default() -> Self {
        let extra_dirs = ProjectDirs::from("dev", "appcycle", "appcycle")
            .map(|dirs| vec![dirs.config_dir().to_path_buf()])
            .unwrap_or_default();
        Self { extra_dirs }
    }

    pub fn candidates(&self, root: &ProjectRoot) -> Vec<PathBuf> {
        let mut dirs = vec![root.path().to_path_buf(), root.join(".config")];
        dirs.extend(self.extra_dirs.iter().cloned());
        dirs
    }
}

impl ProjectResolver for ConfigFileResolver {
    fn resolve(&self, root: &ProjectRoot) -> Result<ProjectProfile> {
        let path = discover_config(&self.candidates(root))?;
        debug!(path = %path.display(), "using project config");
        let config = AppConfig::load(&path)?;
        ProjectProfile::from_config(config, root)
    }
}

/// Derives the application name from `package.json` alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestResolver;

impl ProjectResolver for ManifestResolver {
    fn resolve(&self, root: &ProjectRoot) -> Result<ProjectProfile> {
        let manifest = Manifest::load(root)?;
        let Some(name) = manifest.product_name() else {
            bail!("{MANIFEST_FILE_NAME} names no product (build.productName, productName or name)");
        };
        ProjectProfile::from_config(AppConfig::new(name), root)
    }
}

/// Where the application identity comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ProfileSource {
    /// `appcycle.json` written by `appcycle init`.
    #[default]
    Config,
    /// Product name from `package.json`.
    Manifest,
}

impl ProfileSource {
    pub fn resolver(self) -> Box<dyn ProjectResolver> {
        match self {
            ProfileSource::Config => Box::new(ConfigFileResolver::user_default()),
            ProfileSource::Manifest => Box::new(ManifestResolver),
        }
    }
}

/// First `appcycle.json` among `dirs`, in order.
pub fn discover_config(dirs: &[PathBuf]) -> Result<PathBuf, ConfigNotFound> {
    dirs.iter()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|path| path.is_file())
        .ok_or_else(|| ConfigNotFound {
            file_name: CONFIG_FILE_NAME,
            searched: dirs.to_vec(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn discover_prefers_earlier_candidates() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("a");
        let second = dir.path().join("b");
        write(&second.join(CONFIG_FILE_NAME), "{}");
        assert_eq!(
            discover_config(&[first.clone(), second.clone()]).unwrap(),
            second.join(CONFIG_FILE_NAME)
        );

        write(&first.join(CONFIG_FILE_NAME), "{}");
        assert_eq!(
            discover_config(&[first.clone(), second]).unwrap(),
            first.join(CONFIG_FILE_NAME)
        );
    }

    #[test]
    fn missing_config_is_a_distinct_error() {
        let dir = tempdir().unwrap();
        let root = ProjectRoot::new(dir.path());
        let err = ConfigFileResolver::with_dirs(vec![])
            .resolve(&root)
            .unwrap_err();
        let not_found = err.downcast_ref::<ConfigNotFound>().unwrap();
        assert_eq!(not_found.searched.len(), 2);
    }

    #[test]
    fn config_resolver_applies_defaults() {
        let dir = tempdir().unwrap();
        let root = ProjectRoot::new(dir.path());
        write(
            &root.join(".config").join(CONFIG_FILE_NAME),
            r#"{ "appName": " Notes " }"#,
        );
        let profile = ConfigFileResolver::with_dirs(vec![])
            .resolve(&root)
            .unwrap();
        assert_eq!(profile.app_name, "Notes");
        assert_eq!(profile.build_command, default_build_command());
        assert_eq!(profile.install_dir, PathBuf::from(DEFAULT_INSTALL_DIR));
        assert_eq!(profile.output_dir, root.join(DEFAULT_OUTPUT_DIR));
    }

    #[test]
    fn config_resolver_honours_overrides() {
        let dir = tempdir().unwrap();
        let root = ProjectRoot::new(dir.path());
        write(
            &root.join(CONFIG_FILE_NAME),
            r#"{
                "appName": "Notes",
                "buildCommand": ["yarn", "make"],
                "installDir": "/tmp/apps",
                "outputDir": "out/make"
            }"#,
        );
        let profile = ConfigFileResolver::with_dirs(vec![])
            .resolve(&root)
            .unwrap();
        assert_eq!(profile.build_command.describe(), "yarn make");
        assert_eq!(profile.install_dir, PathBuf::from("/tmp/apps"));
        assert_eq!(profile.output_dir, root.join("out/make"));
    }

    #[test]
    fn blank_app_name_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        write(&path, r#"{ "appName": "   " }"#);
        assert!(AppConfig::load(&path).is_err());
    }

    #[test]
    fn saved_config_round_trips_without_unset_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        AppConfig::new("Notes").save(&path).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(raw.trim(), "{\n  \"appName\": \"Notes\"\n}");
        assert_eq!(AppConfig::load(&path).unwrap(), AppConfig::new("Notes"));
    }

    #[test]
    fn manifest_product_name_precedence() {
        let manifest: Manifest = serde_json::from_str(
            r#"{ "name": "notes", "productName": "Notes", "build": { "productName": "Notes Pro" } }"#,
        )
        .unwrap();
        assert_eq!(manifest.product_name(), Some("Notes Pro"));

        let manifest: Manifest = serde_json::from_str(r#"{ "name": "notes" }"#).unwrap();
        assert_eq!(manifest.product_name(), Some("notes"));
    }

    #[test]
    fn manifest_requires_version() {
        let manifest: Manifest = serde_json::from_str(r#"{ "name": "notes" }"#).unwrap();
        assert!(manifest.version().is_err());
        let manifest: Manifest = serde_json::from_str(r#"{ "version": "1.2.3" }"#).unwrap();
        assert_eq!(manifest.version().unwrap(), "1.2.3");
    }

    #[test]
    fn manifest_resolver_reads_package_json() {
        let dir = tempdir().unwrap();
        let root = ProjectRoot::new(dir.path());
        write(
            &root.join(MANIFEST_FILE_NAME),
            r#"{ "name": "notes", "productName": "Notes", "version": "0.3.0" }"#,
        );
        let profile = ManifestResolver.resolve(&root).unwrap();
        assert_eq!(profile.app_name, "Notes");
        assert_eq!(profile.build_command, default_build_command());
    }
}
