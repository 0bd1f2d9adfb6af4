use std::{
    env,
    fmt,
    path::{Path, PathBuf},
};

/// Host operating system families the locator knows installer formats for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Windows,
    Linux,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        Self::from_os(env::consts::OS)
    }

    pub fn from_os(os: &str) -> Self {
        match os {
            "macos" => Platform::MacOs,
            "windows" => Platform::Windows,
            "linux" => Platform::Linux,
            _ => Platform::Other,
        }
    }

    pub fn installer_extension(&self) -> &'static str {
        match self {
            Platform::MacOs => "dmg",
            Platform::Windows => "exe",
            Platform::Linux => "AppImage",
            Platform::Other => "unknown",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::MacOs => write!(f, "macOS"),
            Platform::Windows => write!(f, "Windows"),
            Platform::Linux => write!(f, "Linux"),
            Platform::Other => write!(f, "unsupported"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    X86_64,
    Arm64,
    Other,
}

impl Arch {
    pub fn current() -> Self {
        Self::from_arch(env::consts::ARCH)
    }

    pub fn from_arch(arch: &str) -> Self {
        match arch {
            "x86_64" => Arch::X86_64,
            "aarch64" => Arch::Arm64,
            _ => Arch::Other,
        }
    }

    /// Packagers only tag the arm64 artifact; everything else is unsuffixed.
    pub fn artifact_suffix(&self) -> &'static str {
        match self {
            Arch::Arm64 => "-arm64",
            Arch::X86_64 | Arch::Other => "",
        }
    }
}

/// Expected installer path for a build of `app_name` at `version`.
pub fn locate_installer(
    output_dir: &Path,
    app_name: &str,
    version: &str,
    platform: Platform,
    arch: Arch,
) -> PathBuf {
    output_dir.join(format!(
        "{app_name}-{version}{}.{}",
        arch.artifact_suffix(),
        platform.installer_extension()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macos_arm_installer_name() {
        let path = locate_installer(
            Path::new("/work/notes/dist"),
            "Notes",
            "1.4.0",
            Platform::MacOs,
            Arch::Arm64,
        );
        assert_eq!(path, PathBuf::from("/work/notes/dist/Notes-1.4.0-arm64.dmg"));
    }

    #[test]
    fn extension_follows_platform() {
        let dir = Path::new("dist");
        let name = |platform| {
            locate_installer(dir, "Notes", "1.0.0", platform, Arch::X86_64)
                .file_name()
                .unwrap()
                .to_string_lossy()
                .into_owned()
        };
        assert_eq!(name(Platform::MacOs), "Notes-1.0.0.dmg");
        assert_eq!(name(Platform::Windows), "Notes-1.0.0.exe");
        assert_eq!(name(Platform::Linux), "Notes-1.0.0.AppImage");
        assert_eq!(name(Platform::Other), "Notes-1.0.0.unknown");
    }

    #[test]
    fn arch_only_changes_suffix() {
        let dir = Path::new("dist");
        let intel = locate_installer(dir, "Notes", "2.0.0", Platform::MacOs, Arch::X86_64);
        let arm = locate_installer(dir, "Notes", "2.0.0", Platform::MacOs, Arch::Arm64);
        assert_eq!(intel, PathBuf::from("dist/Notes-2.0.0.dmg"));
        assert_eq!(arm, PathBuf::from("dist/Notes-2.0.0-arm64.dmg"));
        assert_eq!(
            intel,
            locate_installer(dir, "Notes", "2.0.0", Platform::MacOs, Arch::X86_64)
        );
    }

    #[test]
    fn host_strings_map_to_variants() {
        assert_eq!(Platform::from_os("macos"), Platform::MacOs);
        assert_eq!(Platform::from_os("freebsd"), Platform::Other);
        assert_eq!(Arch::from_arch("aarch64"), Arch::Arm64);
        assert_eq!(Arch::from_arch("riscv64"), Arch::Other);
    }

    #[test]
    fn unknown_os_displays_as_unsupported() {
        assert_eq!(Platform::from_os("freebsd").to_string(), "unsupported");
        assert_eq!(Platform::from_os("linux").to_string(), "Linux");
    }
}
