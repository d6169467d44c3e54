use std::fmt;
use std::path::Path;

/// Operating-system families the installers know how to target.
///
/// Detection happens once at the top of the wizard; every installer matches
/// on this enum instead of comparing OS strings, and `Other` carries the raw
/// identifier so error messages can name the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OsFamily {
    Linux,
    MacOs,
    Windows,
    Other(String),
}

impl OsFamily {
    pub fn detect() -> Self {
        Self::from_target(std::env::consts::OS)
    }

    /// Map a `std::env::consts::OS` identifier onto a family.
    pub fn from_target(os: &str) -> Self {
        match os {
            "linux" => OsFamily::Linux,
            "macos" => OsFamily::MacOs,
            "windows" => OsFamily::Windows,
            other => OsFamily::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            OsFamily::Linux => "linux",
            OsFamily::MacOs => "macos",
            OsFamily::Windows => "windows",
            OsFamily::Other(name) => name,
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File-permission operations that differ between Unix and Windows.
/// Each OS provides its own `NativePlatform` so call sites stay free of
/// `#[cfg]` blocks.
pub trait Platform {
    /// Owner read/write only (0o600 on Unix, no-op on Windows).
    fn restrict_file_permissions(path: &Path) -> std::io::Result<()>;

    /// Mark a file as executable (0o755 on Unix, no-op on Windows).
    fn set_executable(path: &Path) -> std::io::Result<()>;
}

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub use unix::NativePlatform;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::NativePlatform;
