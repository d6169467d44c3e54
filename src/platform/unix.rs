use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use super::Platform;

pub struct NativePlatform;

impl Platform for NativePlatform {
    fn restrict_file_permissions(path: &Path) -> std::io::Result<()> {
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
    }

    fn set_executable(path: &Path) -> std::io::Result<()> {
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
    }
}
