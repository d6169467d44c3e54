use std::path::Path;

use super::Platform;

pub struct NativePlatform;

impl Platform for NativePlatform {
    fn restrict_file_permissions(_path: &Path) -> std::io::Result<()> {
        Ok(())
    }

    fn set_executable(_path: &Path) -> std::io::Result<()> {
        Ok(())
    }
}
