use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::platform::{NativePlatform, Platform};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("reading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
    #[error("writing {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A dotenv-format key-value file.
///
/// Saving rewrites the whole file with keys in sorted order. There is no
/// locking; the last writer wins.
#[derive(Debug, Clone)]
pub struct EnvFile {
    path: PathBuf,
}

impl EnvFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The `.env` file next to where the process was started.
    pub fn in_working_dir() -> Self {
        Self::new(".env")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file reads as an empty map.
    pub fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let read_err = |source| StoreError::Read {
            path: self.path.clone(),
            source,
        };

        let mut values = BTreeMap::new();
        for item in dotenvy::from_path_iter(&self.path).map_err(read_err)? {
            let (key, value) = item.map_err(read_err)?;
            values.insert(key, value);
        }
        Ok(values)
    }

    pub fn save(&self, values: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        std::fs::write(&self.path, render(values)).map_err(write_err)?;
        // The file holds the bot token.
        NativePlatform::restrict_file_permissions(&self.path).map_err(write_err)?;
        tracing::debug!(path = %self.path.display(), keys = values.len(), "saved configuration");
        Ok(())
    }
}

fn render(values: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for (key, value) in values {
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape_value(value));
        out.push_str("\"\n");
    }
    out
}

fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '$' => escaped.push_str("\\$"),
            '\n' => escaped.push_str("\\n"),
            other => escaped.push(other),
        }
    }
    escaped
}
