//! Isolated per-scenario working directory

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::common::Result;

/// Temporary directory that is both the scenario's cwd and the CLI's home
///
/// Removed when dropped unless created with `preserve`.
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl Workspace {
    pub fn create(preserve: bool) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("gigalixir-smoke-")
            .tempdir()?;
        let path = dir.path().to_path_buf();

        if preserve {
            let kept = dir.keep();
            tracing::info!("Workspace will be preserved at {}", kept.display());
            return Ok(Self {
                dir: None,
                path: kept,
            });
        }

        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_preserved(&self) -> bool {
        self.dir.is_none()
    }
}
