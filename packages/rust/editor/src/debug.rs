//! Optional on-disk copies of every intermediate artifact of an edit.
//!
//! Diagnostic only: write failures are logged and otherwise ignored.

use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, warn};
use uuid::Uuid;

use templatesmith_shared::{Result, TemplatesmithError};

/// Writes `<prefix>_<YYYYmmdd_HHMMSS>_<id8><ext>` files into a directory.
#[derive(Debug, Clone, Default)]
pub struct DebugArtifacts {
    dir: Option<PathBuf>,
}

impl DebugArtifacts {
    /// Artifacts are dropped; only structured logs remain.
    pub fn disabled() -> Self {
        Self { dir: None }
    }

    /// Write artifacts into `dir`, creating it now.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| TemplatesmithError::io(&dir, e))?;
        Ok(Self { dir: Some(dir) })
    }

    pub fn from_option(dir: Option<&Path>) -> Result<Self> {
        match dir {
            Some(dir) => Self::in_dir(dir),
            None => Ok(Self::disabled()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.dir.is_some()
    }

    /// Save `content`; returns the written path when enabled and successful.
    pub async fn save(&self, prefix: &str, extension: &str, content: &str) -> Option<PathBuf> {
        let dir = self.dir.as_ref()?;
        let path = dir.join(artifact_name(prefix, extension));

        match tokio::fs::write(&path, content).await {
            Ok(()) => {
                debug!(path = %path.display(), "debug artifact saved");
                Some(path)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to save debug artifact");
                None
            }
        }
    }
}

/// Unique per call: the suffix comes from the random tail of a v7 UUID.
fn artifact_name(prefix: &str, extension: &str) -> String {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let id = Uuid::now_v7().simple().to_string();
    let short = &id[id.len() - 8..];
    format!("{prefix}_{timestamp}_{short}{extension}")
}
