use crate::error::CleanupWarning;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Removes the scratch checkout once a run is over, whatever its outcome.
#[derive(Debug, Clone)]
pub struct ScratchCleaner {
    destination: PathBuf,
}

impl ScratchCleaner {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
        }
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub async fn cleanup(&self) -> Result<(), CleanupWarning> {
        match tokio::fs::remove_dir_all(&self.destination).await {
            Ok(()) => {
                debug!(path = %self.destination.display(), "scratch directory removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CleanupWarning {
                path: self.destination.clone(),
                source,
            }),
        }
    }
}
