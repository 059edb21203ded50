use crate::config::PathsConfig;
use crate::error::ImportError;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

const SENTINEL_DIR_MODE: u32 = 0o755;

/// Touch files recording completed imports, one per artifact base name.
#[derive(Debug, Clone)]
pub struct SentinelStore {
    dir: PathBuf,
    prefix: String,
}

impl SentinelStore {
    pub fn new(paths: &PathsConfig) -> Self {
        Self {
            dir: paths.sentinel_dir.clone(),
            prefix: paths.sentinel_prefix.clone(),
        }
    }

    /// `<dir>/<prefix>-import-<key>.touch`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}-import-{}.touch", self.prefix, key))
    }

    /// Modification time of the sentinel for `key`, or `None` if no import completed yet.
    pub async fn completed_at(&self, key: &str) -> Result<Option<DateTime<Utc>>, ImportError> {
        let path = self.path_for(key);
        let lookup_err = |source| ImportError::SentinelLookup {
            path: path.clone(),
            source,
        };
        let meta = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(lookup_err(e)),
        };
        let modified = meta.modified().map_err(lookup_err)?;
        Ok(Some(DateTime::<Utc>::from(modified)))
    }

    /// Create the sentinel directory if needed, then touch the sentinel for `key`.
    pub async fn record(&self, key: &str) -> Result<PathBuf, ImportError> {
        let mut builder = tokio::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(SENTINEL_DIR_MODE);
        builder
            .create(&self.dir)
            .await
            .map_err(|source| ImportError::Sentinel {
                path: self.dir.clone(),
                source,
            })?;

        let path = self.path_for(key);
        tokio::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .await
            .map_err(|source| ImportError::Sentinel {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), "sentinel written");
        Ok(path)
    }
}
