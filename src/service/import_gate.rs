use super::dump_decoder::DumpDecoder;
use super::sentinel::SentinelStore;
use crate::db::{ArtifactLoader, ConnectionInfo, DatabaseTarget};
use crate::error::{ImportError, ProvisionError};
use crate::types::{Artifact, ImportOutcome};
use std::path::Path;
use tracing::{info, warn};

/// Runs an import at most once per artifact base name.
///
/// Two artifacts sharing a base name under different directories count as the same
/// import. Concurrent runs for one key are not serialized against each other.
pub struct ImportGate<L> {
    loader: L,
    decoder: DumpDecoder,
    connection: ConnectionInfo,
    sentinels: SentinelStore,
}

impl<L: ArtifactLoader> ImportGate<L> {
    pub fn new(loader: L, connection: ConnectionInfo, sentinels: SentinelStore) -> Self {
        Self {
            loader,
            decoder: DumpDecoder::new(),
            connection,
            sentinels,
        }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn sentinels(&self) -> &SentinelStore {
        &self.sentinels
    }

    pub async fn run_once(&self, artifact_path: &Path) -> Result<ImportOutcome, ProvisionError> {
        let artifact = Artifact::from_path(artifact_path)
            .ok_or_else(|| ImportError::NoBasename(artifact_path.to_path_buf()))?;
        let key = artifact.basename.as_str();

        if let Some(completed_at) = self.sentinels.completed_at(key).await? {
            info!(
                artifact = %key,
                completed_at = %completed_at,
                "The dump file was already imported at {}",
                completed_at
            );
            return Ok(ImportOutcome::Skipped { completed_at });
        }

        let kind = DumpDecoder::select_decompressor(key);
        let sql = self
            .decoder
            .decode(&artifact.path, kind)
            .await
            .inspect_err(|e| warn!(artifact = %key, error = %e, "dump decode failed"))?;

        let target = DatabaseTarget::new(self.connection.clone(), artifact.database_name());
        info!(
            artifact = %key,
            database = %target.database,
            decompressor = ?kind,
            bytes = sql.len(),
            "importing dump"
        );
        self.loader
            .load(&target, &sql)
            .await
            .inspect_err(|e| warn!(artifact = %key, error = %e, "dump load failed"))?;

        let sentinel = self.sentinels.record(key).await?;
        info!(
            artifact = %key,
            sentinel = %sentinel.display(),
            "dump import recorded"
        );
        Ok(ImportOutcome::Imported {
            database: target.database,
        })
    }
}
