use super::import_gate::ImportGate;
use super::scratch_cleaner::ScratchCleaner;
use super::secret_staging::SecretStaging;
use super::sentinel::SentinelStore;
use super::source_fetcher::SourceFetcher;
use crate::config::Config;
use crate::db::{ArtifactLoader, ConnectionInfo};
use crate::error::{ConfigError, ProvisionError};
use crate::types::{FetchSpec, ImportOutcome};
use std::path::PathBuf;
use tracing::{info, warn};

/// Stage credential → fetch → release credential → import gate → clean scratch.
pub struct DumpImportPipeline<L> {
    staging: SecretStaging,
    fetcher: SourceFetcher,
    gate: ImportGate<L>,
    scratch: ScratchCleaner,
    spec: FetchSpec,
    dump_file: PathBuf,
    private_key: Option<String>,
}

impl<L: ArtifactLoader> DumpImportPipeline<L> {
    /// Rejects incomplete settings and dump paths that would escape the checkout.
    pub fn new(config: &Config, loader: L) -> Result<Self, ConfigError> {
        config.validate_import()?;
        let paths = &config.paths;
        Ok(Self {
            staging: SecretStaging::new(paths),
            fetcher: SourceFetcher::new(&config.tools),
            gate: ImportGate::new(
                loader,
                ConnectionInfo::from(&config.mysql),
                SentinelStore::new(paths),
            ),
            scratch: ScratchCleaner::new(&paths.destination_dir),
            spec: FetchSpec::new(
                &config.import.repository,
                &config.import.revision,
                &paths.destination_dir,
            ),
            dump_file: PathBuf::from(&config.import.dump_file),
            private_key: config.private_key().map(str::to_owned),
        })
    }

    pub fn gate(&self) -> &ImportGate<L> {
        &self.gate
    }

    pub async fn run(&self) -> Result<ImportOutcome, ProvisionError> {
        let credential = self.staging.stage(self.private_key.as_deref()).await?;
        let fetched = self.fetcher.fetch(&self.spec, credential.as_ref()).await;

        // Secrets go away before anything else happens, fetch outcome notwithstanding.
        if let Some(credential) = credential
            && let Err(w) = credential.release().await
        {
            warn!(path = %w.path.display(), error = %w.source, "failed to remove staged SSH credential");
        }

        let checkout = match fetched {
            Ok(checkout) => checkout,
            Err(e) => {
                self.clean_scratch().await;
                return Err(e.into());
            }
        };

        let outcome = self.gate.run_once(&checkout.join(&self.dump_file)).await;
        self.clean_scratch().await;

        if let Ok(outcome) = &outcome {
            info!(skipped = outcome.was_skipped(), "dump import finished");
        }
        outcome
    }

    async fn clean_scratch(&self) {
        if let Err(w) = self.scratch.cleanup().await {
            warn!(path = %w.path.display(), error = %w.source, "failed to remove scratch directory");
        }
    }
}
