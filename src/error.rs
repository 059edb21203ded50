use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error as ThisError;

/// Top-level error surfaced to whoever invoked the pipeline.
#[derive(Debug, ThisError)]
pub enum ProvisionError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to stage SSH credential at {path}: {source}")]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("replication master reset failed: {0}")]
    ResetMaster(#[from] sqlx::Error),
}

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("missing required setting `{0}`")]
    Missing(&'static str),

    #[error("`import.dump_file` must be a relative path inside the checkout, got `{0}`")]
    DumpFileOutsideCheckout(String),
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError::Load(Box::new(e))
    }
}

/// Checkout failures. Fatal; retry policy belongs to the caller.
#[derive(Debug, ThisError)]
pub enum FetchError {
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git {step} of {repository} failed ({status}): {stderr}")]
    Git {
        step: &'static str,
        repository: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("failed to clear stale checkout at {path}: {source}")]
    StaleCheckout {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Decompression failures. No sentinel is written, so the next run retries.
#[derive(Debug, ThisError)]
pub enum DecodeError {
    #[error("failed to read dump file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited with {status} while decompressing {path}: {stderr}")]
    Tool {
        program: &'static str,
        path: PathBuf,
        status: ExitStatus,
        stderr: String,
    },
}

/// Load failures, plus failures to record a completed load.
#[derive(Debug, ThisError)]
pub enum ImportError {
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited with {status} loading database `{database}`: {stderr}")]
    Client {
        program: String,
        database: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("failed to stream dump into database `{database}`: {source}")]
    Stdin {
        database: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write sentinel {path}: {source}")]
    Sentinel {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to inspect sentinel {path}: {source}")]
    SentinelLookup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact path {0} has no file name")]
    NoBasename(PathBuf),
}

/// Non-fatal cleanup failure. Logged by the pipeline, never propagated.
#[derive(Debug, ThisError)]
#[error("failed to remove {path}: {source}")]
pub struct CleanupWarning {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl ProvisionError {
    /// Retrying the whole run is safe for these; the import gate keeps it idempotent.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProvisionError::Fetch(_)
                | ProvisionError::Decode(_)
                | ProvisionError::Import(_)
                | ProvisionError::ResetMaster(_)
        )
    }
}
