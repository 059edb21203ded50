pub mod config;
pub mod db;
pub mod error;
pub mod service;
pub mod types;

pub use config::Config;
pub use error::{CleanupWarning, ProvisionError};
pub use service::DumpImportPipeline;
pub use types::ImportOutcome;
