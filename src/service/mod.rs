pub mod dump_decoder;
pub mod import_gate;
pub mod pipeline;
pub mod scratch_cleaner;
pub mod secret_staging;
pub mod sentinel;
pub mod source_fetcher;

pub use dump_decoder::DumpDecoder;
pub use import_gate::ImportGate;
pub use pipeline::DumpImportPipeline;
pub use scratch_cleaner::ScratchCleaner;
pub use secret_staging::{SecretStaging, StagedCredential};
pub use sentinel::SentinelStore;
pub use source_fetcher::SourceFetcher;
