//! Plain data passed between pipeline steps.

pub mod artifact;
pub mod fetch;
pub mod outcome;

pub use artifact::{Artifact, DecompressorKind};
pub use fetch::FetchSpec;
pub use outcome::ImportOutcome;
