use std::path::{Path, PathBuf};

/// What to check out and where. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSpec {
    repository: String,
    revision: String,
    destination: PathBuf,
}

impl FetchSpec {
    pub fn new(
        repository: impl Into<String>,
        revision: impl Into<String>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self {
            repository: repository.into(),
            revision: revision.into(),
            destination: destination.into(),
        }
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn revision(&self) -> &str {
        &self.revision
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }
}
