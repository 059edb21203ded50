use std::path::{Path, PathBuf};

/// Decompression strategy, chosen purely from the file name suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecompressorKind {
    None,
    Gzip,
    Bzip2,
    Xz,
}

impl DecompressorKind {
    /// Exact, case-sensitive suffix match; anything unrecognized is read raw.
    pub fn from_filename(filename: &str) -> Self {
        if filename.ends_with(".gz") {
            DecompressorKind::Gzip
        } else if filename.ends_with(".bz2") {
            DecompressorKind::Bzip2
        } else if filename.ends_with(".xz") {
            DecompressorKind::Xz
        } else {
            DecompressorKind::None
        }
    }
}

/// A fetched dump file inside the scratch checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub basename: String,
    pub compression: DecompressorKind,
}

impl Artifact {
    /// `None` when the path has no file name component (e.g. `/` or `..`).
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        let basename = path.file_name()?.to_string_lossy().into_owned();
        let compression = DecompressorKind::from_filename(&basename);
        Some(Self {
            path: path.to_path_buf(),
            basename,
            compression,
        })
    }

    /// Database name by loader convention: the base name minus its last extension.
    pub fn database_name(&self) -> String {
        Path::new(&self.basename)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.basename.clone())
    }
}
