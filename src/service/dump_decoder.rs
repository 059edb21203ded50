use crate::error::DecodeError;
use crate::types::DecompressorKind;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Turns a dump file into the SQL bytes handed to the loader.
#[derive(Debug, Clone, Copy, Default)]
pub struct DumpDecoder;

impl DumpDecoder {
    pub fn new() -> Self {
        Self
    }

    pub fn select_decompressor(filename: &str) -> DecompressorKind {
        DecompressorKind::from_filename(filename)
    }

    pub async fn decode(&self, path: &Path, kind: DecompressorKind) -> Result<Vec<u8>, DecodeError> {
        let Some((program, args)) = tool_for(kind) else {
            return tokio::fs::read(path).await.map_err(|source| DecodeError::Read {
                path: path.to_path_buf(),
                source,
            });
        };

        debug!(program, path = %path.display(), "decompressing dump");
        let output = Command::new(program)
            .args(args)
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| DecodeError::Spawn { program, source })?;

        if !output.status.success() {
            return Err(DecodeError::Tool {
                program,
                path: path.to_path_buf(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

fn tool_for(kind: DecompressorKind) -> Option<(&'static str, &'static [&'static str])> {
    match kind {
        DecompressorKind::None => None,
        DecompressorKind::Gzip => Some(("gunzip", &["--stdout"])),
        DecompressorKind::Bzip2 => Some(("bunzip2", &["--stdout"])),
        DecompressorKind::Xz => Some(("xz", &["--decompress", "--stdout"])),
    }
}
