use crate::config::PathsConfig;
use crate::error::{CleanupWarning, ProvisionError};
use backon::{ExponentialBuilder, Retryable};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

const SECRET_MODE: u32 = 0o700;

fn release_retry_policy() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(100))
        .with_max_delay(Duration::from_secs(1))
        .with_max_times(3)
}

/// Writes the SSH key and `GIT_SSH` wrapper for the duration of one fetch.
#[derive(Debug, Clone)]
pub struct SecretStaging {
    key_file: PathBuf,
    ssh_wrapper: PathBuf,
}

impl SecretStaging {
    pub fn new(paths: &PathsConfig) -> Self {
        Self {
            key_file: paths.key_file.clone(),
            ssh_wrapper: paths.ssh_wrapper.clone(),
        }
    }

    /// Returns `None` when no key is configured; the fetch then uses plain git transport.
    pub async fn stage(
        &self,
        private_key: Option<&str>,
    ) -> Result<Option<StagedCredential>, ProvisionError> {
        let Some(key) = private_key else {
            debug!("no private key configured; skipping SSH credential staging");
            return Ok(None);
        };

        // From here on the guard owns whatever has been written, including partial writes.
        let credential = StagedCredential {
            key_file: self.key_file.clone(),
            ssh_wrapper: self.ssh_wrapper.clone(),
            released: false,
        };

        write_secret(&self.key_file, key.as_bytes()).await?;
        write_secret(&self.ssh_wrapper, wrapper_script(&self.key_file).as_bytes()).await?;

        info!(
            key_file = %self.key_file.display(),
            ssh_wrapper = %self.ssh_wrapper.display(),
            "staged SSH credential"
        );
        Ok(Some(credential))
    }
}

/// `exec ssh` with host key checking off and the staged key as identity.
pub fn wrapper_script(key_file: &Path) -> String {
    format!(
        "#!/bin/sh\nexec ssh -o StrictHostKeyChecking=no -i {} \"$@\"\n",
        shell_quote(&key_file.to_string_lossy())
    )
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

async fn write_secret(path: &Path, contents: &[u8]) -> Result<(), ProvisionError> {
    let staging_err = |source| ProvisionError::Staging {
        path: path.to_path_buf(),
        source,
    };

    let mut opts = tokio::fs::OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    opts.mode(SECRET_MODE);

    let mut file = opts.open(path).await.map_err(staging_err)?;
    // `mode` only applies on creation; tighten a file left over from an earlier run too.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(SECRET_MODE))
            .await
            .map_err(staging_err)?;
    }
    file.write_all(contents).await.map_err(staging_err)?;
    file.flush().await.map_err(staging_err)?;
    Ok(())
}

/// Key file and wrapper on disk. Removed by [`StagedCredential::release`], or on drop
/// if release never completed.
#[derive(Debug)]
pub struct StagedCredential {
    key_file: PathBuf,
    ssh_wrapper: PathBuf,
    released: bool,
}

impl StagedCredential {
    pub fn key_file(&self) -> &Path {
        &self.key_file
    }

    pub fn ssh_wrapper(&self) -> &Path {
        &self.ssh_wrapper
    }

    /// Delete both files. Already-absent files count as removed.
    pub async fn release(mut self) -> Result<(), CleanupWarning> {
        let key = remove_if_present(&self.key_file).await;
        let wrapper = remove_if_present(&self.ssh_wrapper).await;
        if key.is_ok() && wrapper.is_ok() {
            self.released = true;
            info!("released staged SSH credential");
        }
        key.and(wrapper)
    }
}

impl Drop for StagedCredential {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        for path in [&self.key_file, &self.ssh_wrapper] {
            match std::fs::remove_file(path) {
                Ok(()) => debug!(path = %path.display(), "removed staged secret on drop"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(
                    path = %path.display(),
                    error = %e,
                    "staged secret could not be removed"
                ),
            }
        }
    }
}

async fn remove_if_present(path: &Path) -> Result<(), CleanupWarning> {
    (|| async {
        match tokio::fs::remove_file(path).await {
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            other => other,
        }
    })
    .retry(release_retry_policy())
    .notify(|err, dur: Duration| {
        warn!(
            path = %path.display(),
            "removing staged secret failed: {}, retrying in {:?}",
            err, dur
        );
    })
    .await
    .map_err(|source| CleanupWarning {
        path: path.to_path_buf(),
        source,
    })
}
