use super::secret_staging::StagedCredential;
use crate::config::ToolsConfig;
use crate::error::FetchError;
use crate::types::FetchSpec;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Env var git consults for the SSH program; set per child process only.
pub const GIT_SSH_ENV: &str = "GIT_SSH";

/// Checks out one revision of a repository with the `git` executable.
#[derive(Debug, Clone)]
pub struct SourceFetcher {
    git: String,
}

impl SourceFetcher {
    pub fn new(tools: &ToolsConfig) -> Self {
        Self {
            git: tools.git.clone(),
        }
    }

    /// Clone `spec.repository` into `spec.destination` and check out `spec.revision`.
    /// No retries here; the caller decides whether to run again.
    pub async fn fetch(
        &self,
        spec: &FetchSpec,
        credential: Option<&StagedCredential>,
    ) -> Result<PathBuf, FetchError> {
        let dest = spec.destination();
        match tokio::fs::remove_dir_all(dest).await {
            Ok(()) => debug!(path = %dest.display(), "removed stale checkout"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(source) => {
                return Err(FetchError::StaleCheckout {
                    path: dest.to_path_buf(),
                    source,
                });
            }
        }

        info!(
            repository = %spec.repository(),
            revision = %spec.revision(),
            destination = %dest.display(),
            via_ssh_wrapper = credential.is_some(),
            "fetching dump repository"
        );

        self.run("clone", spec, self.clone_command(spec, credential))
            .await?;
        self.run("checkout", spec, self.checkout_command(spec, credential))
            .await?;

        Ok(dest.to_path_buf())
    }

    pub fn clone_command(
        &self,
        spec: &FetchSpec,
        credential: Option<&StagedCredential>,
    ) -> Command {
        let mut cmd = self.git_command(credential);
        cmd.args(["clone", "--quiet", "--no-checkout"])
            .arg(spec.repository())
            .arg(spec.destination());
        cmd
    }

    pub fn checkout_command(
        &self,
        spec: &FetchSpec,
        credential: Option<&StagedCredential>,
    ) -> Command {
        let mut cmd = self.git_command(credential);
        cmd.arg("-C")
            .arg(spec.destination())
            .args(["checkout", "--quiet", "--force"])
            .arg(spec.revision());
        cmd
    }

    fn git_command(&self, credential: Option<&StagedCredential>) -> Command {
        let mut cmd = Command::new(&self.git);
        cmd.env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(credential) = credential {
            cmd.env(GIT_SSH_ENV, credential.ssh_wrapper());
        }
        cmd
    }

    async fn run(
        &self,
        step: &'static str,
        spec: &FetchSpec,
        mut cmd: Command,
    ) -> Result<(), FetchError> {
        let output = cmd.output().await.map_err(|source| FetchError::Spawn {
            program: self.git.clone(),
            source,
        })?;
        if !output.status.success() {
            return Err(FetchError::Git {
                step,
                repository: spec.repository().to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        debug!(step, "git step completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    fn args_of(cmd: &Command) -> Vec<String> {
        cmd.as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn commands_target_spec_repository_and_revision() {
        let fetcher = SourceFetcher::new(&ToolsConfig::default());
        let spec = FetchSpec::new("git@example.com:ops/dumps.git", "v1.2", "/tmp/git_download");

        let clone = fetcher.clone_command(&spec, None);
        assert_eq!(clone.as_std().get_program(), OsStr::new("git"));
        assert_eq!(
            args_of(&clone),
            [
                "clone",
                "--quiet",
                "--no-checkout",
                "git@example.com:ops/dumps.git",
                "/tmp/git_download"
            ]
        );

        let checkout = fetcher.checkout_command(&spec, None);
        assert_eq!(
            args_of(&checkout),
            ["-C", "/tmp/git_download", "checkout", "--quiet", "--force", "v1.2"]
        );
    }

    #[test]
    fn no_credential_never_sets_git_ssh() {
        let fetcher = SourceFetcher::new(&ToolsConfig::default());
        let spec = FetchSpec::new("https://example.com/dumps.git", "main", "/tmp/x");
        for cmd in [
            fetcher.clone_command(&spec, None),
            fetcher.checkout_command(&spec, None),
        ] {
            assert!(
                cmd.as_std()
                    .get_envs()
                    .all(|(k, _)| k != OsStr::new(GIT_SSH_ENV))
            );
        }
    }
}
