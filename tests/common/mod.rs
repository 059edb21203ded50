#![allow(dead_code)]

use flate2::Compression;
use flate2::write::GzEncoder;
use rs_mysql::config::Config;
use rs_mysql::db::{ArtifactLoader, DatabaseTarget};
use rs_mysql::error::ImportError;
use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::{Command, ExitStatus};
use std::sync::Mutex;
use tempfile::TempDir;

/// Stands in for MySQL: records every load, optionally failing it.
#[derive(Default)]
pub struct RecordingLoader {
    calls: Mutex<Vec<(String, Vec<u8>)>>,
    fail: bool,
}

impl RecordingLoader {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, Vec<u8>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl ArtifactLoader for RecordingLoader {
    async fn load(&self, target: &DatabaseTarget, sql: &[u8]) -> Result<(), ImportError> {
        self.calls
            .lock()
            .unwrap()
            .push((target.database.clone(), sql.to_vec()));
        if self.fail {
            return Err(ImportError::Client {
                program: "mysql".to_string(),
                database: target.database.clone(),
                status: ExitStatus::from_raw(1 << 8),
                stderr: "simulated load failure".to_string(),
            });
        }
        Ok(())
    }
}

pub const DUMP_SQL: &str = "CREATE TABLE app_test (id INT);\nINSERT INTO app_test VALUES (1);\n";

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Config whose every path lives under `root`.
pub fn test_config(root: &Path, repository: &str, dump_file: &str) -> Config {
    let mut cfg = Config::default();
    cfg.import.repository = repository.to_string();
    cfg.import.revision = "main".to_string();
    cfg.import.dump_file = dump_file.to_string();
    cfg.mysql.root_password = "rootpass".to_string();
    cfg.paths.key_file = root.join("git_key");
    cfg.paths.ssh_wrapper = root.join("git_ssh.sh");
    cfg.paths.destination_dir = root.join("git_download");
    cfg.paths.sentinel_dir = root.join("var/lib/rightscale");
    cfg
}

pub fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args([
            "-c",
            "user.name=rs-mysql tests",
            "-c",
            "user.email=tests@example.com",
            "-c",
            "init.defaultBranch=main",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .current_dir(dir)
        .status()
        .expect("git must be installed to run these tests");
    assert!(status.success(), "git {args:?} failed");
}

/// A local repository on `main` holding `files` in a single commit.
pub fn dump_repo(files: &[(&str, &[u8])]) -> TempDir {
    let repo = TempDir::new().unwrap();
    git(repo.path(), &["init", "--quiet"]);
    for (name, contents) in files {
        let path = repo.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }
    git(repo.path(), &["add", "--all"]);
    git(repo.path(), &["commit", "--quiet", "-m", "add dump"]);
    repo
}

/// Executable shell script at `dir/name`, standing in for an external tool.
pub fn fake_tool(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}

/// Compress `data` with the system `tool` the decoder shells out to.
/// Returns `None` when the tool is not installed.
pub fn compress_with(tool: &str, dir: &Path, name: &str, data: &[u8]) -> Option<std::path::PathBuf> {
    let plain = dir.join(name);
    fs::write(&plain, data).unwrap();
    let status = Command::new(tool).arg("--force").arg(&plain).status().ok()?;
    assert!(status.success(), "{tool} failed");
    let ext = match tool {
        "bzip2" => "bz2",
        "xz" => "xz",
        other => panic!("no fixture extension for {other}"),
    };
    Some(dir.join(format!("{name}.{ext}")))
}
