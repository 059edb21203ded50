mod common;

use common::fake_tool;
use rs_mysql::config::ToolsConfig;
use rs_mysql::db::{ArtifactLoader, ConnectionInfo, DatabaseTarget, MySqlLoader};
use rs_mysql::error::ImportError;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn target() -> DatabaseTarget {
    DatabaseTarget::new(
        ConnectionInfo {
            host: "db.internal".to_string(),
            port: 3307,
            username: "root".to_string(),
            password: "rootpass".to_string(),
        },
        "app",
    )
}

fn loader_with(dir: &Path, body: &str) -> MySqlLoader {
    MySqlLoader::new(&ToolsConfig {
        mysql: fake_tool(dir, "mysql", body),
        ..ToolsConfig::default()
    })
}

#[tokio::test]
async fn dump_bytes_reach_client_unmodified() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().display();
    let loader = loader_with(
        dir.path(),
        &format!(
            "printf '%s' \"$MYSQL_PWD\" > '{out}/password'\n\
             printf '%s\\n' \"$@\" > '{out}/args'\n\
             cat > '{out}/stdin'"
        ),
    );
    // Latin-1 dump: not valid UTF-8.
    let sql = b"INSERT INTO t VALUES ('caf\xe9');\n";

    loader.load(&target(), sql).await.unwrap();

    let mut expected = b"CREATE DATABASE IF NOT EXISTS `app`;\nUSE `app`;\n".to_vec();
    expected.extend_from_slice(sql);
    assert_eq!(fs::read(dir.path().join("stdin")).unwrap(), expected);
    assert_eq!(
        fs::read_to_string(dir.path().join("password")).unwrap(),
        "rootpass"
    );
    let args = fs::read_to_string(dir.path().join("args")).unwrap();
    assert_eq!(
        args.lines().collect::<Vec<_>>(),
        ["--binary-mode", "--host=db.internal", "--port=3307", "--user=root"]
    );
}

#[tokio::test]
async fn client_failure_carries_its_stderr() {
    let dir = TempDir::new().unwrap();
    let loader = loader_with(
        dir.path(),
        "cat > /dev/null\necho 'ERROR 1064 (42000) at line 3: syntax error' >&2\nexit 1",
    );

    let err = loader.load(&target(), b"NOT SQL;\n").await.unwrap_err();

    match err {
        ImportError::Client {
            database,
            status,
            stderr,
            ..
        } => {
            assert_eq!(database, "app");
            assert_eq!(status.code(), Some(1));
            assert_eq!(stderr, "ERROR 1064 (42000) at line 3: syntax error");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn missing_client_is_a_spawn_error() {
    let dir = TempDir::new().unwrap();
    let loader = MySqlLoader::new(&ToolsConfig {
        mysql: dir.path().join("no-such-mysql").to_string_lossy().into_owned(),
        ..ToolsConfig::default()
    });

    let err = loader.load(&target(), b"SELECT 1;\n").await.unwrap_err();

    assert!(matches!(err, ImportError::Spawn { .. }));
}
