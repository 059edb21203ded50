use super::ArtifactLoader;
use super::models::{ConnectionInfo, DatabaseTarget};
use super::schema::{self, MASTER_RESET_DATABASE, RESET_MASTER};
use crate::config::ToolsConfig;
use crate::error::{ImportError, ProvisionError};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{Connection, Executor};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

/// The client reads the password from here, keeping it off the command line.
pub const MYSQL_PWD_ENV: &str = "MYSQL_PWD";

/// Pipes dumps into the `mysql` client so the server receives the bytes unmodified.
#[derive(Debug, Clone)]
pub struct MySqlLoader {
    client: String,
}

impl MySqlLoader {
    pub fn new(tools: &ToolsConfig) -> Self {
        Self {
            client: tools.mysql.clone(),
        }
    }

    pub fn command(&self, conn: &ConnectionInfo) -> Command {
        let mut cmd = Command::new(&self.client);
        cmd.arg("--binary-mode")
            .arg(format!("--host={}", conn.host))
            .arg(format!("--port={}", conn.port))
            .arg(format!("--user={}", conn.username))
            .env(MYSQL_PWD_ENV, &conn.password)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl ArtifactLoader for MySqlLoader {
    async fn load(&self, target: &DatabaseTarget, sql: &[u8]) -> Result<(), ImportError> {
        let database = target.database.as_str();
        let mut child = self
            .command(&target.connection)
            .spawn()
            .map_err(|source| ImportError::Spawn {
                program: self.client.clone(),
                source,
            })?;
        debug!(
            host = %target.connection.host,
            database,
            "streaming dump into mysql client"
        );

        let stdin = child.stdin.take();
        let preamble = schema::import_preamble(database);
        let feed = async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(preamble.as_bytes()).await?;
                stdin.write_all(sql).await?;
                // Closing stdin is what lets the client finish.
                stdin.shutdown().await?;
            }
            Ok::<(), std::io::Error>(())
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());

        let output = output.map_err(|source| ImportError::Spawn {
            program: self.client.clone(),
            source,
        })?;
        // A client that died early also breaks the pipe; its stderr says why.
        if !output.status.success() {
            return Err(ImportError::Client {
                program: self.client.clone(),
                database: database.to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        fed.map_err(|source| ImportError::Stdin {
            database: database.to_string(),
            source,
        })?;

        info!(database, bytes = sql.len(), "dump loaded");
        Ok(())
    }
}

fn connect_options(conn: &ConnectionInfo) -> MySqlConnectOptions {
    MySqlConnectOptions::new()
        .host(&conn.host)
        .port(conn.port)
        .username(&conn.username)
        .password(&conn.password)
}

/// Clear binary logs written during installation so replicas start from a clean master.
pub async fn reset_master(conn: &ConnectionInfo) -> Result<(), ProvisionError> {
    let opts = connect_options(conn).database(MASTER_RESET_DATABASE);
    let mut c = MySqlConnection::connect_with(&opts).await?;
    c.execute(sqlx::raw_sql(RESET_MASTER)).await?;
    info!(host = %conn.host, "binary logs reset");
    c.close().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MysqlConfig;
    use std::ffi::OsStr;

    fn assert_send<T: Send>(_: &T) {}

    #[test]
    fn load_future_is_send() {
        let loader = MySqlLoader::new(&ToolsConfig::default());
        let target = DatabaseTarget::new(ConnectionInfo::from(&MysqlConfig::default()), "app");
        let fut = loader.load(&target, b"SELECT 1;\n");
        assert_send(&fut);
    }

    #[test]
    fn client_gets_password_from_env_not_argv() {
        let conn = ConnectionInfo {
            host: "db.internal".to_string(),
            port: 3307,
            username: "root".to_string(),
            password: "s3cret".to_string(),
        };
        let cmd = MySqlLoader::new(&ToolsConfig::default()).command(&conn);
        let inner = cmd.as_std();

        assert_eq!(inner.get_program(), OsStr::new("mysql"));
        let args: Vec<_> = inner.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            ["--binary-mode", "--host=db.internal", "--port=3307", "--user=root"]
        );
        assert!(args.iter().all(|a| !a.contains("s3cret")));
        assert!(
            inner.get_envs()
                .any(|(k, v)| k == OsStr::new(MYSQL_PWD_ENV) && v == Some(OsStr::new("s3cret")))
        );
    }

    #[tokio::test]
    async fn unreachable_server_fails_as_master_reset() {
        let conn = ConnectionInfo {
            host: "127.0.0.1".to_string(),
            port: 1,
            username: "root".to_string(),
            password: "pw".to_string(),
        };
        let err = reset_master(&conn).await.unwrap_err();
        assert!(matches!(err, ProvisionError::ResetMaster(_)));
    }
}
