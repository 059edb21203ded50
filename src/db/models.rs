use crate::config::MysqlConfig;
use std::fmt;

/// Where and as whom to connect.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl From<&MysqlConfig> for ConnectionInfo {
    fn from(cfg: &MysqlConfig) -> Self {
        Self {
            host: cfg.host.clone(),
            port: cfg.port,
            username: cfg.username.clone(),
            password: cfg.root_password.clone(),
        }
    }
}

impl fmt::Debug for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionInfo")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseTarget {
    pub connection: ConnectionInfo,
    pub database: String,
}

impl DatabaseTarget {
    pub fn new(connection: ConnectionInfo, database: impl Into<String>) -> Self {
        Self {
            connection,
            database: database.into(),
        }
    }
}
