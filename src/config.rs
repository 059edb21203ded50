use crate::error::ConfigError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

pub const ENV_PREFIX: &str = "RS_MYSQL_";
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Immutable runtime configuration, handed to each step's constructor.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub basic: BasicConfig,
    pub import: ImportConfig,
    pub mysql: MysqlConfig,
    pub paths: PathsConfig,
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicConfig {
    pub loglevel: String,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            loglevel: "info".to_string(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub repository: String,
    pub revision: String,
    pub private_key: Option<String>,
    /// Path of the dump inside the checkout.
    pub dump_file: String,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MysqlConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub root_password: String,
}

impl Default for MysqlConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            username: "root".to_string(),
            root_password: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub key_file: PathBuf,
    pub ssh_wrapper: PathBuf,
    pub destination_dir: PathBuf,
    pub sentinel_dir: PathBuf,
    pub sentinel_prefix: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            key_file: PathBuf::from("/tmp/git_key"),
            ssh_wrapper: PathBuf::from("/tmp/git_ssh.sh"),
            destination_dir: PathBuf::from("/tmp/git_download"),
            sentinel_dir: PathBuf::from("/var/lib/rightscale"),
            sentinel_prefix: "rs-mysql".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub git: String,
    /// MySQL command-line client that dumps are piped into.
    pub mysql: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            git: "git".to_string(),
            mysql: "mysql".to_string(),
        }
    }
}

impl Config {
    /// Defaults, then the TOML file (if present), then `RS_MYSQL_*` env vars.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::figment(path).extract().map_err(ConfigError::from)
    }

    pub fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Settings every dump import needs before anything touches disk.
    pub fn validate_import(&self) -> Result<(), ConfigError> {
        self.validate_mysql()?;
        if self.import.repository.trim().is_empty() {
            return Err(ConfigError::Missing("import.repository"));
        }
        if self.import.revision.trim().is_empty() {
            return Err(ConfigError::Missing("import.revision"));
        }
        if self.import.dump_file.trim().is_empty() {
            return Err(ConfigError::Missing("import.dump_file"));
        }
        let inside_checkout = Path::new(&self.import.dump_file)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !inside_checkout {
            return Err(ConfigError::DumpFileOutsideCheckout(
                self.import.dump_file.clone(),
            ));
        }
        Ok(())
    }

    pub fn validate_mysql(&self) -> Result<(), ConfigError> {
        if self.mysql.root_password.is_empty() {
            return Err(ConfigError::Missing("mysql.root_password"));
        }
        Ok(())
    }

    /// Blank private keys count as "not configured".
    pub fn private_key(&self) -> Option<&str> {
        self.import
            .private_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
    }
}

const REDACTED: &str = "<redacted>";

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("basic", &self.basic)
            .field("import", &self.import)
            .field("mysql", &self.mysql)
            .field("paths", &self.paths)
            .field("tools", &self.tools)
            .finish()
    }
}

impl fmt::Debug for ImportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportConfig")
            .field("repository", &self.repository)
            .field("revision", &self.revision)
            .field("private_key", &self.private_key.as_ref().map(|_| REDACTED))
            .field("dump_file", &self.dump_file)
            .finish()
    }
}

impl fmt::Debug for MysqlConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MysqlConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("root_password", &REDACTED)
            .finish()
    }
}
