use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use pfstore_core::StorageError;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| StorageError::Config(format!("read config: {e}")))?;
        toml::from_str(&contents).map_err(|e| StorageError::Config(format!("parse config: {e}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseKind {
    Mysql,
    Sqlite,
}

impl FromStr for DatabaseKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mysql" => Ok(DatabaseKind::Mysql),
            "sqlite" => Ok(DatabaseKind::Sqlite),
            other => Err(StorageError::Config(format!(
                "invalid database kind '{other}' (expected 'mysql' or 'sqlite')"
            ))),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub kind: DatabaseKind,

    /// Host (optionally `host:port`) of the MySQL server.
    #[serde(default)]
    pub address: String,

    /// Database name on the MySQL server.
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Base data directory; the SQLite file `database.db` lives here.
    /// `":memory:"` selects a private in-memory database.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

impl DatabaseConfig {
    pub fn sqlite(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            kind: DatabaseKind::Sqlite,
            address: String::new(),
            name: String::new(),
            username: String::new(),
            password: String::new(),
            data_dir: data_dir.into(),
        }
    }

    pub fn mysql(
        address: impl Into<String>,
        name: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            kind: DatabaseKind::Mysql,
            address: address.into(),
            name: name.into(),
            username: username.into(),
            password: password.into(),
            data_dir: default_data_dir(),
        }
    }

    pub fn sqlite_path(&self) -> String {
        if self.data_dir == Path::new(":memory:") {
            ":memory:".to_string()
        } else {
            self.data_dir
                .join("database.db")
                .to_string_lossy()
                .into_owned()
        }
    }
}
