use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory, relative to the root, that holds the database files.
pub const DEFAULT_SUB_PATH: &str = "sql_related/db";

fn default_sub_path() -> PathBuf {
    PathBuf::from(DEFAULT_SUB_PATH)
}

/// Location of the database file: `root_dir / sub_path / file_name`.
///
/// The directories are an external convention; the gateway never creates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub root_dir: PathBuf,
    #[serde(default = "default_sub_path")]
    pub sub_path: PathBuf,
    pub file_name: String,
}

impl GatewayConfig {
    /// Create a config using the default sub path
    pub fn new(root_dir: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            root_dir: root_dir.into(),
            sub_path: default_sub_path(),
            file_name: file_name.into(),
        }
    }

    pub fn with_sub_path(mut self, sub_path: impl Into<PathBuf>) -> Self {
        self.sub_path = sub_path.into();
        self
    }

    /// Full path of the database file
    pub fn db_path(&self) -> PathBuf {
        self.root_dir.join(&self.sub_path).join(&self.file_name)
    }
}

/// What a concrete table supplies to the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub db_path: PathBuf,
    pub table_name: String,
    pub creation_statement: String,
}

impl TableSpec {
    pub fn new(
        db_path: impl AsRef<Path>,
        table_name: impl Into<String>,
        creation_statement: impl Into<String>,
    ) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
            table_name: table_name.into(),
            creation_statement: creation_statement.into(),
        }
    }

    pub fn from_config(
        config: &GatewayConfig,
        table_name: impl Into<String>,
        creation_statement: impl Into<String>,
    ) -> Self {
        Self::new(config.db_path(), table_name, creation_statement)
    }
}
