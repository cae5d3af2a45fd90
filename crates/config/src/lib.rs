//! Layered configuration for bookshelf.
//!
//! Sources are merged in order, later sources overriding earlier ones:
//! 1. Built-in defaults.
//! 2. `bookshelf.toml`, `bookshelf.yaml` and `bookshelf.json` in the platform
//!    configuration directory, if present.
//! 3. An explicitly given configuration file, which must exist.
//! 4. `BOOKSHELF_*` environment variables, with `__` separating nested keys
//!    (`BOOKSHELF_INGEST__WORKERS=4`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::instrument;

const APPLICATION: &str = "bookshelf";
const ENV_PREFIX: &str = "BOOKSHELF_";
const DATABASE_FILENAME: &str = "booksdb.sqlite";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub ingest: IngestConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Location of the SQLite catalog; created on first use.
    pub path: PathBuf,
}
impl Default for DatabaseConfig {
    fn default() -> Self {
        let path = project_dirs()
            .map(|dirs| dirs.data_dir().join(DATABASE_FILENAME))
            .unwrap_or_else(|| PathBuf::from(DATABASE_FILENAME));
        Self { path }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Directory to scan.
    pub root: PathBuf,
    /// Capacity of the queue between the walker and the parse workers.
    pub queue_capacity: usize,
    /// Capacity of the queue between the parse workers and the database writer.
    pub book_queue_capacity: usize,
    pub workers: usize,
}
impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            queue_capacity: 50,
            book_queue_capacity: 50,
            workers: 16,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", APPLICATION)
}

impl Config {
    /// Load the configuration from every source, optionally including an
    /// explicit configuration file.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let dirs = project_dirs();
        Self::load_from(dirs.as_ref().map(ProjectDirs::config_dir), explicit)
    }

    #[instrument(level = "debug")]
    fn load_from(config_dir: Option<&Path>, explicit: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(dir) = config_dir {
            figment = figment
                .merge(Toml::file(dir.join(format!("{APPLICATION}.toml"))))
                .merge(Yaml::file(dir.join(format!("{APPLICATION}.yaml"))))
                .merge(Json::file(dir.join(format!("{APPLICATION}.json"))));
        }
        if let Some(path) = explicit {
            if !path.is_file() {
                exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
            }
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => figment.merge(Toml::file(path)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
            };
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        figment.extract().or_raise(|| ErrorKind::Invalid)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        let ingest = &self.ingest;
        if ingest.workers == 0 {
            exn::bail!(ErrorKind::Zero("ingest.workers"));
        }
        if ingest.queue_capacity == 0 {
            exn::bail!(ErrorKind::Zero("ingest.queue_capacity"));
        }
        if ingest.book_queue_capacity == 0 {
            exn::bail!(ErrorKind::Zero("ingest.book_queue_capacity"));
        }
        Ok(())
    }
}
