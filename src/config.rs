//! Configuration loading and management
//!
//! Handles parsing of `wt.toml` configuration files. Both paths are
//! resolved relative to the data root when they are not absolute.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Name of the configuration file looked up in the data root
pub const CONFIG_FILE: &str = "wt.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path of the persisted task document
    #[serde(default = "default_tasks_path")]
    pub tasks_path: PathBuf,

    /// Path the progress report is written to
    #[serde(default = "default_report_path")]
    pub report_path: PathBuf,
}

fn default_tasks_path() -> PathBuf {
    PathBuf::from("task/tasks.json")
}

fn default_report_path() -> PathBuf {
    PathBuf::from("task/TaskProgressReport.md")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tasks_path: default_tasks_path(),
            report_path: default_report_path(),
        }
    }
}

impl Config {
    /// Load configuration from `wt.toml` in the given data root.
    ///
    /// A missing file yields the defaults; a present but malformed
    /// file is an error rather than a silent fallback.
    pub fn load(root: &Path) -> Result<Config> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Absolute path of the task document under the given root
    pub fn tasks_file(&self, root: &Path) -> PathBuf {
        resolve(root, &self.tasks_path)
    }

    /// Absolute path of the report output under the given root
    pub fn report_file(&self, root: &Path) -> PathBuf {
        resolve(root, &self.report_path)
    }
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().expect("tempdir");
        let config = Config::load(dir.path()).expect("load");
        assert_eq!(config.tasks_path, PathBuf::from("task/tasks.json"));
        assert_eq!(
            config.report_path,
            PathBuf::from("task/TaskProgressReport.md")
        );
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "tasks_path = \"data/work.json\"\n",
        )
        .expect("write config");
        let config = Config::load(dir.path()).expect("load");
        assert_eq!(config.tasks_path, PathBuf::from("data/work.json"));
        assert_eq!(
            config.report_path,
            PathBuf::from("task/TaskProgressReport.md")
        );
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().expect("tempdir");
        std::fs::write(dir.path().join(CONFIG_FILE), "tasks_path = [").expect("write config");
        assert!(Config::load(dir.path()).is_err());
    }

    #[test]
    fn relative_paths_resolve_under_root() {
        let config = Config::default();
        let root = Path::new("/data");
        assert_eq!(
            config.tasks_file(root),
            PathBuf::from("/data/task/tasks.json")
        );
    }
}
