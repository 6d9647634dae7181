//! Storage layer for wt
//!
//! One JSON document holds the whole collection:
//!
//! ```text
//! { "tasks": [ ... ] }
//! ```
//!
//! Every operation is a full read or a full overwrite; the store keeps
//! no index. Writes go through a temp file and rename so a crash never
//! leaves a half-written document behind.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::task::Task;

#[derive(Debug, Default, Serialize, Deserialize)]
struct TaskDocument {
    #[serde(default)]
    tasks: Vec<Task>,
}

/// Single source of truth for the task collection
#[derive(Debug, Clone)]
pub struct TaskStore {
    path: PathBuf,
}

impl TaskStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all tasks in storage (insertion) order.
    ///
    /// Seeds an empty document first if none exists yet.
    pub fn load(&self) -> Result<Vec<Task>> {
        self.ensure_document()?;
        let content = fs::read_to_string(&self.path).map_err(|source| Error::StorageRead {
            path: self.path.clone(),
            source,
        })?;
        let document: TaskDocument =
            serde_json::from_str(&content).map_err(|source| Error::StorageParse {
                path: self.path.clone(),
                source,
            })?;
        Ok(document.tasks)
    }

    /// Overwrite the whole document with the given collection.
    pub fn save(&self, tasks: Vec<Task>) -> Result<()> {
        let document = TaskDocument { tasks };
        let json = serde_json::to_string_pretty(&document)?;
        write_atomic(&self.path, json.as_bytes())
    }

    fn ensure_document(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        let json = serde_json::to_string_pretty(&TaskDocument::default())?;
        write_atomic(&self.path, json.as_bytes())
    }
}

/// Write data via temp file + rename, creating parent directories.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let write_err = |source: std::io::Error| Error::StorageWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
    }

    // Temp file lives in the same directory so the rename is atomic.
    let temp_path = path.with_extension("tmp");
    let mut file = File::create(&temp_path).map_err(write_err)?;
    file.write_all(data).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;
    fs::rename(&temp_path, path).map_err(write_err)?;

    Ok(())
}
