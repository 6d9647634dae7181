use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn tasks_file(&self) -> PathBuf {
        self.dir.path().join("task").join("tasks.json")
    }

    pub fn report_file(&self) -> PathBuf {
        self.dir.path().join("task").join("TaskProgressReport.md")
    }

    #[allow(dead_code)]
    pub fn write_config(&self, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join("wt.toml");
        fs::write(&path, contents)?;
        Ok(path)
    }
}

#[allow(dead_code)]
pub fn wt_cmd(dir: &TestDir) -> Command {
    let mut cmd = Command::cargo_bin("wt").expect("wt binary");
    cmd.current_dir(dir.path());
    cmd
}

/// Run a wt command with `--json` and return the parsed success envelope.
pub fn wt_json(dir: &TestDir, args: &[&str]) -> Value {
    let mut full: Vec<&str> = args.to_vec();
    full.push("--json");
    let output = wt_cmd(dir)
        .args(&full)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&output).expect("json envelope")
}

/// Create a task through the CLI and return its id.
#[allow(dead_code)]
pub fn new_task(dir: &TestDir, title: &str, extra: &[&str]) -> String {
    let mut args = vec!["new", title, "--description", "created by test"];
    args.extend_from_slice(extra);
    let value = wt_json(dir, &args);
    value["data"]["id"].as_str().expect("task id").to_string()
}
