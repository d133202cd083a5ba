#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// An isolated HOME, remote root and database for one test.
pub struct TestEnv {
    _root: TempDir,
    pub home: PathBuf,
    pub remote: PathBuf,
    pub db: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("tempdir");
        let home = root.path().join("home");
        let remote = root.path().join("remote");
        let db = root.path().join("timeblocks.sqlite");
        std::fs::create_dir_all(&home).expect("home dir");
        Self {
            _root: root,
            home,
            remote,
            db,
        }
    }

    /// A second database living in the same HOME and remote root, as if the
    /// same account were used on another device.
    pub fn other_db(&self, name: &str) -> PathBuf {
        self.db.with_file_name(name)
    }

    pub fn cmd(&self) -> Command {
        self.cmd_on(&self.db)
    }

    pub fn cmd_on(&self, db: &Path) -> Command {
        let mut cmd = cargo_bin_cmd!("timeblocks");
        cmd.env("HOME", &self.home)
            .env("APPDATA", &self.home)
            .env_remove("TIMEBLOCKS_LOG")
            .arg("--db")
            .arg(db)
            .arg("--remote")
            .arg(&self.remote);
        cmd
    }

    pub fn init(&self) {
        self.init_on(&self.db);
    }

    pub fn init_on(&self, db: &Path) {
        self.cmd_on(db).args(["--test", "init"]).assert().success();
    }

    /// Plan a block and return the short id printed by the CLI.
    pub fn add_block(&self, title: &str, date: &str, start: &str, end: &str) -> String {
        let out = self
            .cmd()
            .args(["block", "add", title, "--date", date, "--start", start, "--end", end])
            .assert()
            .success();
        short_id(&stdout(&out))
    }

    pub fn sign_up(&self, email: &str) {
        self.cmd()
            .args(["auth", "sign-up", email, "--password", "secret123"])
            .assert()
            .success();
    }
}

pub fn stdout(assert: &assert_cmd::assert::Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stdout).to_string()
}

/// `... [abcd1234]` → `abcd1234`
pub fn short_id(output: &str) -> String {
    let start = output.rfind('[').expect("id opening bracket") + 1;
    let end = output[start..].find(']').expect("id closing bracket") + start;
    output[start..end].to_string()
}
