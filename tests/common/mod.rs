use assert_cmd::{Command, cargo::cargo_bin_cmd};
use std::fs;
use std::path::{Path, PathBuf};

pub fn zktree_cmd() -> Command {
    let mut cmd = cargo_bin_cmd!("zktree");
    // Keep the caller's environment from changing log output.
    cmd.env_remove("RUST_LOG");
    cmd
}

// Each integration test file is compiled as its own crate, and not every
// crate needs a config file.
#[allow(dead_code)]
pub fn write_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("zktree.toml");
    fs::write(&path, content).unwrap();
    path
}
