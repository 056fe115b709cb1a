//! Record files shared by the unit tests.

pub mod fixtures;

use std::fs;
use std::path::{Path, PathBuf};

/// Writes `text` to `dir/fort.10` and returns the path.
pub fn write_fixture(dir: &Path, text: &str) -> PathBuf {
    let path = dir.join("fort.10");
    fs::write(&path, text).expect("failed to write fixture");
    path
}
