#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

/// A small account/product table covering two industries. Headers are
/// intentionally messy to exercise normalization.
pub const BAKERY_CSV: &str = "\
account_id,Account  Name,PRIMARY SNI CODE,primary sni description,Secondary Sni Code,Secondary Sni Description,product_name
A1,Alfa Bageri,10710,Bagerier,,,X
A2,Beta Bageri,10710,Bagerier,47110,Livsmedelshandel,X
A2,Beta Bageri,10710,Bagerier,47110,Livsmedelshandel,Y
A3,Gamma Bageri,10710,Bagerier,,,Z
B1,Halla Handel,47110,Livsmedelshandel,,,X
";

pub fn write_bakery_csv(workspace: &TestWorkspace) -> PathBuf {
    workspace.write("accounts.csv", BAKERY_CSV)
}
