//! Wrapper around the external CodeQL CLI
//!
//! Database extraction and validation are delegated to the `codeql` binary;
//! this module only shells out and interprets exit status and output.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{QldbError, Result};

/// Environment variable overriding the `codeql` binary location
pub const CODEQL_PATH_ENV: &str = "QLDB_CODEQL_PATH";

/// Locate the CodeQL binary: `QLDB_CODEQL_PATH` if set and present, else
/// whatever `codeql` resolves to on PATH.
pub fn find_codeql_binary() -> PathBuf {
    if let Ok(path) = std::env::var(CODEQL_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            tracing::debug!("Using CodeQL from {}: {:?}", CODEQL_PATH_ENV, path);
            return path;
        }
    }

    tracing::debug!("Using CodeQL from system PATH");
    if cfg!(windows) {
        PathBuf::from("codeql.exe")
    } else {
        PathBuf::from("codeql")
    }
}

/// Handle to the external CodeQL CLI.
#[derive(Debug, Clone)]
pub struct CodeqlCli {
    binary: PathBuf,
}

impl CodeqlCli {
    pub fn new() -> Self {
        Self {
            binary: find_codeql_binary(),
        }
    }

    pub fn with_binary(binary: PathBuf) -> Self {
        Self { binary }
    }

    /// Run `codeql database create <args…> -- <dest>`.
    ///
    /// The arguments come straight from the CLI's passthrough section; the
    /// destination path is always appended after the `--` separator.
    pub fn create_database(&self, codeql_args: &[String], dest: &Path) -> Result<()> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("database").arg("create").args(codeql_args).arg("--").arg(dest);

        tracing::debug!("Executing {:?}", cmd);
        let output = cmd
            .output()
            .map_err(|e| QldbError::io(&self.binary, e))?;

        if !output.status.success() {
            return Err(QldbError::Validation {
                output: combined_output(&output),
            });
        }
        Ok(())
    }

    /// Run `codeql resolve database <db_path>` and parse its JSON output.
    ///
    /// A non-zero exit or unparsable output means the directory is not a
    /// usable CodeQL database.
    pub fn validate_database(&self, db_path: &Path) -> Result<serde_json::Value> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("resolve").arg("database").arg(db_path);

        tracing::debug!("Executing {:?}", cmd);
        let output = cmd
            .output()
            .map_err(|e| QldbError::io(&self.binary, e))?;

        if !output.status.success() {
            return Err(QldbError::Validation {
                output: combined_output(&output),
            });
        }

        serde_json::from_slice(&output.stdout).map_err(|_| QldbError::Validation {
            output: combined_output(&output),
        })
    }
}

impl Default for CodeqlCli {
    fn default() -> Self {
        Self::new()
    }
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_is_an_io_error() {
        let cli = CodeqlCli::with_binary(PathBuf::from("/nonexistent/codeql"));
        let result = cli.validate_database(Path::new("/tmp/db"));
        assert!(matches!(result, Err(QldbError::Io { .. })));
    }
}
