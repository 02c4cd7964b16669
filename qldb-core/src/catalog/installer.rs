//! Database installation into the local catalog
//!
//! Handles validating, packing and copying databases into the canonical
//! `<catalog>/<owner>/<repo>/<language>-<shortsha>.zip` location, with a
//! `.json` metadata sidecar next to each archive. Installation is idempotent:
//! an entry that already exists for the same fingerprint is reported and left
//! untouched, never overwritten.

use std::fs;
use std::path::{Path, PathBuf};

use crate::archive;
use crate::codeql::CodeqlCli;
use crate::error::{QldbError, Result};
use crate::github::{CodeScanningDatabase, GitHubClient};
use crate::layout::{self, RepoId};
use crate::metadata::DatabaseMetadata;

/// Validation seam for the external analysis engine.
///
/// The default implementation shells out to `codeql resolve database`; tests
/// substitute a stub so installation can run without the CLI present.
pub trait DatabaseValidator: Send + Sync {
    fn validate(&self, db_path: &Path) -> Result<()>;
}

impl DatabaseValidator for CodeqlCli {
    fn validate(&self, db_path: &Path) -> Result<()> {
        self.validate_database(db_path).map(|_| ())
    }
}

/// What an installation did, for the CLI to render.
#[derive(Debug)]
pub struct InstallOutcome {
    pub nwo: String,
    pub language: String,
    pub commit_sha: String,
    pub short_sha: String,
    /// Where the archive lives in the catalog
    pub archive_path: PathBuf,
    /// Where the metadata sidecar lives
    pub sidecar_path: PathBuf,
    /// False when an archive for the same fingerprint was already present
    pub freshly_installed: bool,
    /// False when a sidecar for the same fingerprint was already present
    pub sidecar_written: bool,
}

/// Installer for CodeQL database archives.
pub struct Installer {
    catalog_root: PathBuf,
    validator: Box<dyn DatabaseValidator>,
}

impl Installer {
    /// Installer rooted at the default catalog location.
    pub fn new() -> Result<Self> {
        Ok(Self::with_catalog_root(layout::catalog_root()?))
    }

    /// Installer rooted at a custom catalog location.
    pub fn with_catalog_root(catalog_root: PathBuf) -> Self {
        Self {
            catalog_root,
            validator: Box::new(CodeqlCli::new()),
        }
    }

    /// Substitute the database validator (tests).
    pub fn with_validator(mut self, validator: Box<dyn DatabaseValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn catalog_root(&self) -> &Path {
        &self.catalog_root
    }

    /// Install a database from a local path, either an unpacked directory or
    /// a `.zip` archive.
    ///
    /// Directories are validated and then packed; archives are unpacked into
    /// scratch space and validated. Either way the archive bytes then flow
    /// through the same idempotent copy as downloads. With `remove_source`
    /// the original path is deleted after a successful install.
    pub fn install(
        &self,
        repo: &RepoId,
        db_path: &Path,
        remove_source: bool,
    ) -> Result<InstallOutcome> {
        let info = fs::metadata(db_path).map_err(|_| QldbError::DatabaseNotFound {
            path: db_path.to_path_buf(),
        })?;

        // Scratch space must outlive the copy below.
        let scratch = tempfile::tempdir().map_err(|e| QldbError::io(db_path, e))?;

        let zip_path: PathBuf = if info.is_dir() {
            tracing::info!("Validating database at {}", db_path.display());
            self.validator.validate(db_path)?;

            let packed = scratch.path().join("qldb.zip");
            tracing::info!("Compressing database into {}", packed.display());
            archive::pack(db_path, &packed)?;
            packed
        } else {
            if db_path.extension().map(|e| e != "zip").unwrap_or(true) {
                return Err(QldbError::NotAZip {
                    path: db_path.to_path_buf(),
                });
            }

            let unpacked = scratch.path().join("unpacked");
            archive::unpack(db_path, &unpacked)?;
            let db_root = single_subdirectory(&unpacked)?.unwrap_or(unpacked);
            tracing::info!("Validating database at {}", db_root.display());
            self.validator.validate(&db_root)?;

            db_path.to_path_buf()
        };

        let bytes = fs::read(&zip_path).map_err(|e| QldbError::io(&zip_path, e))?;
        let outcome = self.install_bytes(repo, &bytes)?;

        if remove_source {
            tracing::info!("Removing database from {}", db_path.display());
            if info.is_dir() {
                fs::remove_dir_all(db_path).map_err(|e| QldbError::io(db_path, e))?;
            } else {
                fs::remove_file(db_path).map_err(|e| QldbError::io(db_path, e))?;
            }
        }

        Ok(outcome)
    }

    /// Create a fresh database with the CodeQL CLI, then install it.
    ///
    /// `codeql_args` is the passthrough section of the command line, e.g.
    /// `["--source-root", "/path/to/src", "--language", "javascript"]`.
    pub fn create(
        &self,
        codeql: &CodeqlCli,
        repo: &RepoId,
        codeql_args: &[String],
    ) -> Result<InstallOutcome> {
        let scratch = tempfile::tempdir().map_err(|e| QldbError::io(&self.catalog_root, e))?;
        let dest = scratch.path().join(layout::ARCHIVE_PREFIX);

        codeql.create_database(codeql_args, &dest)?;
        self.install(repo, &dest, false)
    }

    /// Download the databases code scanning has for a repository and install
    /// each one.
    ///
    /// `databases` is the listing the caller already fetched; `selector` is a
    /// language name, or `all` to take every listed database. A failure for
    /// one language is logged and the loop continues with the next language.
    pub async fn download(
        &self,
        client: &GitHubClient,
        repo: &RepoId,
        databases: &[CodeScanningDatabase],
        selector: &str,
    ) -> Result<Vec<InstallOutcome>> {
        let mut outcomes = Vec::new();
        for db in databases {
            if selector != "all" && db.language != selector {
                continue;
            }

            tracing::info!("Downloading '{}' database for {}", db.language, repo);
            match self.download_one(client, repo, &db.language).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    tracing::warn!(
                        "Failed to download '{}' database for {}: {}",
                        db.language,
                        repo,
                        e
                    );
                }
            }
        }
        Ok(outcomes)
    }

    async fn download_one(
        &self,
        client: &GitHubClient,
        repo: &RepoId,
        language: &str,
    ) -> Result<InstallOutcome> {
        let bytes = client.download_database(repo, language).await?;
        self.install_bytes(repo, &bytes)
    }

    /// The shared tail of every installation: extract metadata, stamp
    /// provenance, derive the catalog location and copy-if-absent.
    pub fn install_bytes(&self, repo: &RepoId, bytes: &[u8]) -> Result<InstallOutcome> {
        let mut metadata = DatabaseMetadata::from_zip_bytes(bytes)?;
        metadata.set_provenance(&repo.to_string());

        let language = metadata.primary_language()?.to_string();
        let commit_sha = metadata.commit_sha()?.to_string();
        let short_sha = layout::short_sha(&commit_sha).to_string();

        let repo_dir = layout::repo_path(&self.catalog_root, repo);
        let archive_path = repo_dir.join(layout::entry_filename(&language, &commit_sha));
        let sidecar_path = repo_dir.join(layout::sidecar_filename(&language, &commit_sha));

        let freshly_installed = !archive_path.exists();
        if freshly_installed {
            fs::create_dir_all(&repo_dir).map_err(|e| QldbError::io(&repo_dir, e))?;
            fs::write(&archive_path, bytes).map_err(|e| QldbError::io(&archive_path, e))?;
            tracing::info!("Installed database to {}", archive_path.display());
        } else {
            tracing::info!(
                "Database already installed for commit {} at {}",
                short_sha,
                archive_path.display()
            );
        }

        let sidecar_written = !sidecar_path.exists();
        if sidecar_written {
            fs::write(&sidecar_path, metadata.to_json_pretty()?)
                .map_err(|e| QldbError::io(&sidecar_path, e))?;
        } else {
            tracing::info!(
                "Database metadata already exists for commit {} at {}",
                short_sha,
                sidecar_path.display()
            );
        }

        Ok(InstallOutcome {
            nwo: repo.to_string(),
            language,
            commit_sha,
            short_sha,
            archive_path,
            sidecar_path,
            freshly_installed,
            sidecar_written,
        })
    }
}

/// When an unpacked archive holds exactly one directory and nothing else,
/// that directory is the database root.
fn single_subdirectory(dir: &Path) -> Result<Option<PathBuf>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| QldbError::io(dir, e))? {
        let entry = entry.map_err(|e| QldbError::io(dir, e))?;
        entries.push(entry.path());
    }

    match entries.as_slice() {
        [only] if only.is_dir() => Ok(Some(only.clone())),
        _ => Ok(None),
    }
}
