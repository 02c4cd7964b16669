//! Catalog path conventions
//!
//! Maps a repository identifier, a language and a commit fingerprint onto the
//! on-disk layout `~/codeql-dbs/github.com/<owner>/<repo>/<language>-<shortsha>.zip`
//! and parses entry filenames back into their constituent fields.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{QldbError, Result};

/// Directory under the user's home that holds all catalogs
pub const ROOT_DIR: &str = "codeql-dbs";

/// Hosting-service namespace under the catalog root
pub const VCS_HOST: &str = "github.com";

/// Root folder prefix for every member of a packed archive
pub const ARCHIVE_PREFIX: &str = "codeql-db";

/// Configuration file carried inside every CodeQL database
pub const CONFIG_FILENAME: &str = "codeql-database.yml";

/// Commit fingerprints are abbreviated to this many characters in filenames
pub const SHORT_SHA_LEN: usize = 8;

/// A repository "name with owner", e.g. `rails/rails`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    owner: String,
    name: String,
}

impl RepoId {
    /// Parse an `owner/name` identifier. Both halves must be non-empty and
    /// the separator must appear exactly once.
    pub fn parse(nwo: &str) -> Result<Self> {
        let mut parts = nwo.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(QldbError::InvalidNwo {
                nwo: nwo.to_string(),
            }),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoId {
    type Err = QldbError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// The catalog root for the configured hosting service:
/// `~/codeql-dbs/github.com`.
pub fn catalog_root() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or(QldbError::NoHomeDir)?;
    Ok(home.join(ROOT_DIR).join(VCS_HOST))
}

/// Directory holding every database installed for one repository.
pub fn repo_path(catalog_root: &Path, repo: &RepoId) -> PathBuf {
    catalog_root.join(repo.owner()).join(repo.name())
}

/// Abbreviate a commit fingerprint for use in filenames.
pub fn short_sha(sha: &str) -> &str {
    &sha[..SHORT_SHA_LEN.min(sha.len())]
}

/// Archive filename for a database: `<language>-<shortsha>.zip`.
pub fn entry_filename(language: &str, sha: &str) -> String {
    format!("{language}-{}.zip", short_sha(sha))
}

/// Metadata sidecar filename paired with [`entry_filename`].
pub fn sidecar_filename(language: &str, sha: &str) -> String {
    format!("{language}-{}.json", short_sha(sha))
}

/// Split an entry filename stem back into `(language, short_sha)`.
///
/// The split on `-` must yield exactly two non-empty components; a language
/// name containing `-` does not fit the convention and is rejected.
pub fn parse_entry_name(stem: &str) -> Result<(String, String)> {
    let parts: Vec<&str> = stem.split('-').collect();
    match parts.as_slice() {
        [language, sha] if !language.is_empty() && !sha.is_empty() => {
            Ok((language.to_string(), sha.to_string()))
        }
        _ => Err(QldbError::InvalidEntryName {
            name: stem.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_valid_nwo() {
        let repo = RepoId::parse("rails/rails").unwrap();
        assert_eq!(repo.owner(), "rails");
        assert_eq!(repo.name(), "rails");
        assert_eq!(repo.to_string(), "rails/rails");
    }

    #[test]
    fn parse_invalid_nwo() {
        for nwo in ["rails", "a/b/c", "/rails", "rails/", ""] {
            let result = RepoId::parse(nwo);
            assert!(matches!(result, Err(QldbError::InvalidNwo { .. })), "{nwo}");
        }
    }

    #[test]
    fn entry_filename_truncates_sha() {
        assert_eq!(
            entry_filename("javascript", "abcdef1234567890"),
            "javascript-abcdef12.zip"
        );
        assert_eq!(
            sidecar_filename("javascript", "abcdef1234567890"),
            "javascript-abcdef12.json"
        );
    }

    #[test]
    fn entry_filename_keeps_short_fingerprints() {
        assert_eq!(entry_filename("python", "abc"), "python-abc.zip");
    }

    #[test]
    fn parse_entry_name_roundtrip() {
        let (language, sha) = parse_entry_name("javascript-abcdef12").unwrap();
        assert_eq!(language, "javascript");
        assert_eq!(sha, "abcdef12");
    }

    #[test]
    fn parse_entry_name_rejects_extra_separators() {
        let result = parse_entry_name("too-many-parts-here");
        assert!(matches!(result, Err(QldbError::InvalidEntryName { .. })));
    }

    #[test]
    fn parse_entry_name_rejects_empty_components() {
        assert!(parse_entry_name("-abcdef12").is_err());
        assert!(parse_entry_name("python-").is_err());
        assert!(parse_entry_name("python").is_err());
    }

    #[test]
    fn repo_path_is_owner_then_name() {
        let repo = RepoId::parse("octo/hello").unwrap();
        let path = repo_path(Path::new("/tmp/dbs"), &repo);
        assert_eq!(path, Path::new("/tmp/dbs/octo/hello"));
    }
}
