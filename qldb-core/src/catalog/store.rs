//! Catalog queries: list and info
//!
//! Walks the `<catalog>/<owner>/<repo>` tree, reverse-parses entry filenames
//! through the path convention, and optionally resolves fingerprints to
//! commit metadata through the GitHub API.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{QldbError, Result};
use crate::github::GitHubClient;
use crate::layout::{self, RepoId};

/// Filters for [`list_entries`].
#[derive(Debug, Default, Clone)]
pub struct ListFilter {
    /// Case-insensitive substring match against the full entry path
    pub nwo: Option<String>,
    /// Exact language, matched against the `<language>-` filename prefix
    pub language: Option<String>,
}

/// One resolved catalog entry, as rendered by `info`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryInfo {
    pub commit_sha: String,
    pub committed_date: String,
    pub language: String,
    pub path: PathBuf,
}

/// Walk the whole catalog and return every database entry, filtered.
///
/// Entries are `.zip` archives or directories directly under a
/// `<owner>/<repo>` directory. A missing catalog root is an empty catalog,
/// not an error. Results are sorted for stable output.
pub fn list_entries(catalog_root: &Path, filter: &ListFilter) -> Result<Vec<PathBuf>> {
    let mut results = Vec::new();
    if !catalog_root.exists() {
        return Ok(results);
    }

    for owner in read_dirs(catalog_root)? {
        for repo in read_dirs(&owner)? {
            results.extend(database_entries(&repo)?);
        }
    }

    if let Some(language) = &filter.language {
        let prefix = format!("{language}-");
        results.retain(|path| entry_stem(path).is_some_and(|stem| stem.starts_with(&prefix)));
    }

    if let Some(nwo) = &filter.nwo {
        let needle = nwo.to_lowercase();
        results.retain(|path| path.to_string_lossy().to_lowercase().contains(&needle));
    }

    results.sort();
    Ok(results)
}

/// Resolve every entry of one repository, optionally filtered by language.
pub async fn repo_info(
    client: &GitHubClient,
    catalog_root: &Path,
    repo: &RepoId,
    language: Option<&str>,
) -> Result<Vec<EntryInfo>> {
    let repo_dir = layout::repo_path(catalog_root, repo);

    let mut entries = database_entries(&repo_dir)?;
    if let Some(language) = language {
        let prefix = format!("{language}-");
        entries.retain(|path| entry_stem(path).is_some_and(|stem| stem.starts_with(&prefix)));
    }
    entries.sort();

    let mut results = Vec::with_capacity(entries.len());
    for path in entries {
        results.push(entry_info(client, &path).await?);
    }
    Ok(results)
}

/// Resolve a single entry path: parse its filename back into language and
/// fingerprint, recover the repository from the two directories above it,
/// and look the fingerprint up through the commits API.
pub async fn entry_info(client: &GitHubClient, path: &Path) -> Result<EntryInfo> {
    let stem = entry_stem(path).ok_or_else(|| QldbError::NotAZip {
        path: path.to_path_buf(),
    })?;
    let (language, short_sha) = layout::parse_entry_name(&stem)?;

    let repo = repo_from_entry_path(path)?;
    let commit = client.commit_info(&repo, &short_sha).await?;

    Ok(EntryInfo {
        commit_sha: commit.sha,
        committed_date: commit.committed_date.to_rfc3339(),
        language,
        path: path.to_path_buf(),
    })
}

/// The filename stem carrying the `<language>-<shortsha>` convention:
/// the file stem for `.zip` archives, the directory name otherwise.
fn entry_stem(path: &Path) -> Option<String> {
    if path.is_dir() {
        path.file_name().map(|n| n.to_string_lossy().into_owned())
    } else if path.extension().is_some_and(|e| e == "zip") {
        path.file_stem().map(|n| n.to_string_lossy().into_owned())
    } else {
        None
    }
}

/// Recover `owner/name` from `<catalog>/<owner>/<name>/<entry>`.
fn repo_from_entry_path(path: &Path) -> Result<RepoId> {
    let invalid = || QldbError::InvalidNwo {
        nwo: path.to_string_lossy().into_owned(),
    };

    let repo_dir = path.parent().ok_or_else(invalid)?;
    let name = repo_dir.file_name().ok_or_else(invalid)?;
    let owner = repo_dir
        .parent()
        .and_then(|p| p.file_name())
        .ok_or_else(invalid)?;

    RepoId::parse(&format!(
        "{}/{}",
        owner.to_string_lossy(),
        name.to_string_lossy()
    ))
}

/// Database entries directly under one repository directory: `.zip` archives
/// and unpacked database directories. Sidecars and other files are skipped.
fn database_entries(repo_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    if !repo_dir.exists() {
        return Ok(entries);
    }

    for entry in fs::read_dir(repo_dir).map_err(|e| QldbError::io(repo_dir, e))? {
        let entry = entry.map_err(|e| QldbError::io(repo_dir, e))?;
        let path = entry.path();
        if path.is_dir() || path.extension().is_some_and(|e| e == "zip") {
            entries.push(path);
        }
    }
    Ok(entries)
}

fn read_dirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| QldbError::io(dir, e))? {
        let entry = entry.map_err(|e| QldbError::io(dir, e))?;
        if entry.path().is_dir() {
            dirs.push(entry.path());
        }
    }
    Ok(dirs)
}
