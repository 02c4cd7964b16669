//! Zip packing and unpacking for database archives
//!
//! Packed archives root every member under the fixed `codeql-db/` prefix so
//! an unpacked database always lands in a single directory. Unpacking guards
//! against crafted entries that would escape the destination.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::error::{QldbError, Result};
use crate::layout::ARCHIVE_PREFIX;

/// Compress `source_dir` into a zip archive at `archive_path`.
///
/// Every regular file is stored under `codeql-db/<path relative to
/// source_dir>`, with forward slashes regardless of platform. Directories are
/// implicit from the file paths. Membership is deterministic; byte order
/// follows the directory walk.
pub fn pack(source_dir: &Path, archive_path: &Path) -> Result<()> {
    let info = fs::metadata(source_dir).map_err(|e| QldbError::io(source_dir, e))?;
    if !info.is_dir() {
        return Err(QldbError::NotADirectory {
            path: source_dir.to_path_buf(),
        });
    }

    let file = File::create(archive_path).map_err(|e| QldbError::io(archive_path, e))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    for entry in WalkDir::new(source_dir) {
        let entry = entry.map_err(|e| QldbError::io(source_dir, e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let rel = entry
            .path()
            .strip_prefix(source_dir)
            .map_err(|_| QldbError::io(entry.path(), io::Error::other("outside source dir")))?;

        let mut name = String::from(ARCHIVE_PREFIX);
        for component in rel.components() {
            name.push('/');
            name.push_str(&component.as_os_str().to_string_lossy());
        }

        writer.start_file(name, options)?;
        let mut source = File::open(entry.path()).map_err(|e| QldbError::io(entry.path(), e))?;
        io::copy(&mut source, &mut writer).map_err(|e| QldbError::io(archive_path, e))?;
    }

    writer.finish()?;
    tracing::debug!("Packed {} into {}", source_dir.display(), archive_path.display());
    Ok(())
}

/// Decompress the archive at `archive_path` into `dest_dir`, returning every
/// path that was created.
///
/// Any entry whose stored name would resolve outside `dest_dir` (absolute
/// names, `..` segments) fails with [`QldbError::PathTraversal`] before
/// anything is written for it. Parent directories are created as needed.
pub fn unpack(archive_path: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>> {
    let file = File::open(archive_path).map_err(|e| QldbError::io(archive_path, e))?;
    let mut archive = ZipArchive::new(file)?;

    let mut written = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;

        let Some(rel) = entry.enclosed_name() else {
            return Err(QldbError::PathTraversal {
                name: entry.name().to_string(),
            });
        };
        let target = dest_dir.join(rel);

        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|e| QldbError::io(&target, e))?;
            written.push(target);
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| QldbError::io(parent, e))?;
        }
        let mut out = File::create(&target).map_err(|e| QldbError::io(&target, e))?;
        io::copy(&mut entry, &mut out).map_err(|e| QldbError::io(&target, e))?;
        written.push(target);
    }

    tracing::debug!(
        "Unpacked {} entries from {} into {}",
        written.len(),
        archive_path.display(),
        dest_dir.display()
    );
    Ok(written)
}
