//! End-to-end installation tests against a scratch catalog root.

use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use qldb_core::catalog::DatabaseValidator;
use qldb_core::{archive, Installer, QldbError, RepoId};

struct AcceptAll;

impl DatabaseValidator for AcceptAll {
    fn validate(&self, _db_path: &Path) -> qldb_core::Result<()> {
        Ok(())
    }
}

fn test_installer(catalog_root: PathBuf) -> Installer {
    Installer::with_catalog_root(catalog_root).with_validator(Box::new(AcceptAll))
}

fn make_database_dir(root: &Path) -> PathBuf {
    let db = root.join("codeql-db");
    fs::create_dir_all(db.join("results")).unwrap();
    fs::write(
        db.join("codeql-database.yml"),
        "primaryLanguage: python\ncreationMetadata:\n  sha: \"1111222233334444\"\n",
    )
    .unwrap();
    fs::write(db.join("results").join("interpreted.bin"), b"payload").unwrap();
    db
}

#[test]
fn directory_install_produces_archive_and_sidecar() {
    let temp = TempDir::new().unwrap();
    let db = make_database_dir(temp.path());
    let catalog = temp.path().join("catalog");

    let installer = test_installer(catalog.clone());
    let repo = RepoId::parse("owner/repo").unwrap();
    let outcome = installer.install(&repo, &db, false).unwrap();

    assert!(outcome.freshly_installed);
    assert_eq!(outcome.language, "python");
    assert_eq!(outcome.commit_sha, "1111222233334444");
    assert_eq!(outcome.short_sha, "11112222");
    assert_eq!(
        outcome.archive_path,
        catalog.join("owner/repo/python-11112222.zip")
    );
    assert!(outcome.archive_path.exists());

    // The sidecar carries the full parsed mapping plus the provenance stamp.
    let sidecar: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&outcome.sidecar_path).unwrap()).unwrap();
    assert_eq!(sidecar["provenance"], "owner/repo");
    assert_eq!(sidecar["primaryLanguage"], "python");
    assert_eq!(sidecar["creationMetadata"]["sha"], "1111222233334444");

    // The source directory was left alone.
    assert!(db.exists());
}

#[test]
fn install_is_idempotent_per_fingerprint() {
    let temp = TempDir::new().unwrap();
    let db = make_database_dir(temp.path());
    let catalog = temp.path().join("catalog");

    let installer = test_installer(catalog.clone());
    let repo = RepoId::parse("owner/repo").unwrap();

    let first = installer.install(&repo, &db, false).unwrap();
    assert!(first.freshly_installed);
    let original_bytes = fs::read(&first.archive_path).unwrap();

    let second = installer.install(&repo, &db, false).unwrap();
    assert!(!second.freshly_installed);
    assert!(!second.sidecar_written);
    assert_eq!(second.archive_path, first.archive_path);

    // Exactly one archive + one sidecar, and the archive was not rewritten.
    let entries: Vec<_> = fs::read_dir(catalog.join("owner/repo"))
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(entries.len(), 2);
    assert_eq!(fs::read(&first.archive_path).unwrap(), original_bytes);
}

#[test]
fn zip_install_matches_directory_install() {
    let temp = TempDir::new().unwrap();
    let db = make_database_dir(temp.path());

    // Pack the database the same way `install <dir>` would.
    let zip_path = temp.path().join("upload.zip");
    archive::pack(&db, &zip_path).unwrap();

    let catalog = temp.path().join("catalog");
    let installer = test_installer(catalog.clone());
    let repo = RepoId::parse("owner/repo").unwrap();

    let outcome = installer.install(&repo, &zip_path, false).unwrap();
    assert!(outcome.freshly_installed);
    assert_eq!(
        outcome.archive_path,
        catalog.join("owner/repo/python-11112222.zip")
    );

    // The installed archive still unpacks into the prefixed layout.
    let unpacked = temp.path().join("unpacked");
    archive::unpack(&outcome.archive_path, &unpacked).unwrap();
    assert!(unpacked.join("codeql-db/codeql-database.yml").exists());
    assert_eq!(
        fs::read(unpacked.join("codeql-db/results/interpreted.bin")).unwrap(),
        b"payload"
    );
}

#[test]
fn archive_without_config_fails_with_not_found() {
    let temp = TempDir::new().unwrap();
    let bare = temp.path().join("bare");
    fs::create_dir_all(&bare).unwrap();
    fs::write(bare.join("README.md"), b"no metadata here").unwrap();

    let installer = test_installer(temp.path().join("catalog"));
    let repo = RepoId::parse("owner/repo").unwrap();

    let result = installer.install(&repo, &bare, false);
    assert!(matches!(result, Err(QldbError::MetadataNotFound)));
}
