//! Local database catalog
//!
//! The catalog is the on-disk tree storing installed databases, keyed by
//! hosting service, owner and repository:
//!
//! ```text
//! ~/codeql-dbs/github.com/
//!     └── <owner>/<repo>/
//!         ├── <language>-<shortsha>.zip   ← database archive
//!         └── <language>-<shortsha>.json  ← metadata sidecar
//! ```
//!
//! Entries are created by install/download/create and read by list/info;
//! they are never mutated in place, and stale fingerprints are not pruned.

mod installer;
mod store;

pub use installer::{DatabaseValidator, InstallOutcome, Installer};
pub use store::{entry_info, list_entries, repo_info, EntryInfo, ListFilter};
