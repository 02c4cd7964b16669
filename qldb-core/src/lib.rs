//! qldb core library
//!
//! Manages local caches of CodeQL databases: packing and unpacking database
//! archives, extracting metadata from them, mapping repositories onto the
//! canonical catalog layout, and orchestrating the external CodeQL CLI and
//! the GitHub API for create/download/install/list/info operations.

pub mod archive;
pub mod catalog;
pub mod codeql;
pub mod error;
pub mod github;
pub mod layout;
pub mod metadata;

pub use catalog::{InstallOutcome, Installer, ListFilter};
pub use error::{QldbError, Result};
pub use github::GitHubClient;
pub use layout::RepoId;
pub use metadata::DatabaseMetadata;
