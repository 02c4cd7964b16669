//! qldb error types
//!
//! Every fallible operation in the core returns [`Result`]. The CLI layer
//! decides what a failure means for the process exit code; nothing in here
//! terminates the process.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, QldbError>;

#[derive(Error, Debug)]
pub enum QldbError {
    /// Filesystem read/write failure, with the offending path
    #[error("I/O error at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Zip archive read/write failure
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// An archive entry would be extracted outside the destination directory
    #[error("archive entry '{name}' escapes the destination directory")]
    PathTraversal { name: String },

    /// A repository identifier that is not of the form `owner/name`
    #[error("invalid repository identifier '{nwo}': expected owner/name")]
    InvalidNwo { nwo: String },

    /// A catalog filename that does not follow `<language>-<short-sha>`
    #[error("invalid database name '{name}': expected <language>-<short-sha>")]
    InvalidEntryName { name: String },

    /// A database path that is neither a directory nor a `.zip` archive
    #[error("database is not a zip archive: {path}")]
    NotAZip { path: PathBuf },

    /// A pack source that exists but is not a directory
    #[error("not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// The configuration file inside the archive could not be parsed
    #[error("malformed database metadata")]
    MetadataParse {
        #[source]
        source: serde_yaml_ng::Error,
    },

    /// The configuration file parsed, but not into a key/value mapping
    #[error("database metadata must be a mapping")]
    MetadataNotMapping,

    /// The archive holds no `codeql-database.yml`
    #[error("codeql-database.yml not found in archive")]
    MetadataNotFound,

    /// A metadata field the tool relies on is absent or has the wrong shape
    #[error("metadata field '{field}' is missing or not a string")]
    MissingField { field: &'static str },

    /// The database path handed to install/create does not exist
    #[error("database path does not exist: {path}")]
    DatabaseNotFound { path: PathBuf },

    /// The CodeQL CLI rejected a database (non-zero exit or unparsable output)
    #[error("database validation failed:\n{output}")]
    Validation { output: String },

    /// The user's home directory could not be determined
    #[error("could not determine the user home directory")]
    NoHomeDir,

    /// HTTP transport failure (connect, timeout, body decode)
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// The GitHub API answered with a non-success status
    #[error("GitHub API error: HTTP {status} from {url}")]
    Api {
        status: reqwest::StatusCode,
        url: String,
    },

    /// JSON serialization failure (sidecar or `--json` output)
    #[error("JSON error")]
    Json(#[from] serde_json::Error),
}

impl QldbError {
    /// Attach the offending path to a raw I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        QldbError::Io {
            path: path.into(),
            source,
        }
    }
}
