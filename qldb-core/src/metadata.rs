//! Database metadata extracted from `codeql-database.yml`
//!
//! The configuration file travels inside every database archive. It is parsed
//! as YAML and kept verbatim: the tool only reads the primary language and the
//! creation fingerprint, but unknown fields pass through untouched into the
//! `.json` sidecar written next to an installed archive.

use std::io::{Cursor, Read};

use serde_yaml_ng::Value;
use zip::ZipArchive;

use crate::error::{QldbError, Result};
use crate::layout::{self, CONFIG_FILENAME};

/// Parsed contents of a database's `codeql-database.yml`.
#[derive(Debug, Clone)]
pub struct DatabaseMetadata {
    doc: Value,
}

impl DatabaseMetadata {
    /// Locate and parse the configuration file inside a zip held in memory.
    ///
    /// The archive is scanned for the single entry whose name ends with
    /// `codeql-database.yml`; its absence is a [`QldbError::MetadataNotFound`].
    pub fn from_zip_bytes(bytes: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;

        let mut config_index = None;
        for i in 0..archive.len() {
            let entry = archive.by_index(i)?;
            if entry.name().ends_with(CONFIG_FILENAME) {
                config_index = Some(i);
                break;
            }
        }
        let Some(index) = config_index else {
            return Err(QldbError::MetadataNotFound);
        };

        let mut entry = archive.by_index(index)?;
        let mut content = String::new();
        entry
            .read_to_string(&mut content)
            .map_err(|e| QldbError::io(CONFIG_FILENAME, e))?;

        Self::from_yaml(&content)
    }

    /// Parse metadata from YAML text. The document must be a mapping.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let doc: Value =
            serde_yaml_ng::from_str(content).map_err(|source| QldbError::MetadataParse { source })?;
        if !doc.is_mapping() {
            return Err(QldbError::MetadataNotMapping);
        }
        Ok(Self { doc })
    }

    /// The database's primary language, e.g. `python`.
    pub fn primary_language(&self) -> Result<&str> {
        self.doc
            .get("primaryLanguage")
            .and_then(Value::as_str)
            .ok_or(QldbError::MissingField {
                field: "primaryLanguage",
            })
    }

    /// The full commit fingerprint the database was created from.
    pub fn commit_sha(&self) -> Result<&str> {
        self.doc
            .get("creationMetadata")
            .and_then(|m| m.get("sha"))
            .and_then(Value::as_str)
            .ok_or(QldbError::MissingField {
                field: "creationMetadata.sha",
            })
    }

    /// The abbreviated fingerprint used in catalog filenames.
    pub fn short_sha(&self) -> Result<&str> {
        Ok(layout::short_sha(self.commit_sha()?))
    }

    /// Stamp the repository this database belongs to, for the sidecar.
    pub fn set_provenance(&mut self, nwo: &str) {
        if let Value::Mapping(fields) = &mut self.doc {
            fields.insert(Value::from("provenance"), Value::from(nwo));
        }
    }

    /// The full mapping, unknown fields included.
    pub fn as_value(&self) -> &Value {
        &self.doc
    }

    /// Serialize the full mapping as pretty JSON for the sidecar file.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.doc)?)
    }
}
