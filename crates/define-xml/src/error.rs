//! Error types for Define-XML parsing and import.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal failures: the document is rejected and nothing partial is returned.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Input text is empty.
    #[error("invalid input: XML string required")]
    EmptyInput,

    /// The text is not well-formed XML.
    #[error("XML parsing error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Extension namespace prefix not declared on the document root.
    #[error("required namespace '{prefix}' not found in XML")]
    MissingNamespace { prefix: String },

    /// Structural element the rest of the document hangs off.
    #[error("required element '{element}' not found")]
    MissingElement { element: String },

    /// Every `def:WhereClauseDef` must be addressable.
    #[error("WhereClauseDef must have an OID")]
    WhereClauseWithoutOid,

    /// File-level import: wrong extension.
    #[error("file {} is not a valid Define-XML file", .path.display())]
    NotDefineXml { path: PathBuf },

    /// File-level import: unreadable file.
    #[error("failed to read file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ParseError {
    pub(crate) fn missing_element(element: &str) -> Self {
        Self::MissingElement {
            element: element.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;
