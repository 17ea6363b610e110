//! Define-XML parsing.
//!
//! Turns Define-XML v2.0/2.1 text (optionally with the ARM extension) into a
//! [`define_model::ParsedDefineXml`]:
//!
//! - [`parse_define_xml`]: parse in-memory text
//! - [`import_define_file`]: read a `.xml` file with progress reporting
//!
//! No schema validation is performed.

pub mod error;
mod import;
mod parser;
pub mod where_clause;
pub mod xml;

pub use error::{ParseError, Result};
pub use import::{DefineImport, ImportProgress, ImportStatus, import_define_file, is_define_file};
pub use parser::parse_define_xml;
