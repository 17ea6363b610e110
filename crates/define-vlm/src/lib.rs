//! Value-level metadata (VLM) resolution.
//!
//! Turns the value lists, where clauses and code lists of a parsed
//! Define-XML document into a per-dataset [`ProcessedVlm`] keyed by
//! variable and parameter code, then checks it for coverage gaps and
//! dangling references.
//!
//! [`ProcessedVlm`]: define_model::ProcessedVlm

pub mod error;
pub mod item_refs;
pub mod options;
pub mod paramcd;
pub mod preview;
mod processor;
pub mod validate;
pub mod value_list;
pub mod where_clause;

pub use error::{Result, VlmError};
pub use item_refs::{ItemRefProcessor, process_parameter_item_refs};
pub use options::VlmOptions;
pub use paramcd::{ParamcdMapping, build_paramcd_mapping, build_paramcd_mapping_indexed};
pub use preview::{TablePreview, VlmSummary, build_preview, summarize};
pub use processor::{VlmOutput, process_value_level_metadata, process_value_level_metadata_with};
pub use validate::{ValidationWarning, VlmReport, validate_vlm};
pub use value_list::find_value_list_defs;
pub use where_clause::{resolve_where_clause, resolve_where_clause_def};
