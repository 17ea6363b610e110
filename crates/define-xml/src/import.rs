//! File-level import: extension check, read, parse, progress reporting.

use std::path::Path;

use define_model::ParsedDefineXml;

use crate::error::{ParseError, Result};
use crate::parser::parse_define_xml;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStatus {
    Processing,
    Completed,
}

/// Progress snapshot passed to the import callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportProgress {
    pub status: ImportStatus,
    pub file_name: String,
    /// 0 to 100.
    pub progress: u8,
    pub loaded_size: u64,
    pub total_size: u64,
}

/// A parsed file plus the facts callers usually need right away.
#[derive(Debug, Clone)]
pub struct DefineImport {
    pub define: ParsedDefineXml,
    pub is_adam: bool,
    pub is_sdtm: bool,
    pub dataset_count: usize,
    pub variable_count: usize,
}

/// True for `*.xml`, case-insensitive.
pub fn is_define_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
}

/// Read and parse a Define-XML file, reporting progress at 0, 30, 70 and 100.
///
/// # Errors
///
/// Returns [`ParseError::NotDefineXml`] for a non-`.xml` path,
/// [`ParseError::Io`] when the file cannot be read, and any parse error.
pub fn import_define_file(
    path: &Path,
    mut on_progress: impl FnMut(ImportProgress),
) -> Result<DefineImport> {
    if !is_define_file(path) {
        return Err(ParseError::NotDefineXml {
            path: path.to_path_buf(),
        });
    }
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let total_size = std::fs::metadata(path)
        .map_err(|e| ParseError::io(path, e))?
        .len();
    let mut report = |status, progress, loaded_size| {
        on_progress(ImportProgress {
            status,
            file_name: file_name.clone(),
            progress,
            loaded_size,
            total_size,
        });
    };

    tracing::info!("Importing Define-XML: {}", path.display());
    report(ImportStatus::Processing, 0, 0);

    let text = std::fs::read_to_string(path).map_err(|e| ParseError::io(path, e))?;
    let loaded = text.len() as u64;
    report(ImportStatus::Processing, 30, loaded);

    let define = parse_define_xml(&text)?;
    report(ImportStatus::Processing, 70, loaded);

    let import = DefineImport {
        is_adam: define.is_adam(),
        is_sdtm: define.is_sdtm(),
        dataset_count: define.item_groups.len(),
        variable_count: define.item_defs.len(),
        define,
    };
    report(ImportStatus::Completed, 100, loaded);
    tracing::info!(
        adam = import.is_adam,
        sdtm = import.is_sdtm,
        datasets = import.dataset_count,
        variables = import.variable_count,
        "Import complete"
    );
    Ok(import)
}
