use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::{debug, info, info_span};

use define_model::{DefineIndex, ParsedDefineXml};
use define_vlm::{VlmOptions, VlmOutput, find_value_list_defs, process_value_level_metadata_with};
use define_xml::{DefineImport, import_define_file};

use crate::types::{DatasetRow, DocumentSummary, EntityCount};

/// Import a define.xml file, logging progress at debug level.
pub fn load_define(path: &Path) -> Result<DefineImport> {
    let import = import_define_file(path, |progress| {
        debug!(
            file = %progress.file_name,
            progress = progress.progress,
            loaded = progress.loaded_size,
            total = progress.total_size,
            "Import progress"
        );
    })
    .with_context(|| format!("load define-xml {}", path.display()))?;
    info!(
        datasets = import.dataset_count,
        variables = import.variable_count,
        "Define-XML loaded"
    );
    Ok(import)
}

/// Options from `--config`, or the defaults.
pub fn load_options(path: Option<&Path>) -> Result<VlmOptions> {
    match path {
        Some(path) => VlmOptions::from_toml_file(path)
            .with_context(|| format!("load options {}", path.display())),
        None => Ok(VlmOptions::default()),
    }
}

pub fn document_summary(file_name: &str, import: &DefineImport) -> DocumentSummary {
    let define = &import.define;
    let counts = [
        ("Standards", define.standards.len()),
        ("Datasets", define.item_groups.len()),
        ("Variables", define.item_defs.len()),
        ("Value lists", define.value_list_defs.len()),
        ("Where clauses", define.where_clause_defs.len()),
        ("Codelists", define.code_lists.len()),
        ("Dictionaries", define.dictionaries.len()),
        ("Methods", define.methods.len()),
        ("Comments", define.comments.len()),
        ("Documents", define.documents.len()),
        ("Analysis results", define.analysis_results.len()),
    ];
    DocumentSummary {
        file_name: file_name.to_string(),
        study: define.study.name.clone().or(define.study.oid.clone()),
        protocol: define.study.protocol_name.clone(),
        meta_data_version: define.meta_data.oid.clone(),
        define_version: define.meta_data.define_version.clone(),
        is_adam: import.is_adam,
        is_sdtm: import.is_sdtm,
        counts: counts
            .into_iter()
            .map(|(entity, count)| EntityCount { entity, count })
            .collect(),
    }
}

pub fn dataset_rows(define: &ParsedDefineXml) -> Vec<DatasetRow> {
    let index = DefineIndex::new(define);
    define
        .item_groups
        .iter()
        .map(|group| {
            let name = group.display_name().to_string();
            let derived = group
                .item_refs
                .iter()
                .filter_map(|item_ref| index.item_def(item_ref.oid.as_deref()?))
                .filter(|item_def| item_def.is_derived())
                .count();
            DatasetRow {
                value_lists: find_value_list_defs(define, &name).len(),
                name,
                description: group.description.clone(),
                class: group.class.clone(),
                structure: group.structure.clone(),
                variables: group.item_refs.len(),
                derived,
                vlm_eligible: group.is_vlm_eligible(),
            }
        })
        .collect()
}

/// Run the VLM pipeline for `dataset`, or for every VLM-eligible dataset.
pub fn run_vlm(
    define: &ParsedDefineXml,
    dataset: Option<&str>,
    options: &VlmOptions,
) -> Result<Vec<VlmOutput>> {
    let _span = info_span!("definex_vlm").entered();
    let datasets: Vec<String> = match dataset {
        Some(name) => {
            if define.item_group(name).is_none() && find_value_list_defs(define, name).is_empty() {
                bail!("dataset {name} has no item group or value lists in this document");
            }
            vec![name.to_string()]
        }
        None => define
            .item_groups
            .iter()
            .filter(|group| group.is_vlm_eligible())
            .map(|group| group.display_name().to_string())
            .collect(),
    };
    if datasets.is_empty() {
        info!("No VLM-eligible datasets");
    }
    Ok(datasets
        .iter()
        .map(|name| process_value_level_metadata_with(define, name, options))
        .collect())
}
