//! Value-level metadata pipeline for one dataset.
//!
//! Stages, in order:
//!
//! 1. PARAMCD -> PARAM mapping
//! 2. value lists of the dataset
//! 3. item-ref expansion per variable (a malformed value list only drops
//!    that variable)
//! 4. PARAM then PARAMCD synthesis from the mapping when absent
//! 5. table preview logging
//! 6. validation

use define_model::{
    DefineIndex, PARAM, PARAMCD, ParamInfo, ParsedDefineXml, ProcessedVlm, VlmItemRef,
    VlmVariable,
};
use serde::Serialize;

use crate::item_refs::ItemRefProcessor;
use crate::options::VlmOptions;
use crate::paramcd::{ParamcdMapping, build_paramcd_mapping_indexed};
use crate::preview::{build_preview, log_preview, summarize};
use crate::validate::{VlmReport, validate_vlm};
use crate::value_list::{find_value_list_defs, value_list_variable};

/// Rows of the grid written to the debug log.
const PREVIEW_ROWS: usize = 5;

/// Processed VLM and its validation findings.
#[derive(Debug, Clone, Serialize)]
pub struct VlmOutput {
    pub vlm: ProcessedVlm,
    pub report: VlmReport,
}

/// Run the pipeline with default options.
pub fn process_value_level_metadata(define: &ParsedDefineXml, dataset: &str) -> VlmOutput {
    process_value_level_metadata_with(define, dataset, &VlmOptions::default())
}

pub fn process_value_level_metadata_with(
    define: &ParsedDefineXml,
    dataset: &str,
    options: &VlmOptions,
) -> VlmOutput {
    let _span = tracing::info_span!("vlm", dataset).entered();
    tracing::info!(
        item_defs = define.item_defs.len(),
        value_lists = define.value_list_defs.len(),
        where_clauses = define.where_clause_defs.len(),
        "Starting VLM processing"
    );

    let index = DefineIndex::new(define);
    let mapping = build_paramcd_mapping_indexed(define, &index, dataset);
    let value_lists = find_value_list_defs(define, dataset);
    let processor = ItemRefProcessor::from_index(index, &mapping, dataset, options);

    let mut vlm = ProcessedVlm::new(dataset);
    for (position, value_list) in value_lists.iter().enumerate() {
        let Some(oid) = value_list.oid.as_deref() else {
            continue;
        };
        let Some(name) = value_list_variable(oid) else {
            tracing::warn!(oid, "Invalid ValueListDef OID format");
            continue;
        };
        tracing::debug!(
            variable = name,
            "Processing variable [{}/{}]",
            position + 1,
            value_lists.len()
        );

        let variable = vlm
            .variables
            .entry(name.to_string())
            .or_insert_with(|| VlmVariable::new(name, oid, value_list.description.clone()));
        let item_refs = processor.process(value_list);
        tracing::debug!(
            variable = name,
            count = item_refs.len(),
            "Parameter-specific definitions"
        );
        variable.value_list_def.item_refs.extend(item_refs);
    }

    if options.synthesize_parameter_variables && !mapping.is_empty() {
        ensure_parameter_variable(&mut vlm, &mapping, PARAM);
        ensure_parameter_variable(&mut vlm, &mapping, PARAMCD);
    }

    log_preview(&build_preview(&vlm), PREVIEW_ROWS);
    let summary = summarize(&vlm);
    tracing::info!(
        variables = summary.variable_count,
        parameters = summary.parameter_count,
        non_parameterized = summary.has_non_parameterized,
        "VLM structure built"
    );

    let report = validate_vlm(&vlm, options);
    VlmOutput { vlm, report }
}

/// Adds a PARAM or PARAMCD variable with one entry per mapped parameter.
fn ensure_parameter_variable(vlm: &mut ProcessedVlm, mapping: &ParamcdMapping, name: &str) {
    if vlm.variables.contains_key(name) {
        tracing::debug!(variable = name, "Variable already present");
        return;
    }
    let mut variable = VlmVariable::new(name, format!("VL.{}.{name}", vlm.dataset), None);
    variable.value_list_def.item_refs = mapping
        .iter()
        .zip(1u32..)
        .map(|((paramcd, param), ordinal)| {
            let decode = if name == PARAMCD { paramcd } else { param };
            let mut item = VlmItemRef::for_parameter(
                paramcd.clone(),
                ParamInfo {
                    ordinal,
                    coded_value: paramcd.clone(),
                    decode: decode.clone(),
                    is_external: false,
                },
            );
            item.mandatory = true;
            item.order_number = ordinal;
            item.item_description = Some(param.clone());
            item
        })
        .collect();
    tracing::info!(
        variable = name,
        count = mapping.len(),
        "Synthesized variable from parameter mapping"
    );
    vlm.variables.insert(name.to_string(), variable);
}
