//! Locating the value lists of a dataset.

use std::collections::HashSet;

use define_model::{ParsedDefineXml, ValueListDef, normalize_dataset_id};

const VALUE_LIST_PREFIX: &str = "VL";

/// Variable segment of a `VL.<dataset>.<variable>[...]` OID.
pub fn value_list_variable(oid: &str) -> Option<&str> {
    oid.split('.').nth(2)
}

/// Value lists whose OID names `dataset`, first occurrence of each OID only.
pub fn find_value_list_defs<'a>(define: &'a ParsedDefineXml, dataset: &str) -> Vec<&'a ValueListDef> {
    let target = normalize_dataset_id(dataset);
    let mut seen = HashSet::new();
    let found: Vec<&ValueListDef> = define
        .value_list_defs
        .iter()
        .filter(|def| {
            let Some(oid) = def.oid.as_deref() else {
                return false;
            };
            let parts: Vec<&str> = oid.split('.').collect();
            parts.len() >= 3
                && parts[0] == VALUE_LIST_PREFIX
                && normalize_dataset_id(parts[1]) == target
                && seen.insert(oid.to_string())
        })
        .collect();

    tracing::info!(dataset, count = found.len(), "Found value lists");
    for def in &found {
        let oid = def.oid.as_deref().unwrap_or_default();
        tracing::debug!(
            oid,
            variable = value_list_variable(oid).unwrap_or("unknown"),
            item_refs = def.item_refs.len(),
            "Value list"
        );
    }
    found
}
