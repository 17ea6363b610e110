//! PARAMCD -> PARAM mapping for a dataset.

use define_model::{DefineIndex, PARAMCD, ParsedDefineXml, normalize_dataset_id};
use indexmap::IndexMap;

/// Parameter code to parameter label, in discovery order.
pub type ParamcdMapping = IndexMap<String, String>;

/// Build the mapping for `dataset`.
///
/// The PARAMCD codelist is used when it yields any decoded entries;
/// otherwise codes selected by `PARAMCD EQ/IN` range checks map to
/// themselves. The two sources are never merged.
pub fn build_paramcd_mapping(define: &ParsedDefineXml, dataset: &str) -> ParamcdMapping {
    build_paramcd_mapping_indexed(define, &DefineIndex::new(define), dataset)
}

/// [`build_paramcd_mapping`] over an index already built for `define`.
pub fn build_paramcd_mapping_indexed(
    define: &ParsedDefineXml,
    index: &DefineIndex<'_>,
    dataset: &str,
) -> ParamcdMapping {
    let target = normalize_dataset_id(dataset);

    let mut mapping = from_codelist(define, index, &target);
    if mapping.is_empty() {
        tracing::debug!(dataset, "No PARAMCD codelist entries, scanning where clauses");
        mapping = from_where_clauses(define, &target);
    }

    if mapping.is_empty() {
        tracing::info!(dataset, "No PARAMCD to PARAM mappings found");
    } else {
        tracing::info!(dataset, count = mapping.len(), "Built PARAMCD to PARAM mapping");
        for (paramcd, param) in &mapping {
            tracing::debug!("  {paramcd} -> {param}");
        }
    }
    mapping
}

fn from_codelist(
    define: &ParsedDefineXml,
    index: &DefineIndex<'_>,
    target: &str,
) -> ParamcdMapping {
    let Some(code_list_oid) = define
        .item_defs
        .iter()
        .find(|def| is_paramcd_oid(def.oid.as_deref(), target, false))
        .and_then(|def| def.code_list_oid.as_deref())
    else {
        return ParamcdMapping::new();
    };
    let Some(code_list) = index.code_list(code_list_oid) else {
        tracing::warn!(code_list_oid, "PARAMCD codelist is not defined");
        return ParamcdMapping::new();
    };

    code_list
        .code_list_items
        .iter()
        .filter_map(|item| {
            let code = item.coded_value.as_deref()?;
            let label = item.decode_text()?;
            Some((code.to_string(), label.to_string()))
        })
        .collect()
}

fn from_where_clauses(define: &ParsedDefineXml, target: &str) -> ParamcdMapping {
    let mut mapping = ParamcdMapping::new();
    let checks = define
        .where_clause_defs
        .iter()
        .flat_map(|def| &def.range_checks)
        .filter(|check| {
            check.comparator.is_inclusive() && is_paramcd_oid(Some(&check.item_oid), target, true)
        });
    for check in checks {
        for value in &check.check_values {
            mapping
                .entry(value.clone())
                .or_insert_with(|| value.clone());
        }
    }
    mapping
}

/// `IT.<target>.PARAMCD[...]`; `exact` additionally requires three segments.
fn is_paramcd_oid(oid: Option<&str>, target: &str, exact: bool) -> bool {
    let Some(oid) = oid else {
        return false;
    };
    let parts: Vec<&str> = oid.split('.').collect();
    if exact && parts.len() != 3 {
        return false;
    }
    matches!(parts.as_slice(), ["IT", dataset, PARAMCD, ..] if normalize_dataset_id(dataset) == target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use define_model::{
        CodeList, CodeListItem, Comparator, Decode, ItemDef, RangeCheck, WhereClauseDef,
    };

    fn paramcd_def(code_list: &str) -> ItemDef {
        ItemDef {
            oid: Some("IT.ADLB.PARAMCD".to_string()),
            code_list_oid: Some(code_list.to_string()),
            ..ItemDef::default()
        }
    }

    fn item(code: &str, label: Option<&str>) -> CodeListItem {
        CodeListItem {
            coded_value: Some(code.to_string()),
            decode: label.map(|text| Decode {
                translated_text: Some(text.to_string()),
                lang: None,
            }),
            ..CodeListItem::default()
        }
    }

    fn check(item_oid: &str, comparator: Comparator, values: &[&str]) -> RangeCheck {
        RangeCheck {
            comparator,
            item_oid: item_oid.to_string(),
            check_values: values.iter().map(|v| (*v).to_string()).collect(),
            ..RangeCheck::default()
        }
    }

    fn clauses(checks: Vec<RangeCheck>) -> Vec<WhereClauseDef> {
        vec![WhereClauseDef {
            oid: "WC.ADLB.X".to_string(),
            comment_oid: None,
            range_checks: checks,
        }]
    }

    #[test]
    fn test_codelist_strategy() {
        let define = ParsedDefineXml {
            item_defs: vec![paramcd_def("CL.PARAMCD")],
            code_lists: vec![CodeList {
                oid: Some("CL.PARAMCD".to_string()),
                code_list_items: vec![
                    item("ALB", Some("Albumin (g/L)")),
                    item("NODECODE", None),
                    item("ALT", Some("ALT (U/L)")),
                ],
                ..CodeList::default()
            }],
            where_clause_defs: clauses(vec![check("IT.ADLB.PARAMCD", Comparator::Eq, &["GLUC"])]),
            ..ParsedDefineXml::default()
        };
        let mapping = build_paramcd_mapping(&define, "adlb.xml");
        let entries: Vec<_> = mapping.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(entries, vec![("ALB", "Albumin (g/L)"), ("ALT", "ALT (U/L)")]);

        let index = DefineIndex::new(&define);
        assert_eq!(build_paramcd_mapping_indexed(&define, &index, "ADLB"), mapping);
    }

    #[test]
    fn test_where_clause_strategy() {
        let define = ParsedDefineXml {
            where_clause_defs: clauses(vec![
                check("IT.ADLB.PARAMCD", Comparator::In, &["ALB", "ALT"]),
                check("IT.ADLB.PARAMCD", Comparator::NotIn, &["GLUC"]),
                check("IT.ADVS.PARAMCD", Comparator::Eq, &["SYSBP"]),
                check("IT.ADLB.PARAMCD.X", Comparator::Eq, &["BILI"]),
                check("IT.ADLB.PARAMCD", Comparator::Eq, &["ALB"]),
            ]),
            ..ParsedDefineXml::default()
        };
        let mapping = build_paramcd_mapping(&define, "ADLB");
        let entries: Vec<_> = mapping.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(entries, vec![("ALB", "ALB"), ("ALT", "ALT")]);
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let define = ParsedDefineXml {
            where_clause_defs: clauses(vec![check(
                "IT.ADLB.PARAMCD",
                Comparator::In,
                &["C", "A", "B"],
            )]),
            ..ParsedDefineXml::default()
        };
        assert_eq!(
            build_paramcd_mapping(&define, "ADLB"),
            build_paramcd_mapping(&define, "ADLB")
        );
    }
}
