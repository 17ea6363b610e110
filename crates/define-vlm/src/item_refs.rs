//! Expansion of value-list item refs into per-parameter VLM entries.

use define_model::{
    CodelistEntry, CodelistInfo, CommentInfo, DefineIndex, ItemDef, ItemRef, MethodInfo,
    NON_PARAMETERIZED, OriginInfo, ParamInfo, ParsedDefineXml, ValueListDef, VlmItemRef,
    VlmWhereClause, WhereClauseResult, WhereClauseSource,
};
use indexmap::IndexMap;

use crate::options::VlmOptions;
use crate::paramcd::ParamcdMapping;
use crate::where_clause::resolve_where_clause_def;

/// Processes the value lists of one dataset against one document.
#[derive(Debug)]
pub struct ItemRefProcessor<'a> {
    index: DefineIndex<'a>,
    mapping: &'a ParamcdMapping,
    dataset: &'a str,
    options: &'a VlmOptions,
}

impl<'a> ItemRefProcessor<'a> {
    pub fn new(
        define: &'a ParsedDefineXml,
        mapping: &'a ParamcdMapping,
        dataset: &'a str,
        options: &'a VlmOptions,
    ) -> Self {
        Self::from_index(DefineIndex::new(define), mapping, dataset, options)
    }

    /// Reuse an index already built for the document.
    pub fn from_index(
        index: DefineIndex<'a>,
        mapping: &'a ParamcdMapping,
        dataset: &'a str,
        options: &'a VlmOptions,
    ) -> Self {
        Self {
            index,
            mapping,
            dataset,
            options,
        }
    }

    /// One entry per (item ref, parameter code). Item refs whose item or
    /// where clause cannot be resolved are skipped.
    pub fn process(&self, value_list: &ValueListDef) -> Vec<VlmItemRef> {
        let value_list_oid = value_list.oid.as_deref();
        tracing::debug!(
            oid = value_list_oid.unwrap_or_default(),
            item_refs = value_list.item_refs.len(),
            "Processing value list item refs"
        );
        value_list
            .item_refs
            .iter()
            .flat_map(|item_ref| self.expand(item_ref, value_list_oid))
            .collect()
    }

    fn expand(&self, item_ref: &ItemRef, value_list_oid: Option<&str>) -> Vec<VlmItemRef> {
        let Some(oid) = item_ref.oid.as_deref() else {
            tracing::debug!("Skipping item ref without ItemOID");
            return Vec::new();
        };
        let Some(item_def) = self.index.item_def(oid) else {
            tracing::warn!(oid, "ItemDef not found for value list item ref");
            return Vec::new();
        };

        let mut template = VlmItemRef {
            paramcd: NON_PARAMETERIZED.to_string(),
            param_info: None,
            where_clause: None,
            method_oid: item_ref.method_oid.clone(),
            method: item_ref
                .method_oid
                .as_deref()
                .and_then(|method_oid| self.method_info(method_oid)),
            value_list_oid: value_list_oid.map(str::to_string),
            oid: item_def.oid.clone(),
            codelist: self.codelist_info(item_def),
            origin: origin_info(item_def),
            comment: self.comment_info(item_def),
            item_description: item_def.description.clone(),
            mandatory: item_ref.is_mandatory(),
            order_number: item_ref.order(),
            special_variables: IndexMap::new(),
            stratification_info: None,
            is_non_parameterized: false,
        };

        let mut targets: Vec<String> = Vec::new();
        if let Some(where_clause_oid) = item_ref.where_clause_oid.as_deref() {
            let Some(def) = self.index.where_clause_def(where_clause_oid) else {
                tracing::warn!(oid = where_clause_oid, "No WhereClauseDef found");
                return Vec::new();
            };
            let result = resolve_where_clause_def(def, self.dataset, self.options);
            template.where_clause = primary_condition(&result, where_clause_oid, oid, self.dataset);
            template.special_variables = result.special_variables;
            template.stratification_info = Some(result.stratification_variables);
            targets = result.paramcds;
        }

        if targets.is_empty() {
            // Unscoped definitions apply to every known parameter.
            targets = self.mapping.keys().cloned().collect();
        }
        if targets.is_empty() {
            tracing::debug!(oid, "No parameters known, emitting non-parameterized entry");
            template.is_non_parameterized = true;
            return vec![template];
        }

        targets
            .into_iter()
            .map(|paramcd| {
                let decode = self
                    .mapping
                    .get(&paramcd)
                    .cloned()
                    .unwrap_or_else(|| paramcd.clone());
                VlmItemRef {
                    param_info: Some(ParamInfo {
                        ordinal: item_ref.order(),
                        coded_value: paramcd.clone(),
                        decode,
                        is_external: false,
                    }),
                    paramcd,
                    ..template.clone()
                }
            })
            .collect()
    }

    fn method_info(&self, method_oid: &str) -> Option<MethodInfo> {
        let Some(method) = self.index.method(method_oid) else {
            tracing::debug!(method_oid, "Method not defined");
            return None;
        };
        Some(MethodInfo {
            method_type: method.method_type.clone(),
            description: method.description.clone(),
            translated_text: method.description.clone(),
            document: method.document.clone(),
        })
    }

    fn codelist_info(&self, item_def: &ItemDef) -> Option<CodelistInfo> {
        let code_list = self.index.code_list(item_def.code_list_oid.as_deref()?)?;
        let coded = code_list.code_list_items.iter().filter_map(|item| {
            Some(CodelistEntry {
                coded_value: item.coded_value.clone()?,
                decode: item.decode_text()?.to_string(),
                is_extended: item.extended_value,
            })
        });
        // Enumerated items are self-describing.
        let enumerated = code_list.enumerated_items.iter().filter_map(|item| {
            let value = item.coded_value.clone()?;
            Some(CodelistEntry {
                decode: value.clone(),
                coded_value: value,
                is_extended: false,
            })
        });
        let items: Vec<CodelistEntry> = coded.chain(enumerated).collect();
        if items.is_empty() {
            return None;
        }
        Some(CodelistInfo {
            oid: code_list.oid.clone().unwrap_or_default(),
            name: code_list.name.clone(),
            items,
        })
    }

    fn comment_info(&self, item_def: &ItemDef) -> Option<CommentInfo> {
        let comment = self.index.comment(item_def.comment_oid.as_deref()?)?;
        Some(CommentInfo {
            oid: comment.oid.clone().unwrap_or_default(),
            description: comment.description.clone(),
        })
    }
}

/// Convenience wrapper building a one-shot [`ItemRefProcessor`].
pub fn process_parameter_item_refs(
    value_list: &ValueListDef,
    define: &ParsedDefineXml,
    mapping: &ParamcdMapping,
    dataset: &str,
    options: &VlmOptions,
) -> Vec<VlmItemRef> {
    ItemRefProcessor::new(define, mapping, dataset, options).process(value_list)
}

fn origin_info(item_def: &ItemDef) -> Option<OriginInfo> {
    if item_def.origin_type.is_none() && item_def.origin.is_none() {
        return None;
    }
    Some(OriginInfo {
        origin_type: item_def.origin_type.clone().unwrap_or_default(),
        source: item_def.origin_source.clone(),
        description: item_def.description.clone(),
        translated_text: item_def.origin.clone(),
    })
}

/// Only the first condition is surfaced; the rest stay in the
/// stratification and special-variable maps.
fn primary_condition(
    result: &WhereClauseResult,
    where_clause_oid: &str,
    item_oid: &str,
    dataset: &str,
) -> Option<VlmWhereClause> {
    let first = result.conditions.first()?;
    Some(VlmWhereClause {
        comparator: first.comparator,
        check_values: first.values.clone(),
        where_clause_oid: where_clause_oid.to_string(),
        oid: item_oid.to_string(),
        source: WhereClauseSource {
            domain: dataset.to_string(),
            variable: first.variable.clone(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use define_model::{
        CodeList, CodeListItem, Comment, Comparator, Decode, EnumeratedItem, Method, RangeCheck,
        WhereClauseDef,
    };

    fn mapping(codes: &[&str]) -> ParamcdMapping {
        codes
            .iter()
            .map(|code| ((*code).to_string(), format!("{code} label")))
            .collect()
    }

    fn item_ref(oid: &str, where_clause: Option<&str>) -> ItemRef {
        ItemRef {
            oid: Some(oid.to_string()),
            mandatory: Some("Yes".to_string()),
            order_number: Some("3".to_string()),
            method_oid: Some("MT.AVAL".to_string()),
            where_clause_oid: where_clause.map(str::to_string),
            ..ItemRef::default()
        }
    }

    fn value_list(refs: Vec<ItemRef>) -> ValueListDef {
        ValueListDef {
            oid: Some("VL.ADLB.AVAL".to_string()),
            item_refs: refs,
            description: None,
        }
    }

    fn document() -> ParsedDefineXml {
        ParsedDefineXml {
            item_defs: vec![ItemDef {
                oid: Some("IT.ADLB.AVAL".to_string()),
                description: Some("Analysis Value".to_string()),
                origin_type: Some("Derived".to_string()),
                origin: Some("From LBSTRESN".to_string()),
                code_list_oid: Some("CL.FLAG".to_string()),
                comment_oid: Some("COM.AVAL".to_string()),
                ..ItemDef::default()
            }],
            methods: vec![Method {
                oid: Some("MT.AVAL".to_string()),
                method_type: Some("Computation".to_string()),
                description: Some("AVAL = LBSTRESN".to_string()),
                ..Method::default()
            }],
            comments: vec![Comment {
                oid: Some("COM.AVAL".to_string()),
                description: Some("See SAP".to_string()),
            }],
            code_lists: vec![CodeList {
                oid: Some("CL.FLAG".to_string()),
                name: Some("Flag".to_string()),
                code_list_items: vec![
                    CodeListItem {
                        coded_value: Some("Y".to_string()),
                        extended_value: true,
                        decode: Some(Decode {
                            translated_text: Some("Yes".to_string()),
                            lang: None,
                        }),
                        ..CodeListItem::default()
                    },
                    CodeListItem {
                        coded_value: Some("U".to_string()),
                        ..CodeListItem::default()
                    },
                ],
                enumerated_items: vec![EnumeratedItem {
                    coded_value: Some("N".to_string()),
                    ..EnumeratedItem::default()
                }],
                ..CodeList::default()
            }],
            where_clause_defs: vec![
                WhereClauseDef {
                    oid: "WC.ALB".to_string(),
                    comment_oid: None,
                    range_checks: vec![RangeCheck {
                        comparator: Comparator::In,
                        item_oid: "IT.ADLB.PARAMCD".to_string(),
                        check_values: vec!["ALB".to_string(), "ALB".to_string()],
                        ..RangeCheck::default()
                    }],
                },
                WhereClauseDef {
                    oid: "WC.CHEM".to_string(),
                    comment_oid: None,
                    range_checks: vec![RangeCheck {
                        comparator: Comparator::Eq,
                        item_oid: "IT.ADLB.PARCAT1".to_string(),
                        check_values: vec!["CHEMISTRY".to_string()],
                        ..RangeCheck::default()
                    }],
                },
            ],
            ..ParsedDefineXml::default()
        }
    }

    fn process(define: &ParsedDefineXml, refs: Vec<ItemRef>, codes: &[&str]) -> Vec<VlmItemRef> {
        process_parameter_item_refs(
            &value_list(refs),
            define,
            &mapping(codes),
            "ADLB",
            &VlmOptions::default(),
        )
    }

    #[test]
    fn test_unscoped_ref_fans_out_to_every_parameter() {
        let define = document();
        let codes = ["ALB", "ALT", "BILI", "CREAT", "GLUC"];
        let refs = process(&define, vec![item_ref("IT.ADLB.AVAL", None)], &codes);
        assert_eq!(refs.len(), 5);
        assert_eq!(
            refs.iter().map(|r| r.paramcd.as_str()).collect::<Vec<_>>(),
            codes
        );
        for entry in &refs {
            assert_eq!(entry.method, refs[0].method);
            assert_eq!(entry.codelist, refs[0].codelist);
            assert_eq!(entry.origin, refs[0].origin);
            assert!(entry.where_clause.is_none());
            assert!(entry.special_variables.is_empty());
            assert!(entry.mandatory);
            assert_eq!(entry.order_number, 3);
            assert_eq!(entry.value_list_oid.as_deref(), Some("VL.ADLB.AVAL"));
        }
        let info = refs[1].param_info.as_ref().unwrap();
        assert_eq!(info.decode, "ALT label");
        assert_eq!(info.ordinal, 3);
    }

    #[test]
    fn test_resolved_details() {
        let define = document();
        let refs = process(&define, vec![item_ref("IT.ADLB.AVAL", None)], &["ALB"]);
        let entry = &refs[0];

        let method = entry.method.as_ref().unwrap();
        assert_eq!(method.method_type.as_deref(), Some("Computation"));
        assert_eq!(method.translated_text.as_deref(), Some("AVAL = LBSTRESN"));

        let codelist = entry.codelist.as_ref().unwrap();
        let values: Vec<_> = codelist
            .items
            .iter()
            .map(|item| (item.coded_value.as_str(), item.decode.as_str(), item.is_extended))
            .collect();
        assert_eq!(values, vec![("Y", "Yes", true), ("N", "N", false)]);

        let origin = entry.origin.as_ref().unwrap();
        assert_eq!(origin.origin_type, "Derived");
        assert_eq!(origin.translated_text.as_deref(), Some("From LBSTRESN"));
        assert_eq!(origin.description.as_deref(), Some("Analysis Value"));

        assert_eq!(entry.comment.as_ref().unwrap().oid, "COM.AVAL");
    }

    #[test]
    fn test_where_clause_selects_listed_parameters_keeping_duplicates() {
        let define = document();
        let refs = process(
            &define,
            vec![item_ref("IT.ADLB.AVAL", Some("WC.ALB"))],
            &["ALB", "ALT"],
        );
        assert_eq!(refs.len(), 2);
        assert!(refs.iter().all(|r| r.paramcd == "ALB"));
        let where_clause = refs[0].where_clause.as_ref().unwrap();
        assert_eq!(where_clause.where_clause_oid, "WC.ALB");
        assert_eq!(where_clause.oid, "IT.ADLB.AVAL");
        assert_eq!(where_clause.source.variable, "PARAMCD");
        assert_eq!(where_clause.source.domain, "ADLB");
    }

    #[test]
    fn test_stratified_clause_applies_to_all_parameters() {
        let define = document();
        let refs = process(
            &define,
            vec![item_ref("IT.ADLB.AVAL", Some("WC.CHEM"))],
            &["ALB", "ALT", "GLUC"],
        );
        assert_eq!(refs.len(), 3);
        for entry in &refs {
            let strat = entry.stratification_info.as_ref().unwrap();
            assert_eq!(strat["PARCAT1"].values, vec!["CHEMISTRY"]);
            assert_eq!(
                entry.where_clause.as_ref().unwrap().source.variable,
                "PARCAT1"
            );
            assert!(entry.is_parameterized());
        }
    }

    #[test]
    fn test_unresolvable_refs_are_skipped() {
        let define = document();
        let refs = process(
            &define,
            vec![
                item_ref("IT.ADLB.NOPE", None),
                item_ref("IT.ADLB.AVAL", Some("WC.UNKNOWN")),
                ItemRef::default(),
            ],
            &["ALB"],
        );
        assert!(refs.is_empty());
    }

    #[test]
    fn test_orphaned_method_leaves_method_empty() {
        let define = document();
        let mut orphan = item_ref("IT.ADLB.AVAL", None);
        orphan.method_oid = Some("MT.GONE".to_string());
        let refs = process(&define, vec![orphan], &["ALB"]);
        assert_eq!(refs[0].method_oid.as_deref(), Some("MT.GONE"));
        assert!(refs[0].method.is_none());
    }

    #[test]
    fn test_without_parameters_emits_non_parameterized_entry() {
        let define = document();
        let refs = process(&define, vec![item_ref("IT.ADLB.AVAL", None)], &[]);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].paramcd, NON_PARAMETERIZED);
        assert!(refs[0].is_non_parameterized);
        assert!(refs[0].param_info.is_none());
    }
}
