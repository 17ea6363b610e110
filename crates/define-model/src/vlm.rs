//! Value-level metadata (VLM) output types.
//!
//! A [`ProcessedVlm`] is derived per (document, dataset) pair. It maps each
//! variable that has value-level metadata to the ordered list of
//! [`VlmItemRef`]s, one per (variable, parameter code) pair.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::document::Comparator;

/// Parameter code of entries that apply regardless of PARAMCD.
pub const NON_PARAMETERIZED: &str = "*";

/// Parameter selector variable of BDS datasets.
pub const PARAMCD: &str = "PARAMCD";

/// Decoded parameter label variable of BDS datasets.
pub const PARAM: &str = "PARAM";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamInfo {
    pub ordinal: u32,
    pub coded_value: String,
    pub decode: String,
    pub is_external: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhereClauseSource {
    pub domain: String,
    pub variable: String,
}

/// Primary display condition of an item ref.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlmWhereClause {
    pub comparator: Comparator,
    pub check_values: Vec<String>,
    pub where_clause_oid: String,
    /// OID of the item the condition is attached to.
    pub oid: String,
    pub source: WhereClauseSource,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    #[serde(rename = "type")]
    pub method_type: Option<String>,
    pub description: Option<String>,
    pub translated_text: Option<String>,
    pub document: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodelistEntry {
    pub coded_value: String,
    pub decode: String,
    pub is_extended: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodelistInfo {
    pub oid: String,
    pub name: Option<String>,
    pub items: Vec<CodelistEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginInfo {
    #[serde(rename = "type")]
    pub origin_type: String,
    pub source: Option<String>,
    pub description: Option<String>,
    pub translated_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentInfo {
    pub oid: String,
    pub description: Option<String>,
}

/// Comparator and values of a stratification condition (DTYPE, PARCAT, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stratification {
    pub comparator: Comparator,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlmItemRef {
    /// Parameter code, or [`NON_PARAMETERIZED`].
    pub paramcd: String,
    pub param_info: Option<ParamInfo>,
    pub where_clause: Option<VlmWhereClause>,
    pub method_oid: Option<String>,
    pub method: Option<MethodInfo>,
    pub value_list_oid: Option<String>,
    /// OID of the resolved ItemDef.
    pub oid: Option<String>,
    pub codelist: Option<CodelistInfo>,
    pub origin: Option<OriginInfo>,
    pub comment: Option<CommentInfo>,
    pub item_description: Option<String>,
    pub mandatory: bool,
    pub order_number: u32,
    pub special_variables: IndexMap<String, String>,
    pub stratification_info: Option<IndexMap<String, Stratification>>,
    pub is_non_parameterized: bool,
}

impl VlmItemRef {
    /// Minimal entry for a parameter code; used for synthesized PARAM/PARAMCD rows.
    pub fn for_parameter(paramcd: impl Into<String>, param_info: ParamInfo) -> Self {
        Self {
            paramcd: paramcd.into(),
            param_info: Some(param_info),
            where_clause: None,
            method_oid: None,
            method: None,
            value_list_oid: None,
            oid: None,
            codelist: None,
            origin: None,
            comment: None,
            item_description: None,
            mandatory: false,
            order_number: 0,
            special_variables: IndexMap::new(),
            stratification_info: None,
            is_non_parameterized: false,
        }
    }

    pub fn is_parameterized(&self) -> bool {
        self.paramcd != NON_PARAMETERIZED
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlmValueList {
    pub oid: String,
    pub description: Option<String>,
    pub item_refs: Vec<VlmItemRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlmVariable {
    pub name: String,
    pub value_list_def: VlmValueList,
}

impl VlmVariable {
    pub fn new(name: impl Into<String>, oid: impl Into<String>, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            value_list_def: VlmValueList {
                oid: oid.into(),
                description,
                item_refs: Vec::new(),
            },
        }
    }

    pub fn item_refs(&self) -> &[VlmItemRef] {
        &self.value_list_def.item_refs
    }

    /// Parameter codes this variable has metadata for, excluding `*`.
    pub fn covered_paramcds(&self) -> IndexSet<&str> {
        self.item_refs()
            .iter()
            .filter(|item| item.is_parameterized())
            .map(|item| item.paramcd.as_str())
            .collect()
    }
}

/// Value-level metadata of one dataset, variables in discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedVlm {
    pub dataset: String,
    pub variables: IndexMap<String, VlmVariable>,
}

impl ProcessedVlm {
    pub fn new(dataset: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            variables: IndexMap::new(),
        }
    }

    pub fn variable(&self, name: &str) -> Option<&VlmVariable> {
        self.variables.get(name)
    }

    /// Distinct parameter codes of the PARAMCD variable, in order.
    pub fn paramcds(&self) -> IndexSet<&str> {
        self.variables
            .get(PARAMCD)
            .map(VlmVariable::covered_paramcds)
            .unwrap_or_default()
    }

    pub fn has_non_parameterized(&self) -> bool {
        self.variables
            .values()
            .any(|variable| variable.item_refs().iter().any(|item| item.is_non_parameterized))
    }
}

/// One resolved condition of a where clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhereCondition {
    pub variable: String,
    pub comparator: Comparator,
    pub values: Vec<String>,
}

/// Where-clause resolution against a target dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhereClauseResult {
    /// Parameter codes selected by `PARAMCD EQ/IN` conditions.
    pub paramcds: Vec<String>,
    /// Every surviving condition, in source order.
    pub conditions: Vec<WhereCondition>,
    pub stratification_variables: IndexMap<String, Stratification>,
    /// Other variables, values joined with `,`.
    pub special_variables: IndexMap<String, String>,
}
