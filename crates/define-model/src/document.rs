//! Typed Define-XML document graph.
//!
//! Every attribute that may be absent in the source document is an `Option`.
//! A [`ParsedDefineXml`] is built once per file and never mutated afterwards;
//! downstream consumers only borrow it.
//!
//! ## OID conventions
//!
//! - ItemDef: `IT.<dataset>.<variable>[.<suffix>]`
//! - ValueListDef: `VL.<dataset>.<variable>`
//! - WhereClauseDef: `WC.<dataset>.<var1>.<op1>.<val1>[...]`

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dataset::normalize_dataset_id;
use crate::error::ModelError;

/// Literal used by Define-XML for affirmative flags (`Mandatory`, `def:Common`, ...).
pub const YES: &str = "Yes";

/// Study-level identification from `Study/GlobalVariables`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Study {
    pub oid: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub protocol_name: Option<String>,
}

/// The single `MetaDataVersion` element anchoring all other definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaData {
    pub oid: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub define_version: Option<String>,
}

/// `def:Standard` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standard {
    pub oid: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub standard_type: Option<String>,
    pub status: Option<String>,
    pub version: Option<String>,
    pub publishing_set: Option<String>,
    pub comment_oid: Option<String>,
}

/// Reference from an ItemGroupDef or ValueListDef to an ItemDef.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    /// The referenced `ItemOID`.
    pub oid: Option<String>,
    pub mandatory: Option<String>,
    pub order_number: Option<String>,
    pub method_oid: Option<String>,
    pub role: Option<String>,
    pub where_clause_oid: Option<String>,
    pub key_sequence: Option<String>,
    pub role_code_list_oid: Option<String>,
}

impl ItemRef {
    /// `Mandatory="Yes"`.
    pub fn is_mandatory(&self) -> bool {
        self.mandatory.as_deref() == Some(YES)
    }

    /// Parsed `OrderNumber`, defaulting to 0 when absent or not numeric.
    pub fn order(&self) -> u32 {
        self.order_number
            .as_deref()
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(0)
    }
}

/// `ItemGroupDef`: a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemGroup {
    pub oid: Option<String>,
    pub name: Option<String>,
    pub sas_dataset_name: Option<String>,
    pub repeating: Option<String>,
    pub purpose: Option<String>,
    pub is_reference_data: Option<String>,
    pub standard_oid: Option<String>,
    pub structure: Option<String>,
    pub archive_location_id: Option<String>,
    pub comment_oid: Option<String>,
    pub description: Option<String>,
    /// e.g. `BASIC DATA STRUCTURE`.
    pub class: Option<String>,
    /// Variable membership in document order.
    pub item_refs: Vec<ItemRef>,
}

/// Dataset class that carries parameter-level metadata.
pub const BASIC_DATA_STRUCTURE: &str = "BASIC DATA STRUCTURE";

impl ItemGroup {
    /// Name shown to users: `SASDatasetName`, falling back to `Name`.
    pub fn display_name(&self) -> &str {
        self.sas_dataset_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .or(self.name.as_deref())
            .unwrap_or("")
    }

    pub fn is_repeating(&self) -> bool {
        self.repeating
            .as_deref()
            .is_some_and(|value| value.eq_ignore_ascii_case("yes"))
    }

    /// Item refs ordered by `OrderNumber` (stable for equal numbers).
    pub fn sorted_item_refs(&self) -> Vec<&ItemRef> {
        let mut refs: Vec<&ItemRef> = self.item_refs.iter().collect();
        refs.sort_by_key(|item_ref| item_ref.order());
        refs
    }

    /// BDS datasets are the ones with parameter-dependent metadata.
    pub fn is_vlm_eligible(&self) -> bool {
        self.class
            .as_deref()
            .is_some_and(|class| class.trim().eq_ignore_ascii_case(BASIC_DATA_STRUCTURE))
    }

    /// True when `Name`, `SASDatasetName` or the OID's dataset segment
    /// normalize-equal `dataset`.
    pub fn matches_dataset(&self, dataset: &str) -> bool {
        let target = normalize_dataset_id(dataset);
        if target.is_empty() {
            return false;
        }
        let oid_segment = self
            .oid
            .as_deref()
            .and_then(|oid| oid.split('.').nth(1));
        [self.name.as_deref(), self.sas_dataset_name.as_deref(), oid_segment]
            .into_iter()
            .flatten()
            .any(|candidate| normalize_dataset_id(candidate) == target)
    }
}

/// Broad classification of `ItemDef.DataType`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataTypeClass {
    Numeric,
    Text,
    Other(String),
    Unknown,
}

/// `ItemDef`: a variable (or a value-level variant of one).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDef {
    pub oid: Option<String>,
    /// Second OID segment.
    pub dataset: Option<String>,
    pub name: Option<String>,
    pub sas_field_name: Option<String>,
    pub data_type: Option<String>,
    pub length: Option<String>,
    pub description: Option<String>,
    pub origin_type: Option<String>,
    /// Text of `Origin/Description/TranslatedText`.
    pub origin: Option<String>,
    pub origin_source: Option<String>,
    pub code_list_oid: Option<String>,
    pub significant_digits: Option<String>,
    /// `def:DisplayFormat`.
    pub format: Option<String>,
    pub has_no_data: Option<String>,
    pub comment_oid: Option<String>,
    pub assigned_value: Option<String>,
    /// `Some(true)` only for `def:Common="Yes"`; never `Some(false)`.
    pub common: Option<bool>,
    pub pages: Option<String>,
    pub developer_notes: Option<String>,
}

impl ItemDef {
    /// Dataset segment of an item OID (`IT.ADLB.AVAL` -> `ADLB`).
    pub fn dataset_from_oid(oid: &str) -> Option<String> {
        oid.split('.')
            .nth(1)
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
    }

    pub fn is_derived(&self) -> bool {
        self.origin_type.as_deref() == Some("Derived")
    }

    pub fn effective_data_type(&self) -> DataTypeClass {
        match self.data_type.as_deref().map(str::to_uppercase) {
            None => DataTypeClass::Unknown,
            Some(value) => match value.as_str() {
                "INTEGER" | "FLOAT" => DataTypeClass::Numeric,
                "TEXT" | "STRING" => DataTypeClass::Text,
                "" => DataTypeClass::Unknown,
                _ => DataTypeClass::Other(value),
            },
        }
    }
}

/// `MethodDef`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    pub oid: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub method_type: Option<String>,
    pub description: Option<String>,
    /// `leafID` of the attached `def:DocumentRef`.
    pub document: Option<String>,
    pub pages: Option<String>,
}

/// `def:CommentDef`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub oid: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    pub name: Option<String>,
    pub context: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decode {
    pub translated_text: Option<String>,
    pub lang: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeListItem {
    pub coded_value: Option<String>,
    pub order_number: Option<String>,
    pub rank: Option<String>,
    pub extended_value: bool,
    pub decode: Option<Decode>,
    pub aliases: Vec<Alias>,
}

impl CodeListItem {
    pub fn decode_text(&self) -> Option<&str> {
        self.decode.as_ref()?.translated_text.as_deref()
    }
}

/// Coded value without a separate decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumeratedItem {
    pub coded_value: Option<String>,
    pub order_number: Option<String>,
    pub aliases: Vec<Alias>,
}

/// `CodeList` with inline values. Codelists wrapping an `ExternalCodeList`
/// become [`Dictionary`] entries instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeList {
    pub oid: Option<String>,
    pub name: Option<String>,
    pub data_type: Option<String>,
    pub sas_format_name: Option<String>,
    pub standard_oid: Option<String>,
    pub is_non_standard: Option<String>,
    pub extended_value: Option<bool>,
    pub code_list_items: Vec<CodeListItem>,
    pub enumerated_items: Vec<EnumeratedItem>,
    pub aliases: Vec<Alias>,
}

impl CodeList {
    /// Decode of a `CodeListItem`; enumerated items have none.
    pub fn find_decode(&self, coded_value: &str) -> Option<&str> {
        self.code_list_items
            .iter()
            .find(|item| item.coded_value.as_deref() == Some(coded_value))
            .and_then(CodeListItem::decode_text)
    }

    /// All coded values, codelist items first.
    pub fn valid_values(&self) -> Vec<&str> {
        self.code_list_items
            .iter()
            .filter_map(|item| item.coded_value.as_deref())
            .chain(
                self.enumerated_items
                    .iter()
                    .filter_map(|item| item.coded_value.as_deref()),
            )
            .collect()
    }

    pub fn is_enumerated(&self) -> bool {
        !self.enumerated_items.is_empty()
    }
}

/// Codelist that references an external dictionary (MedDRA, WHODrug, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dictionary {
    pub oid: Option<String>,
    pub name: Option<String>,
    pub data_type: Option<String>,
    pub dictionary: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Comparator {
    #[default]
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
}

impl Comparator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Eq => "EQ",
            Comparator::Ne => "NE",
            Comparator::Lt => "LT",
            Comparator::Le => "LE",
            Comparator::Gt => "GT",
            Comparator::Ge => "GE",
            Comparator::In => "IN",
            Comparator::NotIn => "NOTIN",
        }
    }

    /// `EQ` and `IN` enumerate the values they match.
    pub fn is_inclusive(&self) -> bool {
        matches!(self, Comparator::Eq | Comparator::In)
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Comparator {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EQ" => Ok(Comparator::Eq),
            "NE" => Ok(Comparator::Ne),
            "LT" => Ok(Comparator::Lt),
            "LE" => Ok(Comparator::Le),
            "GT" => Ok(Comparator::Gt),
            "GE" => Ok(Comparator::Ge),
            "IN" => Ok(Comparator::In),
            "NOTIN" => Ok(Comparator::NotIn),
            other => Err(ModelError::InvalidComparator(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoftHard {
    #[default]
    Soft,
    Hard,
}

impl FromStr for SoftHard {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Soft" => Ok(SoftHard::Soft),
            "Hard" => Ok(SoftHard::Hard),
            other => Err(ModelError::InvalidSoftHard(other.to_string())),
        }
    }
}

/// A single condition of a where clause.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeCheck {
    pub comparator: Comparator,
    pub soft_hard: SoftHard,
    /// `IT.<dataset>.<variable>`; empty when the source omitted it.
    pub item_oid: String,
    pub check_values: Vec<String>,
}

/// `def:WhereClauseDef`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhereClauseDef {
    pub oid: String,
    pub comment_oid: Option<String>,
    pub range_checks: Vec<RangeCheck>,
}

/// `def:ValueListDef`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueListDef {
    pub oid: Option<String>,
    pub item_refs: Vec<ItemRef>,
    pub description: Option<String>,
}

/// `def:leaf` document reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: Option<String>,
    pub title: Option<String>,
    pub href: Option<String>,
}

/// `arm:AnalysisResult` flattened with its enclosing result display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub display: Option<String>,
    pub id: Option<String>,
    pub description: Option<String>,
    /// Comma-joined analysis variable OIDs.
    pub variables: Option<String>,
    pub reason: Option<String>,
    pub purpose: Option<String>,
    /// Comma-joined where-clause OIDs.
    pub selection_criteria: Option<String>,
    pub documentation: Option<String>,
    pub documentation_refs: Option<String>,
    pub programming_context: Option<String>,
    pub programming_document: Option<String>,
    pub pages: Option<String>,
}

impl AnalysisResult {
    pub fn analysis_variables(&self) -> Vec<&str> {
        self.variables
            .as_deref()
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_programming_code(&self) -> bool {
        self.programming_document.is_some()
    }
}

/// Output of the Define-XML parser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDefineXml {
    pub study: Study,
    pub meta_data: MetaData,
    pub standards: Vec<Standard>,
    pub item_groups: Vec<ItemGroup>,
    pub item_defs: Vec<ItemDef>,
    pub methods: Vec<Method>,
    pub comments: Vec<Comment>,
    pub item_refs: Vec<ItemRef>,
    pub code_lists: Vec<CodeList>,
    pub dictionaries: Vec<Dictionary>,
    pub where_clause_defs: Vec<WhereClauseDef>,
    pub value_list_defs: Vec<ValueListDef>,
    pub documents: Vec<Document>,
    pub analysis_results: Vec<AnalysisResult>,
}

impl ParsedDefineXml {
    pub fn item_def(&self, oid: &str) -> Option<&ItemDef> {
        self.item_defs
            .iter()
            .find(|def| def.oid.as_deref() == Some(oid))
    }

    pub fn code_list(&self, oid: &str) -> Option<&CodeList> {
        self.code_lists
            .iter()
            .find(|list| list.oid.as_deref() == Some(oid))
    }

    pub fn method(&self, oid: &str) -> Option<&Method> {
        self.methods
            .iter()
            .find(|method| method.oid.as_deref() == Some(oid))
    }

    pub fn comment(&self, oid: &str) -> Option<&Comment> {
        self.comments
            .iter()
            .find(|comment| comment.oid.as_deref() == Some(oid))
    }

    pub fn where_clause_def(&self, oid: &str) -> Option<&WhereClauseDef> {
        self.where_clause_defs.iter().find(|def| def.oid == oid)
    }

    /// First dataset whose name, SAS name or OID matches `dataset`.
    pub fn item_group(&self, dataset: &str) -> Option<&ItemGroup> {
        self.item_groups
            .iter()
            .find(|group| group.matches_dataset(dataset))
    }

    pub fn is_adam(&self) -> bool {
        self.meta_data
            .oid
            .as_deref()
            .is_some_and(|oid| oid.contains("ADaM"))
    }

    pub fn is_sdtm(&self) -> bool {
        self.meta_data
            .oid
            .as_deref()
            .is_some_and(|oid| oid.contains("SDTM"))
    }
}
