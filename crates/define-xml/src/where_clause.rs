//! Where-clause OID decoding and check-value inference.
//!
//! Some Define-XML producers leave `RangeCheck/CheckValue` empty and encode
//! the condition only in the `WhereClauseDef` OID:
//!
//! ```text
//! WC.<dataset>.<var1>.<op1>.<val1>[.<var2>.<op2>.<val2>...]
//! ```
//!
//! [`infer_check_values`] recovers check values from such an OID. The rules
//! are lossy and tuned to specific dataset conventions; they are tried in a
//! fixed order and the first one that applies wins.

use define_model::{PARAMCD, same_dataset};

const MISSING: &str = "MISSING";
const LAB_DATASET: &str = "ADLB";
const LAB_CATEGORY: &str = "PARCAT1";

/// Terms decoded from a where-clause OID.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OidTerms {
    /// Second segment.
    pub dataset: Option<String>,
    pub variables: Vec<String>,
    pub operations: Vec<String>,
    pub values: Vec<String>,
}

impl OidTerms {
    /// Reads `(variable, operation, value)` triples from segment 2 onwards.
    /// A triple with any empty member is dropped; a trailing partial triple
    /// is ignored.
    pub fn parse(oid: &str) -> Self {
        let parts: Vec<&str> = oid.split('.').collect();
        let mut terms = Self {
            dataset: parts
                .get(1)
                .filter(|segment| !segment.is_empty())
                .map(|segment| (*segment).to_string()),
            ..Self::default()
        };
        for triple in parts.get(2..).unwrap_or_default().chunks(3) {
            if let [variable, operation, value] = triple
                && !variable.is_empty()
                && !operation.is_empty()
                && !value.is_empty()
            {
                terms.variables.push((*variable).to_string());
                terms.operations.push((*operation).to_string());
                terms.values.push((*value).to_string());
            }
        }
        terms
    }

    fn is_dataset(&self, dataset: &str) -> bool {
        self.dataset
            .as_deref()
            .is_some_and(|own| same_dataset(own, dataset))
    }

    fn position(&self, variable: &str) -> Option<usize> {
        self.variables.iter().position(|v| v == variable)
    }
}

/// Laboratory categories recognised inside an all-caps `PARCAT1` run.
const LAB_CATEGORIES: [&str; 8] = [
    "HEMATOLOGY",
    "CHEMISTRY",
    "URINALYSIS",
    "COAGULATION",
    "SEROLOGY",
    "IMMUNOLOGY",
    "MICROBIOLOGY",
    "TOXICOLOGY",
];

/// Splits wherever an uppercase letter starts a new word:
/// `HematologyChemistry` -> `["Hematology", "Chemistry"]`.
///
/// A run of capitals stays together unless its last capital begins a
/// lowercase word (`URINEColor` -> `["URINE", "Color"]`).
pub fn split_on_uppercase(value: &str) -> Vec<String> {
    let chars: Vec<char> = value.chars().collect();
    let mut tokens = Vec::new();
    let mut current = String::new();
    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() && !current.is_empty() {
            let after_upper = i > 0 && chars[i - 1].is_uppercase();
            let starts_word = chars.get(i + 1).is_some_and(|next| next.is_lowercase());
            if !after_upper || starts_word {
                tokens.push(std::mem::take(&mut current));
            }
        }
        current.push(ch);
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Splits `token` into known lab categories when they cover it exactly;
/// otherwise returns it whole.
fn split_lab_categories(token: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut rest = token;
    while !rest.is_empty() {
        let Some(category) = LAB_CATEGORIES
            .iter()
            .copied()
            .find(|category| rest.starts_with(category))
        else {
            return vec![token.to_string()];
        };
        parts.push(category.to_string());
        rest = &rest[category.len()..];
    }
    parts
}

/// Check values implied by the OID terms, or empty when no rule applies.
pub fn infer_check_values(terms: &OidTerms) -> Vec<String> {
    let lab = terms.is_dataset(LAB_DATASET);

    if lab && let Some(index) = terms.position(LAB_CATEGORY) {
        return split_on_uppercase(&terms.values[index])
            .iter()
            .flat_map(|token| split_lab_categories(&token.to_uppercase()))
            .collect();
    }
    if lab && terms.variables.iter().any(|v| v.starts_with("LB")) {
        return terms.values.clone();
    }
    if terms.operations.iter().any(|op| op == MISSING) {
        return vec![String::new()];
    }
    if let Some(visit) = terms
        .values
        .iter()
        .find(|value| value.contains("Week") || value.contains("Baseline"))
    {
        return split_on_uppercase(visit);
    }
    if let Some(index) = terms.position(PARAMCD) {
        return vec![terms.values[index].clone()];
    }
    if terms.variables.iter().any(|v| v.ends_with("FL")) {
        return vec!["Y".to_string()];
    }
    if let Some(index) = terms.variables.iter().position(|v| v.ends_with("DT")) {
        return if terms.operations[index] == MISSING {
            vec![String::new()]
        } else {
            vec![terms.values[index].clone()]
        };
    }
    terms.values.last().cloned().into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn infer(oid: &str) -> Vec<String> {
        infer_check_values(&OidTerms::parse(oid))
    }

    #[test]
    fn parses_triples_after_dataset() {
        let terms = OidTerms::parse("WC.ADVS.PARAMCD.EQ.SYSBP.AVISIT.EQ.Week2.DTYPE");
        assert_eq!(terms.dataset.as_deref(), Some("ADVS"));
        assert_eq!(terms.variables, vec!["PARAMCD", "AVISIT"]);
        assert_eq!(terms.operations, vec!["EQ", "EQ"]);
        assert_eq!(terms.values, vec!["SYSBP", "Week2"]);
    }

    #[test]
    fn drops_triples_with_empty_members() {
        let terms = OidTerms::parse("WC.ADSL..EQ.X.SAFFL.EQ.Y");
        assert_eq!(terms.variables, vec!["SAFFL"]);
        assert_eq!(OidTerms::parse("WC").dataset, None);
    }

    #[test]
    fn uppercase_boundaries() {
        assert_eq!(
            split_on_uppercase("HematologyChemistry"),
            vec!["Hematology", "Chemistry"]
        );
        assert_eq!(split_on_uppercase("week2"), vec!["week2"]);
        assert_eq!(split_on_uppercase("HEMATOLOGY"), vec!["HEMATOLOGY"]);
        assert_eq!(split_on_uppercase("URINEColor"), vec!["URINE", "Color"]);
        assert_eq!(split_on_uppercase("EndWeek4"), vec!["End", "Week4"]);
        assert!(split_on_uppercase("").is_empty());
    }

    #[test]
    fn lab_category_is_split_and_uppercased() {
        assert_eq!(
            infer("WC.ADLB.PARCAT1.EQ.HematologyChemistry"),
            vec!["HEMATOLOGY", "CHEMISTRY"]
        );
    }

    #[test]
    fn all_caps_lab_category_is_split_on_known_categories() {
        assert_eq!(
            infer("WC.ADLB.PARCAT1.EQ.HEMATOLOGYCHEMISTRY"),
            vec!["HEMATOLOGY", "CHEMISTRY"]
        );
        assert_eq!(infer("WC.ADLB.PARCAT1.EQ.CHEMISTRY"), vec!["CHEMISTRY"]);
        assert_eq!(infer("WC.ADLB.PARCAT1.EQ.SPECIALPANEL"), vec!["SPECIALPANEL"]);
    }

    #[test]
    fn lab_variables_use_raw_values() {
        assert_eq!(infer("WC.ADLB.LBCAT.EQ.URINE.LBSPEC.EQ.BLOOD"), vec!["URINE", "BLOOD"]);
    }

    #[test]
    fn rule_priority() {
        assert_eq!(infer("WC.ADVS.PARAMCD.EQ.SYSBP.AVAL.MISSING.X"), vec![""]);
        assert_eq!(infer("WC.ADVS.PARAMCD.EQ.SYSBP.AVISIT.EQ.EndWeek4"), vec!["End", "Week4"]);
        assert_eq!(infer("WC.ADVS.ANL01FL.EQ.Y1.PARAMCD.EQ.DIABP"), vec!["DIABP"]);
        assert_eq!(infer("WC.ADSL.SAFFL.EQ.Yes"), vec!["Y"]);
        assert_eq!(infer("WC.ADSL.TRTSDT.NE.Date1"), vec!["Date1"]);
        assert_eq!(infer("WC.ADSL.AGEGR1.EQ.Old"), vec!["Old"]);
        assert!(infer("WC.ADSL").is_empty());
    }
}
