//! Where-clause resolution against a target dataset.

use define_model::{
    PARAMCD, Stratification, WhereClauseDef, WhereClauseResult, WhereCondition,
    normalize_dataset_id,
};

use crate::options::VlmOptions;

/// Resolve `oid` for `dataset`.
///
/// Returns `None` only when no definition has that OID. Range checks whose
/// item OID is not `IT.<dataset>.<variable>` or that target another dataset
/// are dropped.
pub fn resolve_where_clause(
    oid: &str,
    defs: &[WhereClauseDef],
    dataset: &str,
    options: &VlmOptions,
) -> Option<WhereClauseResult> {
    let Some(def) = defs.iter().find(|def| def.oid == oid) else {
        tracing::warn!(oid, "No WhereClauseDef found");
        return None;
    };
    Some(resolve_where_clause_def(def, dataset, options))
}

/// Resolve an already looked-up definition for `dataset`.
pub fn resolve_where_clause_def(
    def: &WhereClauseDef,
    dataset: &str,
    options: &VlmOptions,
) -> WhereClauseResult {
    let oid = def.oid.as_str();
    let mut result = WhereClauseResult::default();
    if def.range_checks.is_empty() {
        tracing::debug!(oid, "WhereClauseDef has no range checks");
        return result;
    }

    let target = normalize_dataset_id(dataset);
    for check in &def.range_checks {
        let parts: Vec<&str> = check.item_oid.split('.').collect();
        let [_, check_dataset, variable] = parts[..] else {
            tracing::warn!(oid, item_oid = %check.item_oid, "Invalid ItemOID format");
            continue;
        };
        if normalize_dataset_id(check_dataset) != target {
            tracing::warn!(
                oid,
                expected = %target,
                found = check_dataset,
                "Range check targets another dataset"
            );
            continue;
        }

        result.conditions.push(WhereCondition {
            variable: variable.to_string(),
            comparator: check.comparator,
            values: check.check_values.clone(),
        });

        if variable == PARAMCD {
            // Exclusion comparators never enumerate a parameter set.
            if check.comparator.is_inclusive() {
                result.paramcds.extend(check.check_values.iter().cloned());
            }
        } else if options.is_stratification(variable) {
            result.stratification_variables.insert(
                variable.to_string(),
                Stratification {
                    comparator: check.comparator,
                    values: check.check_values.clone(),
                },
            );
        } else {
            result
                .special_variables
                .insert(variable.to_string(), check.check_values.join(","));
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use define_model::{Comparator, RangeCheck};

    fn check(item_oid: &str, comparator: Comparator, values: &[&str]) -> RangeCheck {
        RangeCheck {
            comparator,
            item_oid: item_oid.to_string(),
            check_values: values.iter().map(|v| (*v).to_string()).collect(),
            ..RangeCheck::default()
        }
    }

    fn def(oid: &str, range_checks: Vec<RangeCheck>) -> WhereClauseDef {
        WhereClauseDef {
            oid: oid.to_string(),
            comment_oid: None,
            range_checks,
        }
    }

    fn resolve(defs: &[WhereClauseDef], oid: &str) -> Option<WhereClauseResult> {
        resolve_where_clause(oid, defs, "ADLB", &VlmOptions::default())
    }

    #[test]
    fn test_in_selects_parameters() {
        let defs = vec![def(
            "WC.ADLB.PARAMCD.IN.ALB",
            vec![check("IT.ADLB.PARAMCD", Comparator::In, &["ALB", "ALT"])],
        )];
        let result = resolve(&defs, "WC.ADLB.PARAMCD.IN.ALB").unwrap();
        assert_eq!(result.paramcds, vec!["ALB", "ALT"]);
        assert_eq!(result.conditions.len(), 1);
        assert_eq!(result.conditions[0].variable, "PARAMCD");
        assert_eq!(result.conditions[0].comparator, Comparator::In);
    }

    #[test]
    fn test_exclusion_does_not_select() {
        let defs = vec![def(
            "WC.1",
            vec![check("IT.ADLB.PARAMCD", Comparator::NotIn, &["ALB"])],
        )];
        let result = resolve(&defs, "WC.1").unwrap();
        assert!(result.paramcds.is_empty());
        assert_eq!(result.conditions.len(), 1);
    }

    #[test]
    fn test_classification() {
        let defs = vec![def(
            "WC.1",
            vec![
                check("IT.ADLB.PARCAT1", Comparator::Eq, &["CHEMISTRY"]),
                check("IT.ADLB.DTYPE", Comparator::Eq, &["AVERAGE"]),
                check("IT.ADLB.AVISIT", Comparator::In, &["Week 2", "Week 4"]),
                check("IT.ADLB.PARAMCD", Comparator::Eq, &["ALB"]),
            ],
        )];
        let result = resolve(&defs, "WC.1").unwrap();
        assert_eq!(result.paramcds, vec!["ALB"]);
        assert!(!result.paramcds.contains(&"CHEMISTRY".to_string()));
        assert_eq!(
            result.stratification_variables.keys().collect::<Vec<_>>(),
            vec!["PARCAT1", "DTYPE"]
        );
        assert_eq!(
            result.special_variables.get("AVISIT").map(String::as_str),
            Some("Week 2,Week 4")
        );
        assert_eq!(result.conditions.len(), 4);
    }

    #[test]
    fn test_malformed_and_foreign_checks_are_dropped() {
        let defs = vec![def(
            "WC.1",
            vec![
                check("IT.ADVS.PARAMCD", Comparator::Eq, &["SYSBP"]),
                check("IT.ADLB.PARAMCD.EXTRA", Comparator::Eq, &["ALB"]),
                check("", Comparator::Eq, &[]),
                check("IT.adlb.PARAMCD", Comparator::Eq, &["ALT"]),
            ],
        )];
        let result = resolve(&defs, "WC.1").unwrap();
        assert_eq!(result.paramcds, vec!["ALT"]);
        assert_eq!(result.conditions.len(), 1);
    }

    #[test]
    fn test_unknown_and_empty_clauses() {
        let defs = vec![def("WC.EMPTY", Vec::new())];
        assert!(resolve(&defs, "WC.MISSING").is_none());
        assert_eq!(resolve(&defs, "WC.EMPTY"), Some(WhereClauseResult::default()));
    }

    #[test]
    fn test_resolving_a_looked_up_definition() {
        let clause = def(
            "WC.ADLB.PARAMCD.IN.ALB",
            vec![check("IT.ADLB.PARAMCD", Comparator::In, &["ALB", "ALT"])],
        );
        let direct = resolve_where_clause_def(&clause, "ADLB", &VlmOptions::default());
        assert_eq!(direct.paramcds, vec!["ALB", "ALT"]);
        assert_eq!(
            resolve(std::slice::from_ref(&clause), "WC.ADLB.PARAMCD.IN.ALB"),
            Some(direct)
        );
    }

    #[test]
    fn test_custom_stratification_variables() {
        let defs = vec![def(
            "WC.1",
            vec![check("IT.ADLB.AVISIT", Comparator::Eq, &["Week 2"])],
        )];
        let options = VlmOptions {
            stratification_variables: vec!["AVISIT".to_string()],
            ..VlmOptions::default()
        };
        let result = resolve_where_clause("WC.1", &defs, "ADLB", &options).unwrap();
        assert!(result.special_variables.is_empty());
        assert!(result.stratification_variables.contains_key("AVISIT"));
    }
}
