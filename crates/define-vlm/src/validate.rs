//! Consistency checks over a processed VLM.
//!
//! Findings are advisory: they are logged and collected into a
//! [`VlmReport`], never turned into errors.

use std::fmt;

use define_model::{PARAM, PARAMCD, ProcessedVlm};
use indexmap::IndexMap;
use serde::Serialize;

use crate::options::VlmOptions;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationWarning {
    /// PARAMCD or PARAM absent.
    MissingVariable { variable: String },
    NoItemRefs { variable: String },
    /// Parameter codes known from PARAMCD without an entry for `variable`.
    CoverageGap {
        variable: String,
        missing: Vec<String>,
    },
    DuplicateParameters {
        variable: String,
        paramcds: Vec<String>,
    },
    OrphanedMethod {
        variable: String,
        paramcd: String,
        method_oid: String,
    },
    EmptyDescriptions { variable: String, count: usize },
}

impl ValidationWarning {
    pub fn variable(&self) -> &str {
        match self {
            Self::MissingVariable { variable }
            | Self::NoItemRefs { variable }
            | Self::CoverageGap { variable, .. }
            | Self::DuplicateParameters { variable, .. }
            | Self::OrphanedMethod { variable, .. }
            | Self::EmptyDescriptions { variable, .. } => variable,
        }
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingVariable { variable } => {
                write!(f, "{variable} variable is missing in VLM")
            }
            Self::NoItemRefs { variable } => write!(f, "variable {variable} has no item refs"),
            Self::CoverageGap { variable, missing } => write!(
                f,
                "variable {variable} is missing definitions for {} parameters",
                missing.len()
            ),
            Self::DuplicateParameters { variable, paramcds } => write!(
                f,
                "variable {variable} has duplicate definitions for parameters: {}",
                paramcds.join(", ")
            ),
            Self::OrphanedMethod {
                variable,
                paramcd,
                method_oid,
            } => write!(
                f,
                "item ref for {variable} (PARAMCD={paramcd}) references method {method_oid} which is not defined"
            ),
            Self::EmptyDescriptions { variable, count } => write!(
                f,
                "variable {variable} has {count} item refs with empty descriptions"
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VlmReport {
    pub warnings: Vec<ValidationWarning>,
}

impl VlmReport {
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    fn push(&mut self, warning: ValidationWarning) {
        tracing::warn!("Validation warning: {warning}");
        self.warnings.push(warning);
    }
}

pub fn validate_vlm(vlm: &ProcessedVlm, options: &VlmOptions) -> VlmReport {
    let mut report = VlmReport::default();

    for required in [PARAMCD, PARAM] {
        if !vlm.variables.contains_key(required) {
            report.push(ValidationWarning::MissingVariable {
                variable: required.to_string(),
            });
        }
    }

    for (name, variable) in &vlm.variables {
        if variable.item_refs().is_empty() {
            report.push(ValidationWarning::NoItemRefs {
                variable: name.clone(),
            });
        }
    }

    if vlm.variables.contains_key(PARAMCD) {
        let all_paramcds = vlm.paramcds();
        for (name, variable) in &vlm.variables {
            if name == PARAMCD || name == PARAM {
                continue;
            }
            let covered = variable.covered_paramcds();
            let missing: Vec<String> = all_paramcds
                .iter()
                .filter(|paramcd| !covered.contains(*paramcd))
                .map(|paramcd| (*paramcd).to_string())
                .collect();
            if missing.is_empty() {
                continue;
            }
            let shown = missing.len().min(options.missing_detail_limit);
            let ellipsis = if missing.len() > shown { "..." } else { "" };
            tracing::warn!(
                variable = %name,
                "Missing parameters: {}{ellipsis}",
                missing[..shown].join(", ")
            );
            report.push(ValidationWarning::CoverageGap {
                variable: name.clone(),
                missing,
            });
        }
    }

    for (name, variable) in &vlm.variables {
        let mut counts: IndexMap<&str, usize> = IndexMap::new();
        for item in variable.item_refs().iter().filter(|item| item.is_parameterized()) {
            *counts.entry(item.paramcd.as_str()).or_default() += 1;
        }
        let duplicates: Vec<String> = counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(paramcd, _)| paramcd.to_string())
            .collect();
        if !duplicates.is_empty() {
            report.push(ValidationWarning::DuplicateParameters {
                variable: name.clone(),
                paramcds: duplicates,
            });
        }
    }

    for (name, variable) in &vlm.variables {
        for item in variable.item_refs() {
            if let (Some(method_oid), None) = (&item.method_oid, &item.method) {
                report.push(ValidationWarning::OrphanedMethod {
                    variable: name.clone(),
                    paramcd: item.paramcd.clone(),
                    method_oid: method_oid.clone(),
                });
            }
        }
    }

    for (name, variable) in &vlm.variables {
        let count = variable
            .item_refs()
            .iter()
            .filter(|item| {
                item.item_description
                    .as_deref()
                    .is_none_or(|text| text.trim().is_empty())
            })
            .count();
        if count > 0 {
            report.push(ValidationWarning::EmptyDescriptions {
                variable: name.clone(),
                count,
            });
        }
    }

    tracing::info!(
        dataset = %vlm.dataset,
        warnings = report.warning_count(),
        "VLM validation complete"
    );
    report
}
