//! Parameter-code by variable coverage grid and summary.

use std::fmt;

use define_model::{NON_PARAMETERIZED, PARAM, PARAMCD, ProcessedVlm};
use serde::Serialize;

pub const COVERED: &str = "✓";
pub const NOT_COVERED: &str = "-";
pub const NON_PARAMETER_LABEL: &str = "Non-Parameter Specific";

/// How many parameter codes [`summarize`] lists.
const SUMMARY_PARAMETERS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewRow {
    pub paramcd: String,
    /// Present when the VLM has a PARAM variable, or for the `*` row.
    pub param: Option<String>,
    /// One flag per [`TablePreview::columns`] entry.
    pub cells: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableCoverage {
    pub variable: String,
    pub covered: usize,
    pub total: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TablePreview {
    pub has_param: bool,
    /// Variables other than PARAMCD and PARAM, in VLM order.
    pub columns: Vec<String>,
    /// Optional leading `*` row, then one row per parameter code.
    pub rows: Vec<PreviewRow>,
    pub coverage: Vec<VariableCoverage>,
}

impl TablePreview {
    pub fn header(&self) -> Vec<&str> {
        let mut header = vec![PARAMCD];
        if self.has_param {
            header.push(PARAM);
        }
        header.extend(self.columns.iter().map(String::as_str));
        header
    }

    /// Row cells as display strings, aligned with [`Self::header`].
    pub fn cells(&self, row: &PreviewRow) -> Vec<String> {
        let mut cells = vec![row.paramcd.clone()];
        if self.has_param {
            cells.push(row.param.clone().unwrap_or_default());
        }
        cells.extend(
            row.cells
                .iter()
                .map(|covered| (if *covered { COVERED } else { NOT_COVERED }).to_string()),
        );
        cells
    }

    pub fn parameter_rows(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| row.paramcd != NON_PARAMETERIZED)
            .count()
    }
}

impl fmt::Display for TablePreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header().join(" | "))?;
        for row in &self.rows {
            writeln!(f, "{}", self.cells(row).join(" | "))?;
        }
        Ok(())
    }
}

pub fn build_preview(vlm: &ProcessedVlm) -> TablePreview {
    let paramcds = vlm.paramcds();
    let param_variable = vlm.variable(PARAM);
    let others: Vec<_> = vlm
        .variables
        .iter()
        .filter(|(name, _)| *name != PARAMCD && *name != PARAM)
        .collect();

    let mut rows = Vec::new();
    let non_parameterized: Vec<bool> = others
        .iter()
        .map(|(_, variable)| variable.item_refs().iter().any(|item| item.is_non_parameterized))
        .collect();
    if non_parameterized.contains(&true) {
        rows.push(PreviewRow {
            paramcd: NON_PARAMETERIZED.to_string(),
            param: Some(NON_PARAMETER_LABEL.to_string()),
            cells: non_parameterized,
        });
    }

    for paramcd in &paramcds {
        let param = param_variable.map(|variable| {
            variable
                .item_refs()
                .iter()
                .find(|item| item.paramcd == *paramcd)
                .and_then(|item| item.param_info.as_ref())
                .map(|info| info.decode.clone())
                .unwrap_or_default()
        });
        rows.push(PreviewRow {
            paramcd: (*paramcd).to_string(),
            param,
            cells: others
                .iter()
                .map(|(_, variable)| variable.item_refs().iter().any(|item| item.paramcd == *paramcd))
                .collect(),
        });
    }

    let total = paramcds.len();
    let coverage = others
        .iter()
        .map(|(name, variable)| {
            let covered = variable
                .covered_paramcds()
                .iter()
                .filter(|paramcd| paramcds.contains(*paramcd))
                .count();
            VariableCoverage {
                variable: (*name).clone(),
                covered,
                total,
                percent: if total == 0 {
                    0.0
                } else {
                    covered as f64 / total as f64 * 100.0
                },
            }
        })
        .collect();

    TablePreview {
        has_param: param_variable.is_some(),
        columns: others.iter().map(|(name, _)| (*name).clone()).collect(),
        rows,
        coverage,
    }
}

/// Logs the first rows of the grid and per-variable coverage.
pub fn log_preview(preview: &TablePreview, max_rows: usize) {
    tracing::debug!(
        columns = preview.columns.len(),
        parameters = preview.parameter_rows(),
        "Table structure preview"
    );
    tracing::debug!("  {}", preview.header().join(" | "));
    for row in preview.rows.iter().take(max_rows) {
        tracing::debug!("  {}", preview.cells(row).join(" | "));
    }
    if preview.rows.len() > max_rows {
        tracing::debug!("  ...and {} more rows", preview.rows.len() - max_rows);
    }
    for coverage in &preview.coverage {
        tracing::debug!(
            variable = %coverage.variable,
            covered = coverage.covered,
            total = coverage.total,
            "Coverage {:.1}%",
            coverage.percent
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VlmSummary {
    pub dataset: String,
    pub variable_count: usize,
    pub variables: Vec<String>,
    pub parameter_count: usize,
    pub has_non_parameterized: bool,
    /// First ten parameter codes.
    pub parameters: Vec<String>,
}

pub fn summarize(vlm: &ProcessedVlm) -> VlmSummary {
    let paramcds = vlm.paramcds();
    VlmSummary {
        dataset: vlm.dataset.clone(),
        variable_count: vlm.variables.len(),
        variables: vlm.variables.keys().cloned().collect(),
        parameter_count: paramcds.len(),
        has_non_parameterized: vlm.has_non_parameterized(),
        parameters: paramcds
            .iter()
            .take(SUMMARY_PARAMETERS)
            .map(|paramcd| (*paramcd).to_string())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use define_model::{ParamInfo, VlmItemRef, VlmVariable};

    fn entry(paramcd: &str, decode: &str) -> VlmItemRef {
        VlmItemRef::for_parameter(
            paramcd,
            ParamInfo {
                ordinal: 1,
                coded_value: paramcd.to_string(),
                decode: decode.to_string(),
                is_external: false,
            },
        )
    }

    fn add(vlm: &mut ProcessedVlm, name: &str, items: Vec<VlmItemRef>) {
        let mut variable = VlmVariable::new(name, format!("VL.ADLB.{name}"), None);
        variable.value_list_def.item_refs = items;
        vlm.variables.insert(name.to_string(), variable);
    }

    #[test]
    fn test_non_parameterized_row_leads() {
        let mut vlm = ProcessedVlm::new("ADSL");
        let mut global = entry(NON_PARAMETERIZED, "");
        global.param_info = None;
        global.is_non_parameterized = true;
        add(&mut vlm, "AGE", vec![global]);
        add(&mut vlm, "SEX", Vec::new());

        let preview = build_preview(&vlm);
        assert!(!preview.has_param);
        assert_eq!(preview.parameter_rows(), 0);
        assert_eq!(preview.rows.len(), 1);
        assert_eq!(preview.rows[0].param.as_deref(), Some(NON_PARAMETER_LABEL));
        assert_eq!(preview.rows[0].cells, vec![true, false]);
        assert_eq!(preview.coverage[0].percent, 0.0);
        assert_eq!(preview.to_string(), "PARAMCD | AGE | SEX\n* | ✓ | -\n");
    }

    #[test]
    fn test_summary_caps_parameter_list() {
        let mut vlm = ProcessedVlm::new("ADLB");
        let codes: Vec<String> = (1..=12).map(|n| format!("P{n:02}")).collect();
        add(
            &mut vlm,
            PARAMCD,
            codes.iter().map(|code| entry(code, code)).collect(),
        );
        let summary = summarize(&vlm);
        assert_eq!(summary.parameter_count, 12);
        assert_eq!(summary.parameters.len(), 10);
        assert_eq!(summary.parameters[0], "P01");
        assert_eq!(summary.variables, vec![PARAMCD]);
        assert!(!summary.has_non_parameterized);
    }
}
