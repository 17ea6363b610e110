use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use define_vlm::preview::{COVERED, NOT_COVERED};
use define_vlm::{TablePreview, ValidationWarning, VlmOutput, build_preview};

use crate::types::{DatasetRow, DocumentSummary};

pub fn print_document_summary(summary: &DocumentSummary) {
    println!("File: {}", summary.file_name);
    println!("Study: {}", summary.study.as_deref().unwrap_or("-"));
    if let Some(protocol) = &summary.protocol {
        println!("Protocol: {protocol}");
    }
    println!(
        "MetaDataVersion: {}",
        summary.meta_data_version.as_deref().unwrap_or("-")
    );
    println!(
        "Define version: {}",
        summary.define_version.as_deref().unwrap_or("-")
    );
    println!("Kind: {}", define_kind(summary.is_adam, summary.is_sdtm));

    let mut table = Table::new();
    table.set_header(vec![header_cell("Entity"), header_cell("Count")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for count in &summary.counts {
        table.add_row(vec![Cell::new(count.entity), count_cell(count.count)]);
    }
    println!("{table}");
}

pub fn print_datasets(rows: &[DatasetRow]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Dataset"),
        header_cell("Description"),
        header_cell("Class"),
        header_cell("Structure"),
        header_cell("Variables"),
        header_cell("Derived"),
        header_cell("Value lists"),
        header_cell("VLM"),
    ]);
    apply_wide_table_style(&mut table);
    align_column(&mut table, 4, CellAlignment::Right);
    align_column(&mut table, 5, CellAlignment::Right);
    align_column(&mut table, 6, CellAlignment::Right);
    align_column(&mut table, 7, CellAlignment::Center);
    for row in rows {
        table.add_row(vec![
            Cell::new(&row.name)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            optional_cell(row.description.as_deref()),
            optional_cell(row.class.as_deref()),
            optional_cell(row.structure.as_deref()),
            Cell::new(row.variables),
            count_cell(row.derived),
            count_cell(row.value_lists),
            flag_cell(row.vlm_eligible),
        ]);
    }
    println!("{table}");
}

pub fn print_vlm(output: &VlmOutput) {
    let preview = build_preview(&output.vlm);
    println!();
    println!(
        "Dataset: {} ({} variables, {} parameters)",
        output.vlm.dataset,
        output.vlm.variables.len(),
        preview.parameter_rows()
    );
    if preview.rows.is_empty() {
        println!("No value-level metadata.");
    } else {
        println!("{}", preview_table(&preview));
        println!("{}", coverage_table(&preview));
    }
    if !output.report.is_clean() {
        println!();
        println!("Warnings:");
        println!("{}", warning_table(&output.report.warnings));
    }
}

/// Parameter code by variable grid.
pub fn preview_table(preview: &TablePreview) -> Table {
    let mut table = Table::new();
    table.set_header(preview.header().into_iter().map(header_cell));
    apply_wide_table_style(&mut table);
    let first_flag = if preview.has_param { 2 } else { 1 };
    for index in first_flag..first_flag + preview.columns.len() {
        align_column(&mut table, index, CellAlignment::Center);
    }
    for row in &preview.rows {
        let mut cells = vec![Cell::new(&row.paramcd).add_attribute(Attribute::Bold)];
        if preview.has_param {
            cells.push(Cell::new(row.param.as_deref().unwrap_or_default()));
        }
        cells.extend(row.cells.iter().copied().map(flag_cell));
        table.add_row(cells);
    }
    table
}

pub fn coverage_table(preview: &TablePreview) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Variable"),
        header_cell("Covered"),
        header_cell("Coverage"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    for coverage in &preview.coverage {
        let percent = Cell::new(format!("{:.1}%", coverage.percent));
        let percent = if coverage.total > 0 && coverage.covered < coverage.total {
            percent.fg(Color::Yellow)
        } else {
            percent
        };
        table.add_row(vec![
            Cell::new(&coverage.variable),
            Cell::new(format!("{}/{}", coverage.covered, coverage.total)),
            percent,
        ]);
    }
    table
}

pub fn warning_table(warnings: &[ValidationWarning]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Variable"), header_cell("Warning")]);
    apply_wide_table_style(&mut table);
    for warning in warnings {
        table.add_row(vec![
            Cell::new(warning.variable()).fg(Color::Blue),
            Cell::new(warning.to_string()).fg(Color::Yellow),
        ]);
    }
    table
}

fn define_kind(is_adam: bool, is_sdtm: bool) -> &'static str {
    match (is_adam, is_sdtm) {
        (true, true) => "ADaM + SDTM",
        (true, false) => "ADaM",
        (false, true) => "SDTM",
        (false, false) => "unknown",
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_wide_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(165);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn flag_cell(flag: bool) -> Cell {
    if flag {
        Cell::new(COVERED)
            .fg(Color::Green)
            .add_attribute(Attribute::Bold)
    } else {
        dim_cell(NOT_COVERED)
    }
}

fn count_cell(count: usize) -> Cell {
    if count > 0 {
        Cell::new(count)
    } else {
        dim_cell(count)
    }
}

fn optional_cell(value: Option<&str>) -> Cell {
    match value {
        Some(value) => Cell::new(value),
        None => dim_cell("-"),
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

#[cfg(test)]
mod tests {
    use super::*;
    use define_vlm::preview::PreviewRow;

    fn preview() -> TablePreview {
        TablePreview {
            has_param: true,
            columns: vec!["AVAL".to_string(), "AVALU".to_string()],
            rows: vec![PreviewRow {
                paramcd: "ALB".to_string(),
                param: Some("Albumin".to_string()),
                cells: vec![true, false],
            }],
            coverage: Vec::new(),
        }
    }

    #[test]
    fn test_preview_table_has_header_and_flags() {
        let mut table = preview_table(&preview());
        assert_eq!(table.column_count(), 4);
        let rendered = table.to_string();
        assert!(rendered.contains("PARAMCD"));
        assert!(rendered.contains("Albumin"));
        assert!(rendered.contains(COVERED));
    }

    #[test]
    fn test_define_kind_labels() {
        assert_eq!(define_kind(true, false), "ADaM");
        assert_eq!(define_kind(false, false), "unknown");
    }
}
