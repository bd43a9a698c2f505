//! Selection over a realistic export: custom conditions versus standard filters

use pretty_assertions::assert_eq;
use timeguard_core::{require_identifier_columns, CellValue, Table};
use timeguard_filter::{FilterError, Selection, StandardFilters};

fn export() -> Table {
    Table::from_rows(
        [
            "Date",
            "Employee_Name",
            "Emp ID",
            "Project",
            "Project Billability Type",
            "Regular Time (Hours)",
        ],
        vec![
            vec!["2024-03-01".into(), "Doe, John".into(), "E100".into(), "Apollo".into(), "Billable".into(), 8.0.into()],
            vec!["2024-03-02".into(), "Doe, John".into(), "E100".into(), "Bench".into(), "Non-Billable".into(), 4.0.into()],
            vec!["2024-03-01".into(), "Smith, Ann".into(), "E200".into(), "Zeus".into(), "Billable".into(), 7.5.into()],
            vec!["2024-03-01".into(), "Lee, Bo".into(), 300.0.into(), "Bench".into(), CellValue::Empty, 6.0.into()],
        ],
    )
}

fn apply(selection: &Selection) -> Result<Table, FilterError> {
    let table = export();
    let (name, id) = require_identifier_columns(&table).unwrap();
    selection.apply(&table, name, id)
}

fn rows(table: &Table, column: usize) -> Vec<String> {
    table.column_values(column).map(ToString::to_string).collect()
}

#[test]
fn custom_expression_uses_fuzzy_columns() {
    let kept = apply(&Selection::custom(
        "`regular time (hours)` >= 6 and project_billability_type == 'Billable'",
    ))
    .unwrap();
    assert_eq!(rows(&kept, 1), vec!["Doe, John", "Smith, Ann"]);
}

#[test]
fn custom_shorthand_on_numeric_ids() {
    let kept = apply(&Selection::custom("emp id == 300")).unwrap();
    assert_eq!(rows(&kept, 1), vec!["Lee, Bo"]);
}

#[test]
fn standard_filters_on_detected_identifiers() {
    let filters = StandardFilters::prepare("a", "", "all").unwrap();
    let kept = apply(&Selection::Standard(filters)).unwrap();
    assert_eq!(rows(&kept, 1), vec!["Smith, Ann"]);
}

#[test]
fn default_selection_keeps_everything() {
    assert_eq!(apply(&Selection::default()).unwrap(), export());
}

#[test]
fn id_prefix_without_match_is_an_error() {
    let filters = StandardFilters::prepare("", "Z", "").unwrap();
    let err = apply(&Selection::Standard(filters)).unwrap_err();
    assert_eq!(err.to_string(), "No employees found with ID starting with 'Z'");
}
