//! End-to-end report generation over a realistic export

use std::fs;

use lopdf::Document;
use pretty_assertions::assert_eq;
use timeguard_core::{CellValue, EmployeeGroup, Renderer, Table};
use timeguard_filter::{Selection, StandardFilters};
use timeguard_render::{BatchGenerator, PdfRenderer};

fn export() -> Table {
    let row = |name: &str, id: &str, billability: CellValue, hours: f64| {
        vec![
            CellValue::text("2024-03-04"),
            CellValue::text("March"),
            CellValue::text(name),
            CellValue::text(id),
            CellValue::text("Apollo"),
            billability,
            CellValue::Number(hours),
        ]
    };
    Table::from_rows(
        [
            "Date",
            "Month",
            "Employee Name",
            "Employee ID",
            "Project",
            "Project Billability Type",
            "Regular Time (Hours)",
        ],
        vec![
            row("Doe, John", "E100", "Billable".into(), 8.0),
            row("Doe, John", "E100", "Billable".into(), 6.5),
            row("Roe, Ann", "E200", "Non-Billable".into(), 8.0),
            row("Poe, Ed", "E300", CellValue::Empty, 8.0),
            row("Moe, Al", "X400", "Billable".into(), 2.0),
        ],
    )
}

fn generator(dir: &std::path::Path) -> BatchGenerator {
    BatchGenerator::with_renderer(PdfRenderer::new().logo_paths(vec![]), dir)
}

fn pdf_names(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".pdf"))
        .collect();
    names.sort();
    names
}

#[test]
fn group_of_n_rows_renders_n_plus_one_table_rows() {
    let group = EmployeeGroup {
        name: "Doe, John".into(),
        id: "E100".into(),
        rows: export().filter_rows(|r| r[3] == CellValue::text("E100")),
    };
    let renderer = PdfRenderer::new().logo_paths(vec![]);
    let table = renderer.build_table(&group).unwrap();
    assert_eq!(table.row_count(), 3);
    assert_eq!(table.rows[1][23], "6");

    let bytes = renderer.render(&group).unwrap();
    let doc = Document::load_mem(&bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 1);
}

#[test]
fn non_billable_filter_renders_only_matching_employees() {
    let dir = tempfile::tempdir().unwrap();
    let filters = StandardFilters::prepare("", "", "non-billable").unwrap();
    let summary = generator(dir.path()).generate_batch(&export(), &filters).unwrap();

    assert_eq!(summary.total, 1);
    assert_eq!(pdf_names(dir.path()), vec!["Roe, Ann.pdf"]);
    assert!(summary.message.ends_with("(filtered by billability type 'non-billable')"));
}

#[test]
fn billable_filter_with_id_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let filters = StandardFilters::prepare("", "e", "billable").unwrap();
    let summary = generator(dir.path()).generate_batch(&export(), &filters).unwrap();

    assert_eq!((summary.total, summary.successful), (2, 2));
    assert_eq!(pdf_names(dir.path()), vec!["Doe, John.pdf", "Roe, Ann.pdf"]);
}

#[test]
fn custom_condition_selection() {
    let dir = tempfile::tempdir().unwrap();
    let selection = Selection::custom("`Regular Time (Hours)` < 7");
    let summary = generator(dir.path()).run(&export(), &selection).unwrap();

    assert_eq!(summary.total, 2);
    assert_eq!(pdf_names(dir.path()), vec!["Doe, John.pdf", "Moe, Al.pdf"]);
    assert_eq!(
        summary.message,
        "Generated 2/2 timesheet PDFs successfully (custom condition: '`Regular Time (Hours)` < 7')"
    );
}

#[test]
fn generated_files_reopen_as_pdfs() {
    let dir = tempfile::tempdir().unwrap();
    let summary = generator(dir.path())
        .generate_batch(&export(), &StandardFilters::default())
        .unwrap();
    assert_eq!(summary.successful, 4);
    for file in &summary.files {
        let doc = Document::load(&file.file_path).unwrap();
        assert_eq!(doc.get_pages().len(), 1, "{}", file.filename);
    }
}
