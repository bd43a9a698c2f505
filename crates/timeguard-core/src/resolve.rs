//! Fuzzy column-name resolution.
//!
//! A desired (logical) column name is matched against the actual headers of
//! a table through an ordered cascade of strategies:
//!
//! | # | Strategy   | Matches when                                                  |
//! |---|------------|---------------------------------------------------------------|
//! | 1 | exact      | strings are identical                                         |
//! | 2 | caseless   | trimmed, lowercased strings are identical                     |
//! | 3 | normalized | equal after removing spaces, `_`, `-` and lowercasing          |
//! | 4 | substring  | either lowercased string contains the other                   |
//! | 5 | keywords   | ≥ 80% of the desired whitespace-separated words appear in actual |
//!
//! Each strategy scans every column, in table order, before the next strategy
//! runs; the first column accepted wins.
//!
//! The report layout ([`ColumnMapping`]) skips the substring step: a missing
//! report column stays empty rather than borrowing a neighbour's data.

use std::collections::HashSet;

use tracing::debug;

use crate::schema::{ReportColumn, REPORT_COLUMNS};
use crate::Table;

/// Minimum share of desired keywords that must appear in the actual name
pub const KEYWORD_MATCH_THRESHOLD: f64 = 0.8;

/// Which strategy produced a match
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchStrategy {
    Exact,
    CaseInsensitive,
    Normalized,
    Substring,
    Keywords,
}

/// Desired name, pre-processed once per lookup
struct Query<'a> {
    raw: &'a str,
    lower: String,
    normalized: String,
    keywords: HashSet<String>,
}

impl<'a> Query<'a> {
    fn new(desired: &'a str) -> Self {
        let trimmed = desired.trim();
        let lower = trimmed.to_lowercase();
        Self {
            raw: trimmed,
            normalized: normalize_column_name(trimmed),
            keywords: keywords(&lower),
            lower,
        }
    }
}

type Predicate = fn(&Query<'_>, &str) -> bool;

const STRATEGIES: [(MatchStrategy, Predicate); 5] = [
    (MatchStrategy::Exact, matches_exact),
    (MatchStrategy::CaseInsensitive, matches_case_insensitive),
    (MatchStrategy::Normalized, matches_normalized),
    (MatchStrategy::Substring, matches_substring),
    (MatchStrategy::Keywords, matches_keywords),
];

const REPORT_STRATEGIES: [(MatchStrategy, Predicate); 4] = [
    (MatchStrategy::Exact, matches_exact),
    (MatchStrategy::CaseInsensitive, matches_case_insensitive),
    (MatchStrategy::Normalized, matches_normalized),
    (MatchStrategy::Keywords, matches_keywords),
];

fn matches_exact(query: &Query<'_>, actual: &str) -> bool {
    actual == query.raw
}

fn matches_case_insensitive(query: &Query<'_>, actual: &str) -> bool {
    actual.trim().to_lowercase() == query.lower
}

fn matches_normalized(query: &Query<'_>, actual: &str) -> bool {
    !query.normalized.is_empty() && normalize_column_name(actual) == query.normalized
}

fn matches_substring(query: &Query<'_>, actual: &str) -> bool {
    let actual = actual.trim().to_lowercase();
    if actual.is_empty() || query.lower.is_empty() {
        return false;
    }
    actual.contains(&query.lower) || query.lower.contains(&actual)
}

fn matches_keywords(query: &Query<'_>, actual: &str) -> bool {
    keyword_overlap(&query.keywords, &keywords(&actual.trim().to_lowercase()))
        >= KEYWORD_MATCH_THRESHOLD
}

/// Lowercase and strip spaces, underscores and hyphens
pub fn normalize_column_name(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

fn keywords(lower: &str) -> HashSet<String> {
    lower.split_whitespace().map(str::to_string).collect()
}

/// Share of `desired` keywords present in `actual`, 0.0 when `desired` is empty
pub fn keyword_overlap(desired: &HashSet<String>, actual: &HashSet<String>) -> f64 {
    if desired.is_empty() {
        return 0.0;
    }
    desired.intersection(actual).count() as f64 / desired.len() as f64
}

/// Resolve `desired` against `actual_columns`, reporting the winning strategy
pub fn resolve_column_with_strategy<'c, S: AsRef<str>>(
    desired: &str,
    actual_columns: &'c [S],
) -> Option<(&'c str, MatchStrategy)> {
    resolve_with(&STRATEGIES, desired, actual_columns)
}

/// Like [`resolve_column_with_strategy`] without the substring step
pub fn resolve_report_column<'c, S: AsRef<str>>(
    desired: &str,
    actual_columns: &'c [S],
) -> Option<(&'c str, MatchStrategy)> {
    resolve_with(&REPORT_STRATEGIES, desired, actual_columns)
}

fn resolve_with<'c, S: AsRef<str>>(
    strategies: &[(MatchStrategy, Predicate)],
    desired: &str,
    actual_columns: &'c [S],
) -> Option<(&'c str, MatchStrategy)> {
    let query = Query::new(desired);
    strategies.iter().find_map(|(strategy, predicate)| {
        actual_columns
            .iter()
            .map(AsRef::as_ref)
            .find(|actual| predicate(&query, actual))
            .map(|actual| (actual, *strategy))
    })
}

/// Resolve `desired` against `actual_columns`; returns the actual column name
pub fn resolve_column<'c, S: AsRef<str>>(desired: &str, actual_columns: &'c [S]) -> Option<&'c str> {
    resolve_column_with_strategy(desired, actual_columns).map(|(actual, _)| actual)
}

/// Resolved report column for one logical header
#[derive(Clone, Debug, PartialEq)]
pub struct MappedColumn {
    pub column: ReportColumn,
    /// Index into the source table's columns, `None` when unresolved
    pub source: Option<usize>,
    pub strategy: Option<MatchStrategy>,
}

/// Mapping of the 26 logical report headers onto one table's columns.
///
/// Computed once per table; every row of that table is read through it.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnMapping {
    columns: Vec<MappedColumn>,
}

impl ColumnMapping {
    pub fn for_table(table: &Table) -> Self {
        let actual = table.columns();
        let columns = REPORT_COLUMNS
            .iter()
            .map(|column| {
                let resolved = resolve_report_column(column.header, actual);
                MappedColumn {
                    column: *column,
                    source: resolved.and_then(|(name, _)| table.column_index(name)),
                    strategy: resolved.map(|(_, s)| s),
                }
            })
            .collect();
        let mapping = Self { columns };
        debug!(
            mapped = mapping.mapped_count(),
            unmapped = ?mapping.unmapped_headers(),
            "report column mapping"
        );
        mapping
    }

    pub fn columns(&self) -> &[MappedColumn] {
        &self.columns
    }

    pub fn mapped_count(&self) -> usize {
        self.columns.iter().filter(|c| c.source.is_some()).count()
    }

    pub fn unmapped_headers(&self) -> Vec<&'static str> {
        self.columns
            .iter()
            .filter(|c| c.source.is_none())
            .map(|c| c.column.header)
            .collect()
    }

    pub fn is_fully_unmapped(&self) -> bool {
        self.mapped_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn exact_beats_later_strategies() {
        let cols = ["Project Code", "Project"];
        assert_eq!(
            resolve_column_with_strategy("Project", &cols),
            Some(("Project", MatchStrategy::Exact))
        );
    }

    #[test]
    fn case_insensitive_is_trimmed() {
        let cols = ["  emp id  "];
        assert_eq!(
            resolve_column_with_strategy("EMP ID", &cols),
            Some(("  emp id  ", MatchStrategy::CaseInsensitive))
        );
    }

    #[test]
    fn normalized_variants() {
        for actual in ["user_name", "USER-NAME", "UserName", "user  name"] {
            let cols = [actual];
            assert_eq!(resolve_column("User Name", &cols), Some(actual), "{actual}");
        }
    }

    #[test]
    fn substring_either_direction() {
        let cols = ["Billability"];
        assert_eq!(
            resolve_column_with_strategy("Task Billability", &cols),
            Some(("Billability", MatchStrategy::Substring))
        );
        let cols = ["Employee Email Address"];
        assert_eq!(resolve_column("Email", &cols), Some("Employee Email Address"));
    }

    #[test]
    fn keyword_overlap_threshold() {
        let cols = ["Type Billability"];
        assert_eq!(
            resolve_column_with_strategy("Billability Type", &cols),
            Some(("Type Billability", MatchStrategy::Keywords))
        );
        let cols = ["Billability Kind"];
        assert_eq!(resolve_column("Task Billability", &cols), None);
    }

    #[test]
    fn first_column_in_table_order_wins_within_a_strategy() {
        let cols = ["project_code", "PROJECT CODE"];
        // Strategy 2 (caseless) runs before strategy 3 (normalized)
        assert_eq!(resolve_column("Project Code", &cols), Some("PROJECT CODE"));

        let cols = ["Project-Code", "project_code"];
        assert_eq!(resolve_column("Project Code", &cols), Some("Project-Code"));
    }

    #[test]
    fn empty_headers_never_match_by_substring() {
        let cols = ["", "Date"];
        assert_eq!(resolve_column("Month", &cols), None);
    }

    #[test]
    fn mapping_is_computed_for_all_report_headers() {
        let table = Table::new(["date", "User_Name", "EMP ID", "Regular Time Hours"]);
        let mapping = ColumnMapping::for_table(&table);
        assert_eq!(mapping.columns().len(), crate::schema::REPORT_COLUMN_COUNT);
        assert_eq!(mapping.columns()[0].source, Some(0));
        assert_eq!(mapping.columns()[2].source, Some(1));
        assert_eq!(mapping.columns()[3].source, Some(2));
        assert!(mapping.unmapped_headers().contains(&"Email"));
    }

    #[test]
    fn report_mapping_never_borrows_by_substring() {
        let table = Table::new(["User Name", "EMP ID", "DU Head", "SBU", "Project", "Input Type Code"]);
        let mapping = ColumnMapping::for_table(&table);
        let unmapped = mapping.unmapped_headers();
        for header in ["PU", "BU", "Project Code", "Project Manager", "Project Billability Type"] {
            assert!(unmapped.contains(&header), "{header}");
        }
        assert!(mapping
            .columns()
            .iter()
            .all(|c| c.strategy != Some(MatchStrategy::Substring)));
        // Every keyword of "DU" appears in "DU Head"
        let du = mapping.columns().iter().find(|c| c.column.header == "DU").unwrap();
        assert_eq!((du.source, du.strategy), (Some(2), Some(MatchStrategy::Keywords)));

        // The general resolver still accepts the substring match
        assert_eq!(resolve_column("PU", table.columns()), Some("Input Type Code"));
    }

    #[test]
    fn report_mapping_keeps_keyword_matches() {
        let cols = ["Type Billability Project"];
        assert_eq!(
            resolve_report_column("Project Billability Type", &cols),
            Some(("Type Billability Project", MatchStrategy::Keywords))
        );
    }

    #[test]
    fn table_without_any_report_column_is_fully_unmapped() {
        let table = Table::new(["zzz", "qqq"]);
        assert!(ColumnMapping::for_table(&table).is_fully_unmapped());
    }
}
