//! Custom filter conditions.
//!
//! A condition is classified by the first clause that matches:
//!
//! | form                          | semantics                                         |
//! |-------------------------------|---------------------------------------------------|
//! | `<column> contains <value>`   | case-insensitive substring                        |
//! | `<column> starts with <value>`| case-insensitive prefix                           |
//! | `<column> == <value>`         | exact equality of the string form                 |
//! | anything else                 | boolean expression, see [`crate::expr`]           |
//!
//! `contains` and `starts with` are detected case-insensitively; `==` needs a
//! space on each side, a plain column name on its left and no further
//! comparison on its right, so spaced expressions such as
//! ``a >= 6 and b == 'x'`` still reach the grammar.
//! Values have surrounding whitespace and quotes stripped.

use tracing::info;

use timeguard_core::Table;

use crate::expr::Expr;
use crate::{resolve_or_fail, FilterError};

/// Keyword-based condition form
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shorthand {
    Contains,
    StartsWith,
    Equals,
}

impl Shorthand {
    const ALL: [Self; 3] = [Self::Contains, Self::StartsWith, Self::Equals];

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::StartsWith => "starts with",
            Self::Equals => "==",
        }
    }

    /// Byte offset and length of the ` keyword ` separator in `input`
    fn find(self, input: &str) -> Option<(usize, usize)> {
        let separator = format!(" {} ", self.keyword());
        let position = match self {
            Self::Equals => input.find(&separator),
            // ASCII lowercasing keeps byte offsets aligned with `input`
            _ => input.to_ascii_lowercase().find(&separator),
        };
        position.map(|at| (at, separator.len()))
    }

    fn matches(self, cell: &str, value: &str) -> bool {
        match self {
            Self::Contains => cell.to_lowercase().contains(&value.to_lowercase()),
            Self::StartsWith => cell.to_lowercase().starts_with(&value.to_lowercase()),
            Self::Equals => cell == value,
        }
    }
}

/// A parsed custom condition
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    Shorthand {
        kind: Shorthand,
        column: String,
        value: String,
    },
    Expression(Expr),
}

impl Condition {
    pub fn parse(input: &str) -> Result<Self, FilterError> {
        for kind in Shorthand::ALL {
            if let Some((at, len)) = kind.find(input) {
                let column = input[..at].trim();
                let rest = &input[at + len..];
                if kind == Shorthand::Equals && !(is_plain_column(column) && is_plain_value(rest)) {
                    continue;
                }
                if column.is_empty() {
                    return Err(FilterError::InvalidFormat {
                        keyword: kind.keyword(),
                    });
                }
                return Ok(Self::Shorthand {
                    kind,
                    column: column.to_string(),
                    value: strip_value(rest),
                });
            }
        }
        Expr::parse(input.trim()).map(Self::Expression)
    }

    /// Keep the rows of `table` satisfying the condition
    pub fn apply(&self, table: &Table) -> Result<Table, FilterError> {
        match self {
            Self::Shorthand {
                kind,
                column,
                value,
            } => {
                let idx = resolve_or_fail(table, column)?;
                let filtered = table.filter_rows(|row| {
                    row[idx]
                        .to_text()
                        .is_some_and(|text| kind.matches(&text, value))
                });
                info!(
                    column = %table.columns()[idx],
                    keyword = kind.keyword(),
                    value = %value,
                    before = table.len(),
                    after = filtered.len(),
                    "applied shorthand condition"
                );
                Ok(filtered)
            }
            Self::Expression(expr) => {
                let filtered = expr.filter(table)?;
                info!(
                    before = table.len(),
                    after = filtered.len(),
                    "applied expression condition"
                );
                Ok(filtered)
            }
        }
    }
}

/// A bare column name: no quoting, operators or boolean keywords
fn is_plain_column(column: &str) -> bool {
    const OPERATOR_CHARS: &[char] = &['`', '"', '\'', '<', '>', '=', '!', '&', '|', '~', '[', ']'];
    if column.contains(OPERATOR_CHARS) {
        return false;
    }
    !column
        .split_whitespace()
        .any(|word| ["and", "or", "not", "in"].contains(&word.to_ascii_lowercase().as_str()))
}

/// A value holding no further comparison
fn is_plain_value(value: &str) -> bool {
    !["==", "!=", ">=", "<=", "<", ">", "`"]
        .iter()
        .any(|op| value.contains(op))
}

fn strip_value(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_string()
}

/// Filter `table` by a user-supplied condition.
///
/// A blank condition returns the table unchanged. A condition that keeps no
/// rows is an error.
pub fn apply_custom_condition(table: &Table, condition: &str) -> Result<Table, FilterError> {
    if condition.trim().is_empty() {
        return Ok(table.clone());
    }
    info!(condition, columns = ?table.columns(), "applying custom condition");

    let filtered = Condition::parse(condition)?.apply(table)?;
    if filtered.is_empty() {
        return Err(FilterError::EmptyResult(condition.to_string()));
    }
    Ok(filtered)
}
