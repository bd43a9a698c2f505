//! Boolean row expressions.
//!
//! ```text
//! `Regular Time (Hours)` >= 8 and Project != "Bench"
//! Month in ["Jan", "Feb"] or not (Billable == true)
//! ```
//!
//! Bare identifiers and backtick-quoted names refer to columns and are
//! resolved with the fuzzy column resolver. Comparisons are type-aware:
//! numbers compare numerically, text lexicographically, and a comparison
//! between mismatched types (or involving an empty cell) is false for every
//! operator except `!=`.

use std::cmp::Ordering;
use std::collections::HashMap;

use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;

use timeguard_core::{CellValue, Table};

use crate::{resolve_or_fail, FilterError};

#[derive(Parser)]
#[grammar = "expr/grammar.pest"]
struct ExprParser;

/// Comparison operator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "==" => Self::Eq,
            "!=" => Self::Ne,
            ">" => Self::Gt,
            ">=" => Self::Ge,
            "<" => Self::Lt,
            "<=" => Self::Le,
            _ => return None,
        })
    }

    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Ne => ordering != Ordering::Equal,
            Self::Gt => ordering == Ordering::Greater,
            Self::Ge => ordering != Ordering::Less,
            Self::Lt => ordering == Ordering::Less,
            Self::Le => ordering != Ordering::Greater,
        }
    }
}

/// One side of a comparison
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    Column(String),
    Literal(CellValue),
}

/// Parsed expression tree
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Or(Vec<Expr>),
    And(Vec<Expr>),
    Not(Box<Expr>),
    Compare {
        left: Operand,
        op: CompareOp,
        right: Operand,
    },
    Membership {
        operand: Operand,
        values: Vec<CellValue>,
        negated: bool,
    },
}

static MISSING: CellValue = CellValue::Empty;

impl Expr {
    pub fn parse(input: &str) -> Result<Self, FilterError> {
        let mut pairs = ExprParser::parse(Rule::condition, input).map_err(|e| {
            let (line, column) = match e.line_col {
                pest::error::LineColLocation::Pos((l, c)) => (l, c),
                pest::error::LineColLocation::Span((l, c), _) => (l, c),
            };
            FilterError::Syntax {
                condition: input.to_string(),
                line,
                column,
                message: e.variant.message().to_string(),
            }
        })?;

        let builder = Builder { source: input };
        let condition = builder.first(&mut pairs, 1, 1)?;
        let (line, column) = condition.as_span().start_pos().line_col();
        let body = builder.first(&mut condition.into_inner(), line, column)?;
        builder.expr(body)
    }

    /// Column names referenced anywhere in the tree, in order of appearance
    pub fn columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Or(items) | Self::And(items) => {
                for item in items {
                    item.collect_columns(out);
                }
            }
            Self::Not(inner) => inner.collect_columns(out),
            Self::Compare { left, right, .. } => {
                push_column(left, out);
                push_column(right, out);
            }
            Self::Membership { operand, .. } => push_column(operand, out),
        }
    }

    /// Keep the rows of `table` for which the expression holds.
    ///
    /// Every referenced column must resolve, otherwise nothing is evaluated.
    pub fn filter(&self, table: &Table) -> Result<Table, FilterError> {
        let mut bindings = HashMap::new();
        for name in self.columns() {
            bindings.insert(name, resolve_or_fail(table, name)?);
        }
        Ok(table.filter_rows(|row| self.evaluate(row, &bindings)))
    }

    fn evaluate(&self, row: &[CellValue], bindings: &HashMap<&str, usize>) -> bool {
        match self {
            Self::Or(items) => items.iter().any(|e| e.evaluate(row, bindings)),
            Self::And(items) => items.iter().all(|e| e.evaluate(row, bindings)),
            Self::Not(inner) => !inner.evaluate(row, bindings),
            Self::Compare { left, op, right } => {
                compare(value(left, row, bindings), *op, value(right, row, bindings))
            }
            Self::Membership {
                operand,
                values,
                negated,
            } => {
                let v = value(operand, row, bindings);
                values.iter().any(|candidate| compare(v, CompareOp::Eq, candidate)) != *negated
            }
        }
    }
}

fn push_column<'a>(operand: &'a Operand, out: &mut Vec<&'a str>) {
    if let Operand::Column(name) = operand {
        if !out.contains(&name.as_str()) {
            out.push(name);
        }
    }
}

fn value<'r>(
    operand: &'r Operand,
    row: &'r [CellValue],
    bindings: &HashMap<&str, usize>,
) -> &'r CellValue {
    match operand {
        Operand::Literal(v) => v,
        Operand::Column(name) => bindings
            .get(name.as_str())
            .and_then(|&idx| row.get(idx))
            .unwrap_or(&MISSING),
    }
}

fn numeric(v: &CellValue) -> Option<f64> {
    match v {
        CellValue::Number(n) => Some(*n),
        CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn compare(left: &CellValue, op: CompareOp, right: &CellValue) -> bool {
    if left.is_empty() || right.is_empty() {
        return op == CompareOp::Ne;
    }
    let ordering = match (left, right) {
        (CellValue::Text(a), CellValue::Text(b)) => Some(a.cmp(b)),
        _ => numeric(left).zip(numeric(right)).and_then(|(a, b)| a.partial_cmp(&b)),
    };
    ordering.map_or(op == CompareOp::Ne, |o| op.accepts(o))
}

// ============================================================================
// Parse tree walking
// ============================================================================

struct Builder<'s> {
    source: &'s str,
}

impl Builder<'_> {
    fn malformed(&self, line: usize, column: usize, message: &str) -> FilterError {
        FilterError::Syntax {
            condition: self.source.to_string(),
            line,
            column,
            message: message.to_string(),
        }
    }

    fn first<'i>(&self, pairs: &mut Pairs<'i, Rule>, line: usize, column: usize) -> Result<Pair<'i, Rule>, FilterError> {
        pairs
            .next()
            .ok_or_else(|| self.malformed(line, column, "incomplete expression"))
    }

    fn unexpected(&self, pair: &Pair<'_, Rule>) -> FilterError {
        let (line, column) = pair.as_span().start_pos().line_col();
        self.malformed(line, column, &format!("unexpected {:?}", pair.as_rule()))
    }

    fn expr(&self, pair: Pair<'_, Rule>) -> Result<Expr, FilterError> {
        match pair.as_rule() {
            Rule::or_expr => self.chain(pair, Rule::and_expr, Expr::Or),
            Rule::and_expr => self.chain(pair, Rule::not_expr, Expr::And),
            Rule::not_expr => {
                let (line, column) = pair.as_span().start_pos().line_col();
                let mut inner = pair.into_inner();
                let first = self.first(&mut inner, line, column)?;
                if first.as_rule() == Rule::not_op {
                    let operand = self.first(&mut inner, line, column)?;
                    Ok(Expr::Not(Box::new(self.expr(operand)?)))
                } else {
                    self.expr(first)
                }
            }
            Rule::comparison => self.comparison(pair),
            Rule::membership => self.membership(pair),
            _ => Err(self.unexpected(&pair)),
        }
    }

    /// `item (op item)*`, collapsing single-item chains
    fn chain(
        &self,
        pair: Pair<'_, Rule>,
        item: Rule,
        combine: fn(Vec<Expr>) -> Expr,
    ) -> Result<Expr, FilterError> {
        let mut items = pair
            .into_inner()
            .filter(|p| p.as_rule() == item)
            .map(|p| self.expr(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(if items.len() == 1 {
            items.remove(0)
        } else {
            combine(items)
        })
    }

    fn comparison(&self, pair: Pair<'_, Rule>) -> Result<Expr, FilterError> {
        let (line, column) = pair.as_span().start_pos().line_col();
        let mut inner = pair.into_inner();
        let left = self.operand(self.first(&mut inner, line, column)?)?;
        let op_pair = self.first(&mut inner, line, column)?;
        let op = CompareOp::from_symbol(op_pair.as_str()).ok_or_else(|| self.unexpected(&op_pair))?;
        let right = self.operand(self.first(&mut inner, line, column)?)?;
        Ok(Expr::Compare { left, op, right })
    }

    fn membership(&self, pair: Pair<'_, Rule>) -> Result<Expr, FilterError> {
        let (line, column) = pair.as_span().start_pos().line_col();
        let mut inner = pair.into_inner();
        let operand = self.operand(self.first(&mut inner, line, column)?)?;
        let in_op = self.first(&mut inner, line, column)?;
        let negated = in_op
            .into_inner()
            .next()
            .is_some_and(|p| p.as_rule() == Rule::not_in);
        let values = self
            .first(&mut inner, line, column)?
            .into_inner()
            .map(|p| self.literal(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Expr::Membership {
            operand,
            values,
            negated,
        })
    }

    fn operand(&self, pair: Pair<'_, Rule>) -> Result<Operand, FilterError> {
        if pair.as_rule() == Rule::column {
            let (line, column) = pair.as_span().start_pos().line_col();
            let name = self.first(&mut pair.into_inner(), line, column)?;
            return Ok(Operand::Column(name.as_str().to_string()));
        }
        self.literal(pair).map(Operand::Literal)
    }

    fn literal(&self, pair: Pair<'_, Rule>) -> Result<CellValue, FilterError> {
        match pair.as_rule() {
            Rule::string => Ok(CellValue::text(
                pair.into_inner().next().map_or("", |p| p.as_str()),
            )),
            Rule::number => pair
                .as_str()
                .parse::<f64>()
                .map(CellValue::Number)
                .map_err(|_| self.unexpected(&pair)),
            Rule::boolean => Ok(CellValue::Bool(
                pair.into_inner()
                    .next()
                    .is_some_and(|p| p.as_rule() == Rule::kw_true),
            )),
            _ => Err(self.unexpected(&pair)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sheet() -> Table {
        Table::from_rows(
            ["User Name", "Project", "Regular Time (Hours)", "Billable"],
            vec![
                vec!["Doe, John".into(), "Apollo".into(), 8.0.into(), true.into()],
                vec!["Roe, Ann".into(), "Bench".into(), 4.0.into(), false.into()],
                vec!["Poe, Ed".into(), "Apollo".into(), CellValue::Empty, true.into()],
                vec!["Loe, Al".into(), "Zeus".into(), 9.5.into(), false.into()],
            ],
        )
    }

    fn names(table: &Table) -> Vec<String> {
        table.column_values(0).map(ToString::to_string).collect()
    }

    #[test]
    fn parses_precedence() {
        let expr = Expr::parse("a == 1 or b == 2 and not c == 3").unwrap();
        let Expr::Or(items) = expr else {
            panic!("expected or at the root");
        };
        assert_eq!(items.len(), 2);
        assert!(matches!(&items[1], Expr::And(and) if matches!(and[1], Expr::Not(_))));
    }

    #[test]
    fn numeric_comparison_skips_empty_cells() {
        let expr = Expr::parse("`Regular Time (Hours)` >= 8").unwrap();
        assert_eq!(names(&expr.filter(&sheet()).unwrap()), vec!["Doe, John", "Loe, Al"]);
    }

    #[test]
    fn not_equal_keeps_empty_cells() {
        let expr = Expr::parse("`Regular Time (Hours)` != 4").unwrap();
        assert_eq!(
            names(&expr.filter(&sheet()).unwrap()),
            vec!["Doe, John", "Poe, Ed", "Loe, Al"]
        );
    }

    #[test]
    fn text_and_boolean_operators() {
        let expr = Expr::parse("Project == 'Apollo' & Billable == True").unwrap();
        assert_eq!(names(&expr.filter(&sheet()).unwrap()), vec!["Doe, John", "Poe, Ed"]);

        let expr = Expr::parse("project != \"Apollo\" | ~(billable == false)").unwrap();
        assert_eq!(
            names(&expr.filter(&sheet()).unwrap()),
            vec!["Doe, John", "Roe, Ann", "Poe, Ed", "Loe, Al"]
        );
    }

    #[test]
    fn membership() {
        let expr = Expr::parse("Project in ['Bench', 'Zeus']").unwrap();
        assert_eq!(names(&expr.filter(&sheet()).unwrap()), vec!["Roe, Ann", "Loe, Al"]);

        let expr = Expr::parse("Project not in ['Bench', 'Zeus']").unwrap();
        assert_eq!(names(&expr.filter(&sheet()).unwrap()), vec!["Doe, John", "Poe, Ed"]);
    }

    #[test]
    fn mismatched_types_never_compare_equal() {
        let expr = Expr::parse("Project == 8").unwrap();
        assert!(expr.filter(&sheet()).unwrap().is_empty());
    }

    #[test]
    fn keywords_are_not_identifier_prefixes() {
        let expr = Expr::parse("order == 1 and index != 2").unwrap();
        assert_eq!(expr.columns(), vec!["order", "index"]);
    }

    #[test]
    fn unresolved_column_is_an_error() {
        let expr = Expr::parse("Nonexistent > 3").unwrap();
        let err = expr.filter(&sheet()).unwrap_err();
        assert!(matches!(err, FilterError::Table(_)), "{err}");
    }

    #[test]
    fn syntax_error_reports_position() {
        let err = Expr::parse("Project ==").unwrap_err();
        match err {
            FilterError::Syntax { line, column, .. } => {
                assert_eq!(line, 1);
                assert_eq!(column, 11);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
