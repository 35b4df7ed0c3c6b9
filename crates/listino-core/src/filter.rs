//! Row selection by exact cell match

use crate::table::{find_header, HeaderMatch, Row};
use serde::{Deserialize, Serialize};

/// Where the match string is looked for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "column")]
pub enum MatchMode {
    /// Any cell of the row
    AnyCell,
    /// Only the cell under the named header
    NamedColumn(String),
}

/// Which rows to keep
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub mode: MatchMode,
    /// Literal, case-sensitive text a trimmed cell must equal
    pub needle: String,
}

impl FilterSpec {
    pub fn any_cell(needle: impl Into<String>) -> Self {
        Self {
            mode: MatchMode::AnyCell,
            needle: needle.into(),
        }
    }

    pub fn named_column(column: impl Into<String>, needle: impl Into<String>) -> Self {
        Self {
            mode: MatchMode::NamedColumn(column.into()),
            needle: needle.into(),
        }
    }
}

/// Result of [`filter_rows`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutcome {
    pub rows: Vec<Row>,
    /// Set when the named column does not exist; `rows` is then empty
    pub missing_column: Option<String>,
}

/// Keep the rows that match `spec`, preserving their order.
///
/// Named-column lookup is an exact header match and uses the first column
/// with that name.
pub fn filter_rows(headers: &[String], rows: Vec<Row>, spec: &FilterSpec) -> FilterOutcome {
    match &spec.mode {
        MatchMode::AnyCell => FilterOutcome {
            rows: rows
                .into_iter()
                .filter(|row| row.cells.iter().any(|c| c.trim() == spec.needle))
                .collect(),
            missing_column: None,
        },
        MatchMode::NamedColumn(column) => match find_header(headers, column, HeaderMatch::Exact) {
            Some(index) => FilterOutcome {
                rows: rows
                    .into_iter()
                    .filter(|row| row.cell(index).trim() == spec.needle)
                    .collect(),
                missing_column: None,
            },
            None => FilterOutcome {
                rows: Vec::new(),
                missing_column: Some(column.clone()),
            },
        },
    }
}
