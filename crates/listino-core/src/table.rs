//! Core table types for representing a decoded price list

use serde::{Deserialize, Serialize};

/// A decoded CSV file: header names plus data rows of raw string cells.
///
/// Rows may be shorter (or longer) than the header; missing cells read as
/// the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Column names, not necessarily unique
    pub headers: Vec<String>,
    /// Data rows
    pub rows: Vec<Row>,
    /// Whether the headers came from the file (false = synthesized)
    pub header_in_source: bool,
}

impl Table {
    /// Create a table with headers read from the file
    pub fn new(headers: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            headers,
            rows,
            header_in_source: true,
        }
    }

    /// Create a table for a header-less file, naming columns `col_1`, `col_2`, …
    /// up to the widest row
    pub fn headerless(rows: Vec<Row>) -> Self {
        let width = rows.iter().map(Row::len).max().unwrap_or(0);
        Self {
            headers: (1..=width).map(|i| format!("col_{}", i)).collect(),
            rows,
            header_in_source: false,
        }
    }

    /// Nothing was decoded at all, not even a header
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// How a header name is compared when looking up a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMatch {
    /// Byte-for-byte equal
    Exact,
    /// Equal ignoring case and surrounding whitespace
    Loose,
}

/// Index of the first header matching `name`
pub fn find_header(headers: &[String], name: &str, how: HeaderMatch) -> Option<usize> {
    match how {
        HeaderMatch::Exact => headers.iter().position(|h| h == name),
        HeaderMatch::Loose => {
            let wanted = name.trim().to_lowercase();
            headers
                .iter()
                .position(|h| h.trim().to_lowercase() == wanted)
        }
    }
}

/// A row of raw cell text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    pub cells: Vec<String>,
}

impl Row {
    /// Create a new row
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    /// Cell at `index`, or `""` when the row is too short
    pub fn cell(&self, index: usize) -> &str {
        self.cells.get(index).map(String::as_str).unwrap_or("")
    }

    /// Number of cells actually present
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Append a trailing cell
    pub fn push(&mut self, value: impl Into<String>) {
        self.cells.push(value.into());
    }
}

impl<S: Into<String>> FromIterator<S> for Row {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Row::new(iter.into_iter().map(Into::into).collect())
    }
}
