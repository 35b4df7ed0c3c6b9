//! In-memory processing of one price list: decode, filter, augment, encode

use crate::codec::{decode, encode};
use crate::dialect::{detect, DetectOptions, Detection, Dialect};
use crate::discount::{augment, AugmentOptions, Augmentation};
use crate::error::Result;
use crate::filter::{filter_rows, FilterSpec};
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

/// Everything the pipeline needs to know, built once from configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub detect: DetectOptions,
    pub filter: FilterSpec,
    pub augment: AugmentOptions,
    /// Write with this delimiter instead of the detected one
    pub output_delimiter: Option<u8>,
}

impl PipelineSettings {
    pub fn new(filter: FilterSpec) -> Self {
        Self {
            detect: DetectOptions::default(),
            filter,
            augment: AugmentOptions::default(),
            output_delimiter: None,
        }
    }
}

/// A condition the run recovered from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Warning {
    DialectFallback,
    LossyDecoding { charset: String },
    MalformedRecords { count: usize },
    FilterColumnMissing { column: String },
    DiscountColumnsMissing { missing: Vec<String> },
    DiscountColumnPresent { column: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::DialectFallback => {
                write!(f, "could not detect the CSV dialect, using ';' with a header row")
            }
            Warning::LossyDecoding { charset } => {
                write!(f, "input is not valid {}, some characters were replaced", charset)
            }
            Warning::MalformedRecords { count } => write!(f, "{} malformed records skipped", count),
            Warning::FilterColumnMissing { column } => {
                write!(f, "filter column '{}' not found, no rows selected", column)
            }
            Warning::DiscountColumnsMissing { missing } => write!(
                f,
                "columns {} not found, discounted price not computed",
                missing.join("/")
            ),
            Warning::DiscountColumnPresent { column } => {
                write!(f, "column '{}' already present, not recomputed", column)
            }
        }
    }
}

/// Summary of a processed file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub detection: Detection,
    /// Dialect the output was written in
    pub output_dialect: Dialect,
    pub charset: String,
    /// Data rows decoded from the input
    pub rows_in: usize,
    /// Data rows that passed the filter and were written
    pub rows_kept: usize,
    pub augmentation: Augmentation,
    pub warnings: Vec<Warning>,
}

/// Result of [`run_pipeline`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Nothing could be decoded; no output should be published
    EmptyInput { detection: Detection },
    Processed {
        output: Vec<u8>,
        report: PipelineReport,
    },
}

/// Run the whole transformation over the downloaded bytes.
///
/// Only output encoding can fail; every other problem becomes a
/// [`Warning`] in the report.
pub fn run_pipeline(input: &[u8], settings: &PipelineSettings) -> Result<PipelineOutcome> {
    let mut warnings = Vec::new();

    let detection = detect(input, &settings.detect);
    let dialect = detection.dialect;
    info!(
        delimiter = %(dialect.delimiter as char).escape_default(),
        has_header = dialect.has_header,
        method = ?detection.method,
        "dialect detected"
    );
    if detection.fallback_used {
        warnings.push(Warning::DialectFallback);
    }

    let decoded = decode(input, &dialect);
    if decoded.lossy {
        warnings.push(Warning::LossyDecoding {
            charset: decoded.charset.to_string(),
        });
    }
    if decoded.malformed > 0 {
        warnings.push(Warning::MalformedRecords {
            count: decoded.malformed,
        });
    }
    let mut table = decoded.table;
    if table.is_empty() {
        return Ok(PipelineOutcome::EmptyInput { detection });
    }
    info!(
        charset = decoded.charset,
        columns = table.column_count(),
        rows = table.row_count(),
        "input decoded"
    );

    let rows_in = table.row_count();
    let filtered = filter_rows(&table.headers, std::mem::take(&mut table.rows), &settings.filter);
    if let Some(column) = filtered.missing_column {
        warnings.push(Warning::FilterColumnMissing { column });
    }
    table.rows = filtered.rows;
    info!(kept = table.row_count(), of = rows_in, "rows filtered");

    let augmentation = augment(&mut table, &settings.augment);
    match &augmentation {
        Augmentation::Applied { computed, blank } => {
            info!(
                column = %settings.augment.columns.target,
                computed,
                blank,
                "discounted price column added"
            );
        }
        Augmentation::MissingColumns { missing } => {
            warnings.push(Warning::DiscountColumnsMissing {
                missing: missing.clone(),
            });
        }
        Augmentation::AlreadyPresent { column } => {
            warnings.push(Warning::DiscountColumnPresent {
                column: column.clone(),
            });
        }
    }

    for warning in &warnings {
        warn!("{}", warning);
    }

    let output_dialect = match settings.output_delimiter {
        Some(delimiter) => dialect.with_delimiter(delimiter),
        None => dialect,
    };
    let output = encode(&table, &output_dialect)?;

    Ok(PipelineOutcome::Processed {
        output,
        report: PipelineReport {
            detection,
            output_dialect,
            charset: decoded.charset.to_string(),
            rows_in,
            rows_kept: table.row_count(),
            augmentation,
            warnings,
        },
    })
}
