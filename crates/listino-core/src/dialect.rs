//! CSV dialect description and detection
//!
//! Price lists are exported by different tools with different conventions.
//! [`detect`] inspects the head of the file and settles on one [`Dialect`]
//! that is then used for both reading and writing, so the published file
//! looks like the one that was downloaded.
//!
//! Header detection is a heuristic. It compares the first row against the
//! rows below it column by column and can be fooled by single-row files or
//! by header rows made of numbers. Use [`DetectOptions::has_header`] when a
//! deployment knows better.

use crate::charset::decode_sample;
use crate::number::parse_amount;
use serde::{Deserialize, Serialize};

/// Number of bytes inspected by [`detect`]
pub const SAMPLE_SIZE: usize = 4096;

/// Delimiters considered by the sniffer, in order of preference
pub const CANDIDATE_DELIMITERS: &[u8] = b",;\t|:";

/// Share of sample lines that must agree on a delimiter count
const MIN_CONSISTENCY: f64 = 0.9;

/// Data rows examined by the header heuristic
const HEADER_PROBE_ROWS: usize = 20;

/// Line ending used when writing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineTerminator {
    Lf,
    CrLf,
}

/// When fields are wrapped in quotes on output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStyle {
    /// Only fields that need it
    Minimal,
    /// Every field
    Always,
}

/// Lexical conventions of a CSV file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialect {
    #[serde(with = "byte_char")]
    pub delimiter: u8,
    #[serde(with = "byte_char")]
    pub quote: u8,
    /// `""` inside a quoted field stands for one quote; otherwise `\"` does
    pub double_quote: bool,
    pub quote_style: QuoteStyle,
    pub terminator: LineTerminator,
    pub has_header: bool,
}

impl Default for Dialect {
    /// `;`-separated, double-quoted, `\n`-terminated, with a header row
    fn default() -> Self {
        Self {
            delimiter: b';',
            quote: b'"',
            double_quote: true,
            quote_style: QuoteStyle::Minimal,
            terminator: LineTerminator::Lf,
            has_header: true,
        }
    }
}

impl Dialect {
    /// Same dialect with a different delimiter
    pub fn with_delimiter(self, delimiter: u8) -> Self {
        Self { delimiter, ..self }
    }

    /// Escape byte used when quotes are not doubled
    pub fn escape(&self) -> Option<u8> {
        if self.double_quote {
            None
        } else {
            Some(b'\\')
        }
    }

    /// Reader configured for this dialect; every record comes back as data
    pub fn reader_builder(&self) -> csv::ReaderBuilder {
        let mut builder = csv::ReaderBuilder::new();
        builder
            .delimiter(self.delimiter)
            .quote(self.quote)
            .double_quote(self.double_quote)
            .escape(self.escape())
            .has_headers(false)
            .flexible(true);
        builder
    }

    /// Writer configured for this dialect
    pub fn writer_builder(&self) -> csv::WriterBuilder {
        let mut builder = csv::WriterBuilder::new();
        builder
            .delimiter(self.delimiter)
            .quote(self.quote)
            .double_quote(self.double_quote)
            .quote_style(match self.quote_style {
                QuoteStyle::Minimal => csv::QuoteStyle::Necessary,
                QuoteStyle::Always => csv::QuoteStyle::Always,
            })
            .terminator(match self.terminator {
                LineTerminator::Lf => csv::Terminator::Any(b'\n'),
                LineTerminator::CrLf => csv::Terminator::CRLF,
            })
            .has_headers(false)
            .flexible(true);
        if let Some(escape) = self.escape() {
            builder.escape(escape);
        }
        builder
    }
}

/// Externally forced parts of the dialect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectOptions {
    /// Use this delimiter instead of detecting one
    pub delimiter: Option<u8>,
    /// Skip the header heuristic
    pub has_header: Option<bool>,
}

/// How the delimiter was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    Override,
    SemicolonPreferred,
    Sniffed,
    Fallback,
}

/// Result of [`detect`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    pub dialect: Dialect,
    pub method: DetectionMethod,
    /// The fixed default dialect was used because sniffing failed
    pub fallback_used: bool,
}

/// Work out the dialect of a file from its first [`SAMPLE_SIZE`] bytes.
///
/// Priority: forced delimiter, then `;` when the first line holds both `;`
/// and `,`, then a consistency sniff over [`CANDIDATE_DELIMITERS`], then
/// `Dialect::default()`.
pub fn detect(sample: &[u8], options: &DetectOptions) -> Detection {
    let truncated = sample.len() > SAMPLE_SIZE;
    let text = decode_sample(&sample[..sample.len().min(SAMPLE_SIZE)]);
    let lines = sample_lines(&text, truncated);
    let terminator = if text.contains("\r\n") {
        LineTerminator::CrLf
    } else {
        LineTerminator::Lf
    };

    let found = match options.delimiter {
        Some(delimiter) => Some((delimiter, DetectionMethod::Override)),
        None => {
            let first = lines.first().copied().unwrap_or_default();
            if first.contains(';') && first.contains(',') {
                Some((b';', DetectionMethod::SemicolonPreferred))
            } else {
                sniff_delimiter(&lines).map(|d| (d, DetectionMethod::Sniffed))
            }
        }
    };

    match found {
        Some((delimiter, method)) => Detection {
            dialect: describe(&lines, delimiter, terminator, options),
            method,
            fallback_used: false,
        },
        None => Detection {
            dialect: Dialect {
                has_header: options.has_header.unwrap_or(true),
                ..Dialect::default()
            },
            method: DetectionMethod::Fallback,
            fallback_used: true,
        },
    }
}

/// Parse a configured delimiter: a single ASCII character, `tab` or `\t`
pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\\t" | "\t" => return Ok(b'\t'),
        _ => {}
    }

    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() && c != '\n' && c != '\r' => Ok(c as u8),
        _ => Err(format!(
            "delimiter must be a single ASCII character, got '{}'",
            value
        )),
    }
}

/// Non-blank lines of the sample, minus a trailing line cut by truncation
fn sample_lines(text: &str, truncated: bool) -> Vec<&str> {
    let mut lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if truncated && lines.len() > 1 && !text.ends_with('\n') {
        lines.pop();
    }
    lines
}

fn describe(
    lines: &[&str],
    delimiter: u8,
    terminator: LineTerminator,
    options: &DetectOptions,
) -> Dialect {
    let quote = detect_quote(lines, delimiter);
    let mut dialect = Dialect {
        delimiter,
        quote,
        double_quote: detect_double_quote(lines, quote),
        quote_style: detect_quote_style(lines.first().copied(), delimiter, quote),
        terminator,
        has_header: true,
    };
    dialect.has_header = match options.has_header {
        Some(forced) => forced,
        None => guess_has_header(lines, &dialect),
    };
    dialect
}

/// Pick the candidate whose per-line count is most consistent.
///
/// Ties go to the earlier candidate in [`CANDIDATE_DELIMITERS`].
fn sniff_delimiter(lines: &[&str]) -> Option<u8> {
    if lines.is_empty() {
        return None;
    }

    let mut best: Option<(u8, f64)> = None;
    for &candidate in CANDIDATE_DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_unquoted(line, candidate))
            .collect();
        let Some(mode) = modal_count(&counts) else {
            continue;
        };

        let agreeing = counts.iter().filter(|&&c| c == mode).count();
        let consistency = agreeing as f64 / counts.len() as f64;
        if consistency < MIN_CONSISTENCY {
            continue;
        }

        match best {
            Some((_, score)) if score >= consistency => {}
            _ => best = Some((candidate, consistency)),
        }
    }

    best.map(|(delimiter, _)| delimiter)
}

/// Occurrences of `delimiter` outside double-quoted sections
fn count_unquoted(line: &str, delimiter: u8) -> usize {
    let mut quoted = false;
    let mut count = 0;
    for byte in line.bytes() {
        if byte == b'"' {
            quoted = !quoted;
        } else if byte == delimiter && !quoted {
            count += 1;
        }
    }
    count
}

/// Most frequent non-zero count, preferring the larger count on ties
fn modal_count(counts: &[usize]) -> Option<usize> {
    let mut tally: Vec<(usize, usize)> = Vec::new();
    for &count in counts.iter().filter(|&&c| c > 0) {
        match tally.iter_mut().find(|(value, _)| *value == count) {
            Some((_, seen)) => *seen += 1,
            None => tally.push((count, 1)),
        }
    }
    tally
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)))
        .map(|(value, _)| value)
}

fn detect_quote(lines: &[&str], delimiter: u8) -> u8 {
    let (mut double, mut single) = (0usize, 0usize);
    for line in lines {
        for field in line.split(delimiter as char).map(str::trim) {
            if field.len() < 2 {
                continue;
            }
            if field.starts_with('"') && field.ends_with('"') {
                double += 1;
            } else if field.starts_with('\'') && field.ends_with('\'') {
                single += 1;
            }
        }
    }
    if single > 0 && double == 0 {
        b'\''
    } else {
        b'"'
    }
}

fn detect_double_quote(lines: &[&str], quote: u8) -> bool {
    let quote = quote as char;
    let doubled = format!("{quote}{quote}");
    let escaped = format!("\\{quote}");
    let has_doubled = lines.iter().any(|l| l.contains(&doubled));
    let has_escaped = lines.iter().any(|l| l.contains(&escaped));
    !(has_escaped && !has_doubled)
}

fn detect_quote_style(first: Option<&str>, delimiter: u8, quote: u8) -> QuoteStyle {
    let quote = quote as char;
    let all_quoted = first.is_some_and(|line| {
        line.split(delimiter as char)
            .all(|f| f.len() >= 2 && f.starts_with(quote) && f.ends_with(quote))
    });
    if all_quoted {
        QuoteStyle::Always
    } else {
        QuoteStyle::Minimal
    }
}

/// Expected shape of a data column, used to judge the first row
enum ColumnShape {
    Numeric,
    Length(usize),
}

/// Vote per column on whether the first row looks different from the data.
///
/// Fewer than two rows gives no evidence and is treated as "has header".
fn guess_has_header(lines: &[&str], dialect: &Dialect) -> bool {
    let joined = lines.join("\n");
    let mut reader = dialect.reader_builder().from_reader(joined.as_bytes());
    let records: Vec<csv::StringRecord> = reader
        .records()
        .filter_map(|r| r.ok())
        .take(HEADER_PROBE_ROWS + 1)
        .collect();

    let Some((header, data)) = records.split_first() else {
        return true;
    };
    if data.is_empty() {
        return true;
    }

    let mut votes: i64 = 0;
    for (index, heading) in header.iter().enumerate() {
        let values: Vec<&str> = data
            .iter()
            .filter_map(|r| r.get(index))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .collect();
        let Some(shape) = column_shape(&values) else {
            continue;
        };

        let heading = heading.trim();
        let fits = match shape {
            ColumnShape::Numeric => parse_amount(heading).is_some(),
            ColumnShape::Length(len) => heading.chars().count() == len,
        };
        votes += if fits { -1 } else { 1 };
    }

    votes > 0
}

fn column_shape(values: &[&str]) -> Option<ColumnShape> {
    let first = values.first()?;
    if values.iter().all(|v| parse_amount(v).is_some()) {
        return Some(ColumnShape::Numeric);
    }
    let len = first.chars().count();
    if values.iter().all(|v| v.chars().count() == len) {
        return Some(ColumnShape::Length(len));
    }
    None
}

mod byte_char {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(byte: &u8, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_char(*byte as char)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
        let c = char::deserialize(deserializer)?;
        u8::try_from(c).map_err(de::Error::custom)
    }
}
