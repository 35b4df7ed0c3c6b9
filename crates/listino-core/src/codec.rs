//! Conversion between raw CSV bytes and [`Table`]

use crate::charset::decode_text;
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::table::{Row, Table};

/// Output of [`decode`]
#[derive(Debug, Clone)]
pub struct Decoded {
    pub table: Table,
    /// Name of the charset the bytes were read as
    pub charset: &'static str,
    /// Some bytes could not be decoded and were replaced
    pub lossy: bool,
    /// Records the CSV reader rejected and that were left out
    pub malformed: usize,
}

/// Decode `bytes` into a table using `dialect`.
///
/// Never fails: charset problems fall back to a more permissive decoding
/// and records the reader cannot make sense of are counted and skipped.
/// Blank lines carry no record and are not reproduced by [`encode`].
pub fn decode(bytes: &[u8], dialect: &Dialect) -> Decoded {
    let text = decode_text(bytes);
    let mut reader = dialect.reader_builder().from_reader(text.text.as_bytes());

    let mut records = Vec::new();
    let mut malformed = 0;
    for result in reader.records() {
        match result {
            Ok(record) => records.push(record.iter().collect::<Row>()),
            Err(_) => malformed += 1,
        }
    }

    let table = if dialect.has_header && !records.is_empty() {
        let headers = records.remove(0).cells;
        Table::new(headers, records)
    } else {
        Table::headerless(records)
    };

    Decoded {
        table,
        charset: text.encoding.name(),
        lossy: text.lossy,
        malformed,
    }
}

/// Encode `table` as UTF-8 CSV in `dialect`.
///
/// The header row is written only when it came from the source file.
pub fn encode(table: &Table, dialect: &Dialect) -> Result<Vec<u8>> {
    let mut writer = dialect.writer_builder().from_writer(Vec::new());

    if table.header_in_source {
        writer.write_record(&table.headers)?;
    }
    for row in &table.rows {
        writer.write_record(&row.cells)?;
    }

    writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{LineTerminator, QuoteStyle};

    fn semicolon() -> Dialect {
        Dialect::default()
    }

    #[test]
    fn test_decode_with_header() {
        let decoded = decode(b"A;B;C\n1;2;3\n4;5\n", &semicolon());
        assert_eq!(decoded.table.headers, vec!["A", "B", "C"]);
        assert_eq!(decoded.table.row_count(), 2);
        assert_eq!(decoded.table.rows[1].cell(2), "");
        assert_eq!(decoded.charset, "UTF-8");
        assert_eq!(decoded.malformed, 0);
    }

    #[test]
    fn test_decode_without_header_synthesizes_names() {
        let dialect = Dialect {
            has_header: false,
            ..semicolon()
        };
        let decoded = decode(b"1;2\n3;4;5\n", &dialect);
        assert_eq!(decoded.table.headers, vec!["col_1", "col_2", "col_3"]);
        assert_eq!(decoded.table.row_count(), 2);
        assert!(!decoded.table.header_in_source);
    }

    #[test]
    fn test_decode_quoted_fields() {
        let decoded = decode(b"A;B\n\"x;y\";\"say \"\"hi\"\"\"\n", &semicolon());
        assert_eq!(decoded.table.rows[0].cell(0), "x;y");
        assert_eq!(decoded.table.rows[0].cell(1), "say \"hi\"");
    }

    #[test]
    fn test_decode_latin1_input() {
        let decoded = decode(b"DESCRIZIONE;PREZZO\nCaff\xE8;1,20\n", &semicolon());
        assert_eq!(decoded.table.rows[0].cell(0), "Caffè");
        assert_eq!(decoded.charset, "windows-1252");
    }

    #[test]
    fn test_decode_empty_input() {
        let decoded = decode(b"", &semicolon());
        assert!(decoded.table.is_empty());
    }

    #[test]
    fn test_round_trip_is_byte_stable() {
        let input = "A;B;C\n1;\"x;y\";3\n4;5;\n";
        let decoded = decode(input.as_bytes(), &semicolon());
        let output = encode(&decoded.table, &semicolon()).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), input);
    }

    #[test]
    fn test_blank_lines_are_dropped() {
        let decoded = decode(b"A;B\n\n1;2\n\n", &semicolon());
        assert_eq!(decoded.table.row_count(), 1);
        let output = encode(&decoded.table, &semicolon()).unwrap();
        assert_eq!(output, b"A;B\n1;2\n");
    }

    #[test]
    fn test_round_trip_crlf_always_quoted() {
        let dialect = Dialect {
            delimiter: b',',
            quote_style: QuoteStyle::Always,
            terminator: LineTerminator::CrLf,
            ..semicolon()
        };
        let input = "\"A\",\"B\"\r\n\"1\",\"2\"\r\n";
        let decoded = decode(input.as_bytes(), &dialect);
        let output = encode(&decoded.table, &dialect).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), input);
    }

    #[test]
    fn test_encode_headerless_skips_synthesized_header() {
        let dialect = Dialect {
            has_header: false,
            ..semicolon()
        };
        let decoded = decode(b"1;2\n", &dialect);
        let output = encode(&decoded.table, &dialect).unwrap();
        assert_eq!(output, b"1;2\n");
    }

    #[test]
    fn test_encode_with_other_delimiter() {
        let decoded = decode(b"A;B\n1,5;x\n", &semicolon());
        let output = encode(&decoded.table, &semicolon().with_delimiter(b',')).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "A,B\n\"1,5\",x\n");
    }
}
