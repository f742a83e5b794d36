//! Flat string tables: one record per line, comma-delimited.
//!
//! Fields are escaped so that a record always fits on one line and never
//! contains a bare comma:
//! - `\` becomes `\\`, newline `\n`, carriage return `\r`, tab `\t`
//! - `,` becomes `\.`
//! - an absent field is written as the sentinel `\0`
//!
//! An empty line is a record with no fields, so a record holding a single
//! empty string cannot be told apart from an empty record.

use crate::error::{CoreError, Result};
use std::io::{BufRead, Write};
use std::path::Path;

/// Sentinel written for an absent field.
pub const ABSENT: &str = "\\0";

/// One record; `None` marks an absent field.
pub type Row = Vec<Option<String>>;

/// Records in file order.
pub type Table = Vec<Row>;

/// Escape a single field.
pub fn escape(field: Option<&str>) -> String {
    let Some(field) = field else {
        return ABSENT.to_string();
    };
    let mut out = String::with_capacity(field.len());
    for c in field.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ',' => out.push_str("\\."),
            _ => out.push(c),
        }
    }
    out
}

/// Reverse [`escape`]. Returns a message for unknown or dangling escapes.
pub fn unescape(field: &str) -> std::result::Result<Option<String>, String> {
    if field == ABSENT {
        return Ok(None);
    }
    let mut out = String::with_capacity(field.len());
    let mut chars = field.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('.') => out.push(','),
            Some(other) => return Err(format!("Unknown escape sequence: \\{}", other)),
            None => return Err("Dangling backslash at end of field".to_string()),
        }
    }
    Ok(Some(out))
}

/// Join one record into a line (without the line terminator).
pub fn combine<S: AsRef<str>>(fields: &[Option<S>]) -> String {
    fields
        .iter()
        .map(|field| escape(field.as_ref().map(|s| s.as_ref())))
        .collect::<Vec<_>>()
        .join(",")
}

/// Split one line into fields. `line_no` is 1-based and only used for errors.
pub fn split_line(line: &str, line_no: usize) -> Result<Row> {
    if line.is_empty() {
        return Ok(Vec::new());
    }
    line.split(',')
        .map(|field| {
            unescape(field).map_err(|message| CoreError::Parse {
                line: line_no,
                message,
            })
        })
        .collect()
}

/// Parse a whole table from text.
pub fn parse_table(content: &str) -> Result<Table> {
    content
        .lines()
        .enumerate()
        .map(|(idx, line)| split_line(line, idx + 1))
        .collect()
}

/// Read a table from any buffered reader.
pub fn read_table<R: BufRead>(reader: R) -> Result<Table> {
    let mut rows = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        rows.push(split_line(&line?, idx + 1)?);
    }
    Ok(rows)
}

/// Load a table file.
pub fn load_table(path: &Path) -> Result<Table> {
    let content = std::fs::read_to_string(path)?;
    let rows = parse_table(&content)?;
    log::debug!("Loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Render a table as text, one line per record.
pub fn to_table_string<S: AsRef<str>>(rows: &[Vec<Option<S>>]) -> String {
    let mut out = String::new();
    for row in rows {
        out.push_str(&combine(row));
        out.push('\n');
    }
    out
}

/// Write a table to any writer.
pub fn write_table<W: Write, S: AsRef<str>>(mut writer: W, rows: &[Vec<Option<S>>]) -> Result<()> {
    for row in rows {
        writeln!(writer, "{}", combine(row))?;
    }
    writer.flush()?;
    Ok(())
}

/// Save a table file, replacing any existing content.
pub fn save_table<S: AsRef<str>>(path: &Path, rows: &[Vec<Option<S>>]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_table(std::io::BufWriter::new(file), rows)?;
    log::debug!("Saved {} rows to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[Option<&str>]) -> Row {
        fields.iter().map(|f| f.map(str::to_string)).collect()
    }

    #[test]
    fn test_escape_special_characters() {
        assert_eq!(escape(Some("a,b")), "a\\.b");
        assert_eq!(escape(Some("back\\slash")), "back\\\\slash");
        assert_eq!(escape(Some("line\nbreak\r\ttab")), "line\\nbreak\\r\\ttab");
        assert_eq!(escape(Some("")), "");
        assert_eq!(escape(None), ABSENT);
    }

    #[test]
    fn test_unescape_reverses_escape() {
        let tricky = "a,b\\c\nd\re\tf";
        assert_eq!(unescape(&escape(Some(tricky))).unwrap(), Some(tricky.to_string()));
        assert_eq!(unescape("\\0").unwrap(), None);
        assert_eq!(unescape("plain").unwrap(), Some("plain".to_string()));
    }

    #[test]
    fn test_unescape_rejects_bad_sequences() {
        assert!(unescape("bad\\x").unwrap_err().contains("Unknown escape"));
        assert!(unescape("tail\\").unwrap_err().contains("Dangling"));
    }

    #[test]
    fn test_backslash_zero_inside_field_is_text() {
        // Only a field that is exactly the sentinel means "absent".
        assert_eq!(escape(Some("\\0")), "\\\\0");
        assert_eq!(unescape("\\\\0").unwrap(), Some("\\0".to_string()));
    }

    #[test]
    fn test_split_line() {
        assert_eq!(split_line("a,b,c", 1).unwrap(), row(&[Some("a"), Some("b"), Some("c")]));
        assert_eq!(split_line("a,,\\0", 1).unwrap(), row(&[Some("a"), Some(""), None]));
        assert_eq!(split_line(" padded ", 1).unwrap(), row(&[Some(" padded ")]));
        assert!(split_line("", 1).unwrap().is_empty());
    }

    #[test]
    fn test_split_line_reports_line_number() {
        let err = parse_table("ok\nok,too\nbad\\q\n").unwrap_err();
        match err {
            CoreError::Parse { line, message } => {
                assert_eq!(line, 3);
                assert!(message.contains("\\q"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_combine() {
        assert_eq!(combine(&[Some("x"), None, Some("1,2")]), "x,\\0,1\\.2");
        assert_eq!(combine::<&str>(&[]), "");
    }

    #[test]
    fn test_table_string_round_trip() {
        let rows = vec![
            row(&[Some("name"), Some("value")]),
            vec![],
            row(&[Some("multi\nline"), None]),
        ];
        let text = to_table_string(&rows);
        assert_eq!(text, "name,value\n\nmulti\\nline,\\0\n");
        assert_eq!(parse_table(&text).unwrap(), rows);
    }

    #[test]
    fn test_read_table_from_reader() {
        let input = b"a,b\r\nc\r\n" as &[u8];
        let rows = read_table(input).unwrap();
        assert_eq!(rows, vec![row(&[Some("a"), Some("b")]), row(&[Some("c")])]);
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join("lazysheet_table_round_trip.csv");
        let rows = vec![
            row(&[Some("a"), Some("2")]),
            row(&[Some("tab\there"), None, Some("")]),
        ];
        save_table(&path, &rows).unwrap();
        assert_eq!(load_table(&path).unwrap(), rows);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("lazysheet_table_does_not_exist.csv");
        let _ = std::fs::remove_file(&path);
        assert!(matches!(load_table(&path), Err(CoreError::Io(_))));
    }
}
