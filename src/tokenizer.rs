use std::collections::BTreeMap;
use std::mem::take;

/// Raw cell values that spreadsheets use to mean "no data". Compared
/// case-insensitively after trimming; matches are normalized to "".
pub const SENTINELS: &[&str] = &[
    "",
    "na",
    "n.a",
    "n/a",
    "-",
    "--",
    "undisclosed",
    "unknown",
    "tbd",
    "#name?",
    "#value!",
    "#ref!",
];

/// One parsed data row: column header -> cleaned cell value, plus the
/// batch-local row index. Immutable once materialized.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub index: usize,
    fields: BTreeMap<String, String>,
}

impl RawRow {
    pub fn new(index: usize, fields: BTreeMap<String, String>) -> Self {
        Self { index, fields }
    }

    /// Case-insensitive header lookup. Missing columns and sentinel
    /// values both read as the empty string.
    pub fn get(&self, key: &str) -> &str {
        self.fields
            .get(&key.to_lowercase())
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Human-readable row identifier used in validation errors.
    pub fn row_ref(&self) -> String {
        format!("row-{}", self.index + 1)
    }
}

/// Splits raw delimited text into a header row and data rows.
///
/// RFC4180-style: a quote opens a quoted field only at field start, `""`
/// inside a quoted field is a literal quote, separators and line breaks
/// inside quotes are data. `\r\n` and bare `\r` both terminate a row. A
/// trailing row consisting of a single empty field (from a terminal
/// newline) is suppressed.
pub fn tokenize(text: &str) -> (Vec<String>, Vec<Vec<String>>) {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else {
            match c {
                '"' if field.is_empty() => in_quotes = true,
                ',' => row.push(take(&mut field)),
                '\n' | '\r' => {
                    if c == '\r' && chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    row.push(take(&mut field));
                    rows.push(take(&mut row));
                }
                _ => field.push(c),
            }
        }
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    if rows.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let mut iter = rows.into_iter();
    let headers = iter
        .next()
        .unwrap_or_default()
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();
    (headers, iter.collect())
}

/// Zips header cells with value cells into keyed records, trimming every
/// cell and normalizing sentinel tokens to empty.
pub fn materialize(headers: &[String], rows: Vec<Vec<String>>) -> Vec<RawRow> {
    rows.into_iter()
        .enumerate()
        .map(|(index, cells)| {
            let fields = headers
                .iter()
                .zip(cells)
                .map(|(header, cell)| (header.to_lowercase(), clean_cell(&cell)))
                .collect();
            RawRow::new(index, fields)
        })
        .collect()
}

/// Tokenize and materialize in one step.
pub fn parse_delimited(text: &str) -> (Vec<String>, Vec<RawRow>) {
    let (headers, cells) = tokenize(text);
    let rows = materialize(&headers, cells);
    (headers, rows)
}

fn clean_cell(cell: &str) -> String {
    let trimmed = cell.trim();
    let lowered = trimmed.to_lowercase();
    if SENTINELS.iter().any(|s| *s == lowered) {
        String::new()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_rows() {
        let (headers, rows) = tokenize("a,b,c\n1,2,3\n4,5,6\n");
        assert_eq!(headers, vec!["a", "b", "c"]);
        assert_eq!(rows, vec![vec!["1", "2", "3"], vec!["4", "5", "6"]]);
    }

    #[test]
    fn test_quoted_fields() {
        let (headers, rows) = tokenize("name,notes\n\"Acme, Inc\",\"line1\nline2\"\n");
        assert_eq!(headers, vec!["name", "notes"]);
        assert_eq!(rows, vec![vec!["Acme, Inc", "line1\nline2"]]);
    }

    #[test]
    fn test_escaped_quotes() {
        let (_, rows) = tokenize("h\n\"say \"\"hi\"\"\"\n");
        assert_eq!(rows, vec![vec!["say \"hi\""]]);
    }

    #[test]
    fn test_quote_mid_field_is_literal() {
        let (_, rows) = tokenize("h\nit\"s fine\n");
        assert_eq!(rows, vec![vec!["it\"s fine"]]);
    }

    #[test]
    fn test_crlf_and_bare_cr() {
        let (headers, rows) = tokenize("a,b\r\n1,2\r3,4");
        assert_eq!(headers, vec!["a", "b"]);
        assert_eq!(rows, vec![vec!["1", "2"], vec!["3", "4"]]);
    }

    #[test]
    fn test_trailing_newline_suppressed() {
        let (_, rows) = tokenize("a\n1\n");
        assert_eq!(rows, vec![vec!["1"]]);
    }

    #[test]
    fn test_fewer_than_two_rows() {
        assert_eq!(tokenize(""), (Vec::new(), Vec::new()));
        let (headers, rows) = tokenize("a,b\n");
        assert_eq!(headers, vec!["a", "b"]);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_sentinels_normalized() {
        let (_, rows) = parse_delimited("Name,Value\nAcme,n/a\nBeta, UNDISCLOSED \n");
        assert_eq!(rows[0].get("Name"), "Acme");
        assert_eq!(rows[0].get("Value"), "");
        assert_eq!(rows[1].get("value"), "");
    }

    #[test]
    fn test_case_insensitive_lookup_and_row_ref() {
        let (_, rows) = parse_delimited("Deal Update,Date\nAcme buys Beta,2024-01-01\n");
        assert_eq!(rows[0].get("deal update"), "Acme buys Beta");
        assert_eq!(rows[0].get("DEAL UPDATE"), "Acme buys Beta");
        assert_eq!(rows[0].get("missing"), "");
        assert_eq!(rows[0].row_ref(), "row-1");
    }

    #[test]
    fn test_ragged_row_truncates() {
        let (_, rows) = parse_delimited("a,b,c\n1,2\n");
        assert_eq!(rows[0].get("a"), "1");
        assert_eq!(rows[0].get("c"), "");
    }
}
