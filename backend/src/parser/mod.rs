//! Generic table reader with encoding and delimiter auto-detection.
//!
//! Turns a delimited file or a spreadsheet into a [`RawTable`]: trimmed
//! headers plus one JSON object per row. No census-specific logic here.

pub mod excel;

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{ParseError, ParseResult};

pub use excel::{cell_to_string, read_spreadsheet};

/// A table as read from disk, before any cleaning or typing.
#[derive(Debug, Clone, Serialize)]
pub struct RawTable {
    /// Where the table was read from
    pub source: String,
    /// Detected or used encoding
    pub encoding: String,
    /// Delimiter, `None` for spreadsheets
    pub delimiter: Option<char>,
    /// Column headers, trimmed, in file order
    pub headers: Vec<String>,
    /// One JSON object per data row, keyed by header
    pub records: Vec<Value>,
    /// Source line (1-based) of each record, parallel to `records`
    #[serde(skip)]
    pub lines: Vec<usize>,
}

impl RawTable {
    /// Build a table from headers and records numbered as if read from a
    /// file with a single header line.
    pub fn from_records(source: &str, headers: Vec<String>, records: Vec<Value>) -> Self {
        let lines = (0..records.len()).map(|i| i + 2).collect();
        Self {
            source: source.to_string(),
            encoding: "utf-8".to_string(),
            delimiter: None,
            headers,
            records,
            lines,
        }
    }

    /// Iterate over `(source line, record)` pairs.
    pub fn rows(&self) -> impl Iterator<Item = (usize, &Value)> {
        self.lines.iter().copied().zip(self.records.iter())
    }

    /// Keep only the records matching `keep`, returning how many were dropped.
    pub fn retain_rows<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&Value) -> bool,
    {
        let before = self.records.len();
        let (lines, records): (Vec<usize>, Vec<Value>) = std::mem::take(&mut self.lines)
            .into_iter()
            .zip(std::mem::take(&mut self.records))
            .filter(|(_, record)| keep(record))
            .unzip();
        self.lines = lines;
        self.records = records;
        before - self.records.len()
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.records.len()
    }

    /// Whether a column with this exact (trimmed) name exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8_lossy(bytes).into_owned(),
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        // Unknown charset: lossy UTF-8
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Detect the delimiter by counting occurrences in the header line.
///
/// Header lines carry no quoted decimals, so a plain count is reliable
/// even when data rows hold values like `"4,96%"`.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Normalize header names: trim whitespace, name blank headers the way
/// serialized index columns are conventionally named (`Unnamed: <n>`), and
/// suffix duplicates with `.1`, `.2`, ...
pub fn normalize_headers<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: HashMap<String, usize> = HashMap::new();
    raw.into_iter()
        .enumerate()
        .map(|(i, h)| {
            let trimmed = h.as_ref().trim().trim_start_matches('\u{feff}').trim();
            let base = if trimmed.is_empty() {
                format!("Unnamed: {}", i)
            } else {
                trimmed.to_string()
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{}.{}", base, count)
            };
            *count += 1;
            name
        })
        .collect()
}

/// Build a JSON row object from headers and cell values.
///
/// Missing trailing cells become empty strings; extra cells are ignored.
pub(crate) fn row_object<'a, I>(headers: &[String], values: I) -> Value
where
    I: IntoIterator<Item = &'a str>,
{
    let mut values = values.into_iter();
    let mut obj = Map::new();
    for header in headers {
        let raw = values.next().map(str::trim).unwrap_or("");
        obj.insert(header.clone(), Value::String(raw.to_string()));
    }
    Value::Object(obj)
}

/// Parse delimited text with an explicit delimiter.
///
/// # Example
/// ```ignore
/// use fronteiras::parser::parse_delimited;
///
/// let table = parse_delimited("uf,taxa_migra\nSC,\"4,96%\"", ',', "inline").unwrap();
/// assert_eq!(table.records[0]["taxa_migra"], "4,96%");
/// ```
pub fn parse_delimited(content: &str, delimiter: char, source: &str) -> ParseResult<RawTable> {
    parse_delimited_with_encoding(content, delimiter, source, "utf-8".to_string())
}

fn parse_delimited_with_encoding(
    content: &str,
    delimiter: char,
    source: &str,
    encoding: String,
) -> ParseResult<RawTable> {
    if !delimiter.is_ascii() {
        return Err(ParseError::InvalidDelimiter(delimiter));
    }
    if content.trim().is_empty() {
        return Err(ParseError::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .has_headers(true)
        .from_reader(content.as_bytes());

    let raw_headers = reader.headers().map_err(|e| ParseError::Csv {
        line: 1,
        message: e.to_string(),
    })?;
    if raw_headers.iter().all(|h| h.trim().is_empty()) {
        return Err(ParseError::NoHeaders);
    }
    let headers = normalize_headers(raw_headers.iter());

    let mut records = Vec::new();
    let mut lines = Vec::new();
    for result in reader.records() {
        let row = result.map_err(|e| ParseError::Csv {
            line: e.position().map(|p| p.line() as usize).unwrap_or(0),
            message: e.to_string(),
        })?;
        if row.iter().all(|v| v.trim().is_empty()) {
            continue;
        }
        lines.push(row.position().map(|p| p.line() as usize).unwrap_or(records.len() + 2));
        records.push(row_object(&headers, row.iter()));
    }

    Ok(RawTable {
        source: source.to_string(),
        encoding,
        delimiter: Some(delimiter),
        headers,
        records,
        lines,
    })
}

/// Parse delimited bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8], source: &str) -> ParseResult<RawTable> {
    if bytes.is_empty() {
        return Err(ParseError::EmptyFile);
    }
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);
    parse_delimited_with_encoding(&content, delimiter, source, encoding)
}

/// Parse a delimited file with auto-detection of encoding and delimiter.
pub fn parse_csv_file_auto<P: AsRef<Path>>(path: P) -> ParseResult<RawTable> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    parse_bytes_auto(&bytes, &path.display().to_string())
}

/// Read any supported table, dispatching on the file extension.
pub fn read_table<P: AsRef<Path>>(path: P) -> ParseResult<RawTable> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "csv" | "tsv" | "txt" => parse_csv_file_auto(path),
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_spreadsheet(path),
        other => Err(ParseError::UnsupportedFormat(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_csv() {
        let table = parse_delimited("uf,saldo_migratorio\nSC,354000\nRJ,-165000", ',', "t").unwrap();

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.records[0]["uf"], "SC");
        assert_eq!(table.records[1]["saldo_migratorio"], "-165000");
    }

    #[test]
    fn test_quoted_decimal_comma() {
        let csv = "uf,taxa_migra\nSC,\"4,96%\"\nGO,\"2,64%\"";
        let table = parse_delimited(csv, ',', "t").unwrap();

        assert_eq!(table.records[0]["taxa_migra"], "4,96%");
        assert_eq!(table.records[1]["taxa_migra"], "2,64%");
    }

    #[test]
    fn test_line_numbers_follow_source() {
        let table = parse_delimited("a;b\n1;2\n\n3;4\n", ';', "t").unwrap();
        let lines: Vec<usize> = table.rows().map(|(line, _)| line).collect();
        assert_eq!(lines, vec![2, 4]);
    }

    #[test]
    fn test_retain_rows_keeps_lines_aligned() {
        let mut table = parse_delimited("uf\nBR\nSC\nPR", ',', "t").unwrap();
        let dropped = table.retain_rows(|r| r["uf"] != "BR");

        assert_eq!(dropped, 1);
        let rows: Vec<(usize, String)> = table
            .rows()
            .map(|(line, r)| (line, r["uf"].as_str().unwrap().to_string()))
            .collect();
        assert_eq!(rows, vec![(3, "SC".to_string()), (4, "PR".to_string())]);
    }

    #[test]
    fn test_headers_trimmed() {
        let table = parse_delimited(" uf ;  pop \nSC;1", ';', "t").unwrap();
        assert_eq!(table.headers, vec!["uf", "pop"]);
        assert!(table.has_column("pop"));
    }

    #[test]
    fn test_blank_header_named_unnamed() {
        let table = parse_delimited(",uf\n0,SC\n1,PR", ',', "t").unwrap();
        assert_eq!(table.headers, vec!["Unnamed: 0", "uf"]);
        assert_eq!(table.records[1]["Unnamed: 0"], "1");
    }

    #[test]
    fn test_duplicate_headers_suffixed() {
        let headers = normalize_headers(["pop", "pop", "pop"]);
        assert_eq!(headers, vec!["pop", "pop.1", "pop.2"]);
    }

    #[test]
    fn test_empty_lines_skipped() {
        let table = parse_delimited("a;b\n1;2\n\n3;4\n", ';', "t").unwrap();
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_missing_values() {
        let table = parse_delimited("a;b;c\n1;;3\n4", ';', "t").unwrap();

        assert_eq!(table.records[0]["b"], "");
        assert_eq!(table.records[1]["a"], "4");
        assert_eq!(table.records[1]["c"], "");
    }

    #[test]
    fn test_empty_csv_error() {
        let result = parse_delimited("", ';', "t");
        assert!(matches!(result, Err(ParseError::EmptyFile)));
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        let result = parse_delimited("uf§pop\nSC§1", '§', "t");
        assert!(matches!(result, Err(ParseError::InvalidDelimiter('§'))));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
    }

    #[test]
    fn test_detect_delimiter_ignores_data_rows() {
        let content = "uf,taxa_migra\nSC,\"4,96%\"";
        assert_eq!(detect_delimiter(content), ',');
    }

    #[test]
    fn test_auto_parse() {
        let csv = "local_nasc;local_resid;pop\nNordeste;Sudeste;6700000";
        let table = parse_bytes_auto(csv.as_bytes(), "inline").unwrap();

        assert_eq!(table.delimiter, Some(';'));
        assert_eq!(table.headers, vec!["local_nasc", "local_resid", "pop"]);
        assert_eq!(table.records[0]["pop"], "6700000");
    }

    #[test]
    fn test_latin1_decoding() {
        // "Goiânia" in ISO-8859-1
        let bytes: &[u8] = &[0x47, 0x6F, 0x69, 0xE2, 0x6E, 0x69, 0x61];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Goiânia");
    }

    #[test]
    fn test_unsupported_extension() {
        let result = read_table("tabela.parquet");
        assert!(matches!(result, Err(ParseError::UnsupportedFormat(ext)) if ext == "parquet"));
    }
}
