//! Cleaning operations on raw tables.
//!
//! Row filters and column drops act on a [`RawTable`] in place. Numeric
//! coercions read one field of one row and report failures with the table,
//! source line and column they came from.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{LoadError, LoadResult};
use crate::parser::RawTable;
use crate::validation::SourceTable;

/// Columns left behind by serializing a table together with its index.
static UNNAMED_COLUMN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Unnamed").expect("valid regex"));

/// Aggregate labels in the immigrant table ("Total", "Total Geral", ...).
///
/// Substring match, case-insensitive: a country whose name contains
/// "total" would be dropped too. No real country in the census list does.
static TOTAL_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)total").expect("valid regex"));

/// Placeholder the census spreadsheets use for a zero count.
pub const ZERO_PLACEHOLDER: &str = "-";

// =============================================================================
// Table operations
// =============================================================================

/// Remove every column whose header starts with `Unnamed`.
///
/// Returns the dropped column names.
pub fn drop_unnamed_columns(table: &mut RawTable) -> Vec<String> {
    let (dropped, kept): (Vec<String>, Vec<String>) = std::mem::take(&mut table.headers)
        .into_iter()
        .partition(|h| UNNAMED_COLUMN.is_match(h));
    table.headers = kept;

    if !dropped.is_empty() {
        for record in &mut table.records {
            if let Some(obj) = record.as_object_mut() {
                for col in &dropped {
                    obj.remove(col);
                }
            }
        }
    }
    dropped
}

/// Drop rows whose `column` equals `value` exactly (after trimming).
///
/// Returns the number of rows removed.
pub fn drop_rows_matching(table: &mut RawTable, column: &str, value: &str) -> usize {
    table.retain_rows(|record| field_text(record, column) != value)
}

/// Drop aggregate rows whose `column` contains "total" in any case.
///
/// Returns the number of rows removed.
pub fn drop_total_rows(table: &mut RawTable, column: &str) -> usize {
    table.retain_rows(|record| !is_total_label(field_text(record, column)))
}

/// Whether a label would be treated as an aggregate row.
pub fn is_total_label(label: &str) -> bool {
    TOTAL_LABEL.is_match(label)
}

/// Trimmed text of a field; missing fields read as empty.
pub fn field_text<'a>(record: &'a Value, column: &str) -> &'a str {
    record.get(column).and_then(Value::as_str).map(str::trim).unwrap_or("")
}

// =============================================================================
// Numeric coercion
// =============================================================================

/// Parse a localized percent string into a fraction.
///
/// `%` signs are stripped, `,` becomes `.`, and the result is divided by
/// 100: `"4,96%"` -> `0.0496`. Returns `None` when the residue is not a
/// finite number.
pub fn parse_percent(raw: &str) -> Option<f64> {
    let normalized = raw.trim().replace('%', "").replace(',', ".");
    let value: f64 = normalized.trim().parse().ok()?;
    value.is_finite().then_some(value / 100.0)
}

/// Parse a non-negative count, reading `"-"` as zero.
pub fn parse_count(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if raw == ZERO_PLACEHOLDER {
        return Some(0);
    }
    raw.parse().ok()
}

/// Parse a signed integer (`"+354000"`, `"-165000"`).
pub fn parse_integer(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

/// One row of a source table, with enough context to report coercion
/// failures precisely.
#[derive(Debug, Clone, Copy)]
pub struct RowContext<'a> {
    pub table: SourceTable,
    pub line: usize,
    pub record: &'a Value,
}

impl<'a> RowContext<'a> {
    pub fn new(table: SourceTable, line: usize, record: &'a Value) -> Self {
        Self { table, line, record }
    }

    /// Trimmed text of a column.
    pub fn text(&self, column: &str) -> &'a str {
        field_text(self.record, column)
    }

    fn malformed(&self, column: &str) -> LoadError {
        LoadError::MalformedNumericField {
            table: self.table.name().to_string(),
            line: self.line,
            column: column.to_string(),
            value: self.text(column).to_string(),
        }
    }

    /// Percent column as a fraction.
    pub fn percent(&self, column: &str) -> LoadResult<f64> {
        parse_percent(self.text(column)).ok_or_else(|| self.malformed(column))
    }

    /// Count column, `"-"` read as zero.
    pub fn count(&self, column: &str) -> LoadResult<u64> {
        parse_count(self.text(column)).ok_or_else(|| self.malformed(column))
    }

    /// Signed integer column.
    pub fn integer(&self, column: &str) -> LoadResult<i64> {
        parse_integer(self.text(column)).ok_or_else(|| self.malformed(column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_delimited;
    use serde_json::json;

    #[test]
    fn test_parse_percent() {
        assert!((parse_percent("4,96%").unwrap() - 0.0496).abs() < 1e-12);
        assert!((parse_percent("-2,10%").unwrap() + 0.021).abs() < 1e-12);
        assert!((parse_percent(" 0,5 % ").unwrap() - 0.005).abs() < 1e-12);
        assert!((parse_percent("12%").unwrap() - 0.12).abs() < 1e-12);
    }

    #[test]
    fn test_parse_percent_matches_decimal_reading() {
        for (int_part, frac_part) in [(0, 1), (4, 96), (13, 5), (99, 99), (1, 234)] {
            let raw = format!("{},{}%", int_part, frac_part);
            let direct: f64 = format!("{}.{}", int_part, frac_part).parse().unwrap();
            let parsed = parse_percent(&raw).unwrap();
            assert!((parsed - direct / 100.0).abs() < 1e-12, "{raw}");
        }
    }

    #[test]
    fn test_parse_percent_rejects_garbage() {
        assert_eq!(parse_percent("n/d%"), None);
        assert_eq!(parse_percent(""), None);
        assert_eq!(parse_percent("1.234,5%"), None);
        assert_eq!(parse_percent("NaN%"), None);
    }

    #[test]
    fn test_parse_count_placeholder() {
        assert_eq!(parse_count("-"), Some(0));
        assert_eq!(parse_count(" - "), Some(0));
        assert_eq!(parse_count("38000"), Some(38_000));
        assert_eq!(parse_count("abc"), None);
        assert_eq!(parse_count("-5"), None);
        assert_eq!(parse_count(""), None);
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer("-165000"), Some(-165_000));
        assert_eq!(parse_integer("+354000"), Some(354_000));
        assert_eq!(parse_integer("1.000"), None);
    }

    #[test]
    fn test_drop_country_row_only() {
        let csv = "uf,saldo_migratorio\nBR,0\nSC,354000\nBRA,1\nRJ,-165000";
        let mut table = parse_delimited(csv, ',', "t").unwrap();

        let dropped = drop_rows_matching(&mut table, "uf", "BR");

        assert_eq!(dropped, 1);
        let ufs: Vec<&str> = table.records.iter().map(|r| field_text(r, "uf")).collect();
        assert_eq!(ufs, vec!["SC", "BRA", "RJ"]);
    }

    #[test]
    fn test_drop_unnamed_columns() {
        let csv = ",uf,Unnamed: 7,taxa_migra\n0,SC,x,\"4,96%\"";
        let mut table = parse_delimited(csv, ',', "t").unwrap();

        let dropped = drop_unnamed_columns(&mut table);

        assert_eq!(dropped, vec!["Unnamed: 0", "Unnamed: 7"]);
        assert_eq!(table.headers, vec!["uf", "taxa_migra"]);
        assert!(table.records[0].get("Unnamed: 0").is_none());
        assert_eq!(table.records[0]["taxa_migra"], "4,96%");
    }

    #[test]
    fn test_drop_total_rows() {
        let csv = "pais_regiao;2010;2022\nTotal;592000;1000000\nVenezuela;2869;271000\nTOTAL GERAL;1;1\nHaiti;1;2\nTotal Geral;1;1";
        let mut table = parse_delimited(csv, ';', "t").unwrap();

        let dropped = drop_total_rows(&mut table, "pais_regiao");

        assert_eq!(dropped, 3);
        let countries: Vec<&str> = table.records.iter().map(|r| field_text(r, "pais_regiao")).collect();
        assert_eq!(countries, vec!["Venezuela", "Haiti"]);
    }

    #[test]
    fn test_total_filter_is_substring_based() {
        // Known false positive of the substring rule.
        assert!(is_total_label("Totalândia"));
        for country in ["Venezuela", "Haiti", "Bolívia", "Colômbia", "Paraguai", "Portugal"] {
            assert!(!is_total_label(country), "{country}");
        }
    }

    #[test]
    fn test_row_context_errors_carry_position() {
        let record = json!({ "taxa_migra": "quatro%", "pop": "x" });
        let row = RowContext::new(SourceTable::StateBalance, 7, &record);

        match row.percent("taxa_migra").unwrap_err() {
            LoadError::MalformedNumericField { table, line, column, value } => {
                assert_eq!(table, "saldo_migratorio");
                assert_eq!(line, 7);
                assert_eq!(column, "taxa_migra");
                assert_eq!(value, "quatro%");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(row.count("pop").is_err());
        assert!(row.count("ausente").is_err());
    }
}
