//! Error types for the Fronteiras table pipeline.
//!
//! One enum per layer:
//!
//! - [`ParseError`] - reading a raw delimited file or spreadsheet
//! - [`LoadError`] - turning a raw table into typed records
//! - [`LookupError`] - municipality lookup
//! - [`ServerError`] - HTTP layer
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! A zero-population row in the migration matrix is not an error: its
//! percentages are defined as zero.

use thiserror::Error;

// =============================================================================
// Raw Table Errors
// =============================================================================

/// Errors while reading a raw table from disk.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed delimited content.
    #[error("Invalid CSV at line {line}: {message}")]
    Csv { line: usize, message: String },

    /// Spreadsheet could not be opened or read.
    #[error("Cannot read spreadsheet '{path}': {message}")]
    Excel { path: String, message: String },

    /// Delimiter that the csv reader cannot represent as a single byte.
    #[error("Delimiter must be a single ASCII character, got '{0}'")]
    InvalidDelimiter(char),

    /// Unsupported file extension.
    #[error("Unsupported table format: '{0}'")]
    UnsupportedFormat(String),

    /// Empty file.
    #[error("Table file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in table")]
    NoHeaders,
}

// =============================================================================
// Load Errors
// =============================================================================

/// Errors while converting a raw table into typed records.
///
/// Any of these aborts loading the table: there is no meaningful partial
/// result for a malformed source.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Raw table could not be read.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A numeric field is not parseable after locale normalization.
    #[error("Malformed numeric field in {table}, line {line}, column '{column}': '{value}'")]
    MalformedNumericField {
        table: String,
        line: usize,
        column: String,
        value: String,
    },

    /// Expected columns are absent.
    #[error("Schema mismatch in {table}: missing column(s) {}", missing.join(", "))]
    SchemaMismatch { table: String, missing: Vec<String> },
}

// =============================================================================
// Lookup Errors
// =============================================================================

/// Errors from the municipality lookup.
///
/// Callers treat these as "nothing to display", not as fatal.
#[derive(Debug, Error, PartialEq)]
pub enum LookupError {
    /// Municipality name matched zero rows.
    #[error("Municipality not found: {0}")]
    NotFound(String),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A source table failed to load.
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Lookup failed.
    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for raw table reading.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type for typed loading.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for lookups.
pub type LookupResult<T> = Result<T, LookupError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let parse_err = ParseError::EmptyFile;
        let load_err: LoadError = parse_err.into();
        assert!(load_err.to_string().contains("empty"));

        let server_err: ServerError = load_err.into();
        assert!(server_err.to_string().starts_with("Load error"));

        let lookup_err = LookupError::NotFound("Xique-Xique".into());
        let server_err: ServerError = lookup_err.into();
        assert!(server_err.to_string().contains("Xique-Xique"));
    }

    #[test]
    fn test_malformed_numeric_format() {
        let err = LoadError::MalformedNumericField {
            table: "saldo_migratorio".into(),
            line: 4,
            column: "taxa_migra".into(),
            value: "n/d%".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("line 4"));
        assert!(msg.contains("taxa_migra"));
        assert!(msg.contains("n/d%"));
    }

    #[test]
    fn test_schema_mismatch_lists_all_columns() {
        let err = LoadError::SchemaMismatch {
            table: "pop_migrantes".into(),
            missing: vec!["local_nasc".into(), "pop".into()],
        };
        assert!(err.to_string().contains("local_nasc, pop"));
    }
}
