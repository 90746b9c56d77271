//! # Fronteiras - census migration tables for the page
//!
//! Fronteiras loads the census extracts behind "Fronteiras em Movimento"
//! (state migration balances, region x region flows, municipality origins
//! and immigrants by nationality), cleans them and exposes display-ready
//! views with Brazilian number formatting.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ CSV / XLSX  │────▶│   Parser    │────▶│  Transform  │────▶│  JSON view  │
//! │ (ISO/UTF8)  │     │  (cached)   │     │(clean/pivot)│     │(pt-BR text) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fronteiras::{load_migrant_origins, MigrationMatrix};
//! use std::path::Path;
//!
//! let records = load_migrant_origins(Path::new("pop_migrantes_rodolfo.csv"))?;
//! let matrix = MigrationMatrix::build(&records);
//! println!("{}", matrix.view().grand_total);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Typed records and regions
//! - [`format`] - Brazilian locale number formatting
//! - [`parser`] - CSV/Excel reading with auto-detection
//! - [`validation`] - Per-table column schemas
//! - [`transform`] - Cleaning, loaders, matrix and lookup
//! - [`cache`] - Process-wide table cache
//! - [`config`] - Environment configuration
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Formatting
pub mod format;

// Parsing
pub mod parser;

// Validation
pub mod validation;

// Transformation
pub mod transform;

// Caching
pub mod cache;

// Configuration
pub mod config;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    LoadError, LoadResult, LookupError, LookupResult, ParseError, ParseResult, ServerError,
    ServerResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    ImmigrantCountRecord, MigrantOriginRecord, MunicipalityOriginRecord, Region,
    StateBalanceRecord,
};

// =============================================================================
// Re-exports - Formatting
// =============================================================================

pub use format::{
    format_decimal, format_integer, format_percentage, format_signed_integer, PercentScale,
    NO_DATA,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes_auto, parse_csv_file_auto,
    parse_delimited, read_spreadsheet, read_table, RawTable,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{check_columns, validate, SourceTable};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::crosstab::{CellDisplay, MatrixView, MigrationMatrix};
pub use transform::lookup::{lookup_municipality, municipality_names, MunicipalityProfile};
pub use transform::pipeline::{
    immigrant_view, load_display_table, load_immigrant_counts, load_migrant_origins,
    load_municipality_origins, load_state_balances, rank_by_balance, ImmigrantView,
    StateBalanceView,
};

// =============================================================================
// Re-exports - Cache & Config
// =============================================================================

pub use cache::{CacheStats, TableCache, TABLE_CACHE};
pub use config::Config;

// Server
pub mod server {
    pub use crate::api::server::{router, start_server};
}
