//! JSON Schema checks for the source tables.
//!
//! Each source table has an embedded Draft 7 schema listing its required
//! columns. A table's header set is checked before any typed conversion so
//! schema drift aborts loading with every missing column named at once.
//!
//! # Embedded Schemas
//!
//! Schemas are embedded at compile time from `schemas/`:
//! - `state-balance.json`
//! - `migrant-origin.json`
//! - `municipality-origin.json`
//! - `immigrant-count.json`

use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{LoadError, LoadResult};

static STATE_BALANCE_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/state-balance.json"))
        .expect("Invalid embedded schema")
});

static MIGRANT_ORIGIN_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/migrant-origin.json"))
        .expect("Invalid embedded schema")
});

static MUNICIPALITY_ORIGIN_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/municipality-origin.json"))
        .expect("Invalid embedded schema")
});

static IMMIGRANT_COUNT_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/immigrant-count.json"))
        .expect("Invalid embedded schema")
});

/// The four source tables the pipeline knows how to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTable {
    StateBalance,
    MigrantOrigin,
    MunicipalityOrigin,
    ImmigrantCount,
}

impl SourceTable {
    /// Short name used in error messages and logs.
    pub fn name(self) -> &'static str {
        match self {
            SourceTable::StateBalance => "saldo_migratorio",
            SourceTable::MigrantOrigin => "migrantes_regiao",
            SourceTable::MunicipalityOrigin => "municipios_origem",
            SourceTable::ImmigrantCount => "imigrantes_nacionalidade",
        }
    }

    /// Embedded schema for this table.
    pub fn schema(self) -> &'static Value {
        match self {
            SourceTable::StateBalance => &*STATE_BALANCE_SCHEMA,
            SourceTable::MigrantOrigin => &*MIGRANT_ORIGIN_SCHEMA,
            SourceTable::MunicipalityOrigin => &*MUNICIPALITY_ORIGIN_SCHEMA,
            SourceTable::ImmigrantCount => &*IMMIGRANT_COUNT_SCHEMA,
        }
    }

    /// Columns the schema requires.
    pub fn required_columns(self) -> Vec<&'static str> {
        self.schema()
            .get("required")
            .and_then(Value::as_array)
            .map(|cols| cols.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// Validate a JSON value against a schema.
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(Vec<String>)` with every validation message otherwise
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Object with one empty-string property per header, the shape the
/// table schemas are written against.
fn header_object(headers: &[String]) -> Value {
    let obj: Map<String, Value> = headers
        .iter()
        .map(|h| (h.clone(), Value::String(String::new())))
        .collect();
    Value::Object(obj)
}

/// Check a table's headers against its schema.
///
/// Fails with [`LoadError::SchemaMismatch`] naming every missing column.
pub fn check_columns(table: SourceTable, headers: &[String]) -> LoadResult<()> {
    let data = header_object(headers);
    match validate(table.schema(), &data) {
        Ok(()) => Ok(()),
        Err(messages) => {
            let mut missing: Vec<String> = table
                .required_columns()
                .into_iter()
                .filter(|col| !headers.iter().any(|h| h == col))
                .map(String::from)
                .collect();
            if missing.is_empty() {
                missing = messages;
            }
            Err(LoadError::SchemaMismatch {
                table: table.name().to_string(),
                missing,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn headers(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_embedded_schemas_parse() {
        for table in [
            SourceTable::StateBalance,
            SourceTable::MigrantOrigin,
            SourceTable::MunicipalityOrigin,
            SourceTable::ImmigrantCount,
        ] {
            assert!(!table.required_columns().is_empty(), "{}", table.name());
        }
    }

    #[test]
    fn test_complete_header_set_passes() {
        let cols = headers(&["Unnamed: 0", "uf", "imigrantes", "emigrantes", "saldo_migratorio", "taxa_migra"]);
        assert!(check_columns(SourceTable::StateBalance, &cols).is_ok());
    }

    #[test]
    fn test_missing_columns_reported() {
        let cols = headers(&["local_nasc", "populacao"]);
        let err = check_columns(SourceTable::MigrantOrigin, &cols).unwrap_err();
        match err {
            LoadError::SchemaMismatch { table, missing } => {
                assert_eq!(table, "migrantes_regiao");
                assert_eq!(missing, vec!["local_resid", "pop"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_reports_messages() {
        let schema = json!({
            "type": "object",
            "required": ["municipio"]
        });
        assert!(validate(&schema, &json!({ "municipio": "" })).is_ok());
        assert!(validate(&schema, &json!({ "municipio": "Pelotas" })).is_ok());

        let errors = validate(&schema, &json!({ "pop": "" })).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("municipio"));
    }
}
