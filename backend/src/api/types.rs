//! REST API types for the page integration.
//!
//! Every body carries a `requestId` and a `status`: `"ok"`, `"empty"` for a
//! lookup with nothing to show, or `"error"`.

use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::StateBalanceRecord;
use crate::parser::RawTable;
use crate::transform::pipeline::StateBalanceView;

fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Successful response wrapping one view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub request_id: String,
    /// Always `"ok"`
    pub status: String,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            request_id: new_request_id(),
            status: "ok".to_string(),
            data,
        }
    }
}

/// Payload of `/api/saldo`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateBalanceData {
    /// Records in table order
    pub states: Vec<StateBalanceRecord>,
    /// Same states, biggest gain first
    pub ranking: Vec<StateBalanceView>,
}

/// Payload of `/api/municipios`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MunicipalityList {
    pub count: usize,
    pub names: Vec<String>,
}

impl From<Vec<String>> for MunicipalityList {
    fn from(names: Vec<String>) -> Self {
        Self {
            count: names.len(),
            names,
        }
    }
}

/// Table shown as is, with how it was read.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableData {
    pub source: String,
    pub encoding: String,
    pub delimiter: Option<String>,
    pub row_count: usize,
    pub columns: Vec<String>,
    pub rows: Vec<Value>,
}

impl From<RawTable> for TableData {
    fn from(table: RawTable) -> Self {
        Self {
            row_count: table.row_count(),
            delimiter: table.delimiter.map(|d| d.to_string()),
            source: table.source,
            encoding: table.encoding,
            columns: table.headers,
            rows: table.records,
        }
    }
}

/// Lookup with nothing to show. Not a failure from the page's point of view.
pub fn empty_response(message: &str) -> Value {
    json!({
        "requestId": new_request_id(),
        "status": "empty",
        "message": message,
        "data": null
    })
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "requestId": new_request_id(),
        "status": "error",
        "error": error,
        "data": null
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_response_shape() {
        let json = serde_json::to_value(ApiResponse::ok(MunicipalityList::from(vec![
            "Pelotas".to_string(),
        ])))
        .unwrap();

        assert_eq!(json["status"], "ok");
        assert_eq!(json["data"]["count"], 1);
        assert_eq!(json["data"]["names"][0], "Pelotas");
        assert!(Uuid::parse_str(json["requestId"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_request_ids_differ() {
        let a = error_response("boom");
        let b = error_response("boom");
        assert_ne!(a["requestId"], b["requestId"]);
        assert_eq!(a["status"], "error");
        assert_eq!(a["error"], "boom");
    }

    #[test]
    fn test_empty_response() {
        let json = empty_response("Nenhum dado para Xique-Xique");
        assert_eq!(json["status"], "empty");
        assert!(json["data"].is_null());
    }

    #[test]
    fn test_table_data_from_raw() {
        let table = RawTable::from_records(
            "pop_migrantes.csv",
            vec!["uf".to_string()],
            vec![json!({"uf": "SC"})],
        );
        let data = TableData::from(table);
        assert_eq!(data.row_count, 1);
        assert_eq!(data.columns, vec!["uf"]);
    }
}
