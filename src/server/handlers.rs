//! DynamoDB JSON 1.0 request handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::{ERROR_TYPE_PREFIX, Error, Result};
use crate::registry::{TableRegistry, validate_name};
use crate::types::{
    DescribeTableOutput, ListTablesInput, TableDefinition, TableDescriptionOutput, TableNameInput,
};

pub const TARGET_HEADER: &str = "x-amz-target";
pub const REQUEST_ID_HEADER: &str = "x-amzn-requestid";
pub const AMZ_JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.0";
pub const TARGET_PREFIX: &str = "DynamoDB_20120810.";

/// `POST /`: route on `X-Amz-Target`.
pub async fn dispatch(
    State(registry): State<Arc<TableRegistry>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let target = headers
        .get(TARGET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let operation = target.strip_prefix(TARGET_PREFIX).unwrap_or(target);
    debug!(request_id = %request_id, operation, "DynamoDB request");

    let result = match operation {
        "ListTables" => list_tables(&registry, &body),
        "CreateTable" => create_table(&registry, &body),
        "DescribeTable" => describe_table(&registry, &body),
        "DeleteTable" => delete_table(&registry, &body),
        _ => Err(Error::UnknownOperation(target.to_string())),
    };

    match result {
        Ok(body) => wire_response(StatusCode::OK, request_id, body),
        Err(e) => error_response(request_id, &e),
    }
}

/// `GET /`: liveness probe.
pub async fn health(State(registry): State<Arc<TableRegistry>>) -> Response {
    axum::Json(json!({
        "status": "ok",
        "region": registry.region(),
        "tables": registry.list_tables().len(),
    }))
    .into_response()
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}".as_slice()
    } else {
        body
    };
    serde_json::from_slice(body).map_err(|e| Error::Serialization(e.to_string()))
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| Error::Service {
        code: "InternalServerError".to_string(),
        message: e.to_string(),
    })
}

fn list_tables(registry: &TableRegistry, body: &[u8]) -> Result<Vec<u8>> {
    let input: ListTablesInput = decode(body)?;
    let output =
        registry.list_tables_page(input.exclusive_start_table_name.as_deref(), input.limit)?;
    encode(&output)
}

fn create_table(registry: &TableRegistry, body: &[u8]) -> Result<Vec<u8>> {
    let definition: TableDefinition = decode(body)?;
    let record = registry.create_table(definition)?;
    encode(&TableDescriptionOutput {
        table_description: record.describe(registry.region()),
    })
}

fn describe_table(registry: &TableRegistry, body: &[u8]) -> Result<Vec<u8>> {
    let input: TableNameInput = decode(body)?;
    validate_name("tableName", &input.table_name)?;
    let record = registry.describe_table(&input.table_name)?;
    encode(&DescribeTableOutput {
        table: record.describe(registry.region()),
    })
}

fn delete_table(registry: &TableRegistry, body: &[u8]) -> Result<Vec<u8>> {
    let input: TableNameInput = decode(body)?;
    validate_name("tableName", &input.table_name)?;
    let record = registry.delete_table(&input.table_name)?;
    encode(&TableDescriptionOutput {
        table_description: record.describe(registry.region()),
    })
}

fn wire_response(status: StatusCode, request_id: String, body: Vec<u8>) -> Response {
    (
        status,
        [
            ("content-type", AMZ_JSON_CONTENT_TYPE.to_string()),
            (REQUEST_ID_HEADER, request_id),
        ],
        body,
    )
        .into_response()
}

fn error_response(request_id: String, err: &Error) -> Response {
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        warn!(request_id = %request_id, error = %err, "request failed");
        StatusCode::INTERNAL_SERVER_ERROR
    };
    let body = json!({
        "__type": format!("{}{}", ERROR_TYPE_PREFIX, err.wire_code()),
        "message": err.to_string(),
    });
    wire_response(status, request_id, body.to_string().into_bytes())
}
