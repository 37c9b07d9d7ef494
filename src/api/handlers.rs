//! API request handlers

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::response::ApiResponse;
use super::server::AppState;
use super::upload::UploadedFiles;
use crate::download::Download;
use crate::error::{SheetError, SheetResult};
use crate::excel::ImportOutcome;
use crate::types::Record;

/// Root endpoint response
#[derive(Serialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize)]
pub struct EndpointInfo {
    pub path: &'static str,
    pub method: &'static str,
    pub description: &'static str,
}

/// GET / - Root info
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let endpoints = vec![
        EndpointInfo {
            path: "/health",
            method: "GET",
            description: "Health check",
        },
        EndpointInfo {
            path: "/schema",
            method: "GET",
            description: "Configured sheet columns",
        },
        EndpointInfo {
            path: "/api/v1/import",
            method: "POST",
            description: "Import an uploaded spreadsheet (multipart)",
        },
        EndpointInfo {
            path: "/api/v1/export",
            method: "POST",
            description: "Export JSON rows as a spreadsheet download",
        },
    ];
    Json(ApiResponse::ok(RootResponse {
        name: "Sheetbridge API Server".to_string(),
        version: state.version.clone(),
        endpoints,
    }))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: String,
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "healthy",
        version: state.version.clone(),
    }))
}

#[derive(Serialize)]
pub struct ColumnInfo {
    pub column: String,
    pub name: String,
    pub title: String,
    pub only_export: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dictionary: Vec<DictionaryEntry>,
}

#[derive(Serialize)]
pub struct DictionaryEntry {
    pub value: Value,
    pub label: String,
}

#[derive(Serialize)]
pub struct SchemaResponse {
    pub upload_key: String,
    pub columns: Vec<ColumnInfo>,
}

/// GET /schema - the configured columns in sheet order
pub async fn schema(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let columns = state
        .bridge
        .schema()
        .iter()
        .enumerate()
        .map(|(offset, field)| ColumnInfo {
            column: crate::column::column_label(offset),
            name: field.name.clone(),
            title: field.title.clone(),
            only_export: field.only_export,
            dictionary: field
                .dict_data
                .entries()
                .map(|(value, label)| DictionaryEntry {
                    value: value.clone(),
                    label: label.to_string(),
                })
                .collect(),
        })
        .collect();

    Json(ApiResponse::ok(SchemaResponse {
        upload_key: state.bridge.upload_key().to_string(),
        columns,
    }))
}

#[derive(Serialize)]
pub struct ImportResponse {
    pub rows: usize,
    pub records: Vec<Record>,
}

/// POST /api/v1/import - multipart upload → records
pub async fn import_excel(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> SheetResult<Json<ApiResponse<ImportResponse>>> {
    let files = UploadedFiles::from_multipart(multipart).await?;
    let bridge = Arc::clone(&state.bridge);

    let outcome = tokio::task::spawn_blocking(move || bridge.import(&files))
        .await
        .map_err(|e| SheetError::import(Box::new(e)))??;

    match outcome {
        ImportOutcome::Records(records) => {
            info!(rows = records.len(), "upload imported");
            Ok(Json(ApiResponse::ok(ImportResponse {
                rows: records.len(),
                records,
            })))
        }
        ImportOutcome::Consumed { rows } => Ok(Json(ApiResponse::ok(ImportResponse {
            rows,
            records: Vec::new(),
        }))),
        ImportOutcome::NoFile => Err(SheetError::Upload(format!(
            "No file uploaded under '{}'",
            state.bridge.upload_key()
        ))),
    }
}

/// Export request
#[derive(Deserialize)]
pub struct ExportRequest {
    pub filename: String,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub rows: Vec<Record>,
}

/// POST /api/v1/export - JSON rows → file download
pub async fn export(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExportRequest>,
) -> SheetResult<Download> {
    let bridge = Arc::clone(&state.bridge);
    let format = req.format.unwrap_or_default();

    tokio::task::spawn_blocking(move || bridge.export(&req.filename, req.rows, &format))
        .await
        .map_err(|e| SheetError::import(Box::new(e)))?
}
