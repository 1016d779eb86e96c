// src/handlers/catalog.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::catalog::{LookupEntry, LookupKind},
    services::catalog_import_service::ImportSummary,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportReferencePayload {
    pub kind: LookupKind,

    #[validate(length(min = 1, message = "Informe a planilha a importar"))]
    pub reference: String,
}

// POST /api/catalog/import
#[utoipa::path(
    post,
    path = "/api/catalog/import",
    tag = "Catalog",
    request_body = ImportReferencePayload,
    responses(
        (status = 200, description = "Quantos códigos foram criados e quantos já existiam", body = ImportSummary),
        (status = 404, description = "Planilha não encontrada"),
        (status = 422, description = "Planilha sem as colunas Codes / Description")
    )
)]
pub async fn import_reference(
    State(app_state): State<AppState>,
    Json(payload): Json<ImportReferencePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let summary = app_state
        .catalog_import_service
        .import_reference(payload.kind, &payload.reference)
        .await?;
    Ok(Json(summary))
}

// GET /api/catalog/{kind}
#[utoipa::path(
    get,
    path = "/api/catalog/{kind}",
    tag = "Catalog",
    params(("kind" = LookupKind, Path, description = "product_category | product_detail | raw_material")),
    responses((status = 200, description = "Entradas da tabela de lookup", body = Vec<LookupEntry>))
)]
pub async fn list_lookups(
    State(app_state): State<AppState>,
    Path(kind): Path<LookupKind>,
) -> Result<impl IntoResponse, AppError> {
    let entries = app_state.catalog_repo.list_lookups(kind).await?;
    Ok(Json(entries))
}
