// src/handlers/bulk.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::{application::Application, bulk::BulkSubmission},
    services::bulk_service::BulkSubmissionView,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBulkSubmissionPayload {
    #[validate(length(min = 1, max = 255, message = "O nome do lote é obrigatório"))]
    pub name: String,
}

// POST /api/bulk-submissions
#[utoipa::path(
    post,
    path = "/api/bulk-submissions",
    tag = "Bulk",
    request_body = CreateBulkSubmissionPayload,
    responses((status = 201, description = "Lote criado em DRAFT", body = BulkSubmission))
)]
pub async fn create_bulk_submission(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateBulkSubmissionPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let bulk = app_state.bulk_service.create(&payload.name).await?;
    Ok((StatusCode::CREATED, Json(bulk)))
}

// GET /api/bulk-submissions/{id}
#[utoipa::path(
    get,
    path = "/api/bulk-submissions/{id}",
    tag = "Bulk",
    params(("id" = Uuid, Path, description = "ID do lote")),
    responses(
        (status = 200, description = "Status do lote e suas aplicações", body = BulkSubmissionView),
        (status = 404, description = "Lote não encontrado")
    )
)]
pub async fn get_bulk_submission(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let view = app_state.bulk_service.get(id).await?;
    Ok(Json(view))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddApplicationPayload {
    #[validate(length(min = 1, max = 255, message = "O nome é obrigatório (até 255 caracteres)"))]
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub form_reference: Option<String>,
}

// POST /api/bulk-submissions/{id}/applications
#[utoipa::path(
    post,
    path = "/api/bulk-submissions/{id}/applications",
    tag = "Bulk",
    request_body = AddApplicationPayload,
    params(("id" = Uuid, Path, description = "ID do lote")),
    responses(
        (status = 201, description = "Aplicação adicionada ao lote", body = Application),
        (status = 409, description = "Lote já despachado")
    )
)]
pub async fn add_application(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddApplicationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let application = app_state
        .bulk_service
        .add_application(id, &payload.name, &payload.description, payload.form_reference.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(application)))
}

// POST /api/bulk-submissions/{id}/dispatch
#[utoipa::path(
    post,
    path = "/api/bulk-submissions/{id}/dispatch",
    tag = "Bulk",
    params(("id" = Uuid, Path, description = "ID do lote")),
    responses(
        (status = 202, description = "Lote em PROCESSING; o resultado sai no GET do lote", body = BulkSubmission),
        (status = 409, description = "Lote não está em DRAFT")
    )
)]
// Responde 202 na hora; o processamento segue no worker.
pub async fn dispatch_bulk_submission(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let bulk = app_state.bulk_service.dispatch(id).await?;
    Ok((StatusCode::ACCEPTED, Json(bulk)))
}
