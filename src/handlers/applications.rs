// src/handlers/applications.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::actor::ActorContext,
    models::application::{
        Application, ApplicationCompanyInfo, ApplicationProduct, ApplicationSupplyChainPartner, ApplicationTree,
        CompanyFields, NewApplicationProduct, ReviewDecision, StagedForm,
    },
};

// =============================================================================
//  INTAKE
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplicationPayload {
    #[validate(length(min = 1, max = 255, message = "O nome é obrigatório (até 255 caracteres)"))]
    pub name: String,

    #[serde(default)]
    pub description: String,

    // Referência do formulário (caminho relativo à pasta de formulários)
    #[validate(length(min = 1, message = "A referência do formulário não pode ser vazia"))]
    pub form_reference: Option<String>,
}

// POST /api/applications
#[utoipa::path(
    post,
    path = "/api/applications",
    tag = "Applications",
    request_body = CreateApplicationPayload,
    responses(
        (status = 201, description = "Aplicação criada como pending", body = Application),
        (status = 400, description = "Payload inválido")
    )
)]
pub async fn create_application(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateApplicationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let application = app_state
        .application_service
        .create_application(&payload.name, &payload.description, payload.form_reference.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(application)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManualIntakePayload {
    #[validate(length(min = 1, max = 255, message = "O nome é obrigatório (até 255 caracteres)"))]
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub company_info: CompanyFields,

    #[serde(default)]
    pub partners: Vec<CompanyFields>,

    #[serde(default)]
    pub products: Vec<NewApplicationProduct>,
}

// POST /api/applications/intake
#[utoipa::path(
    post,
    path = "/api/applications/intake",
    tag = "Applications",
    request_body = ManualIntakePayload,
    responses(
        (status = 201, description = "Aplicação e staging gravadas; inclui o relatório de vínculo de parceiros"),
        (status = 400, description = "Payload inválido")
    )
)]
pub async fn manual_intake(
    State(app_state): State<AppState>,
    Json(payload): Json<ManualIntakePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let form = StagedForm {
        company_info: payload.company_info,
        partners: payload.partners,
        products: payload.products,
    };
    let (tree, links) = app_state
        .application_service
        .intake(&payload.name, &payload.description, &form)
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "application": tree, "partnerLinks": links }))))
}

// GET /api/applications/{id}
#[utoipa::path(
    get,
    path = "/api/applications/{id}",
    tag = "Applications",
    params(("id" = Uuid, Path, description = "ID da aplicação")),
    responses(
        (status = 200, description = "Aplicação com toda a staging", body = ApplicationTree),
        (status = 404, description = "Aplicação não encontrada")
    )
)]
pub async fn get_application(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let tree = app_state.application_service.get_tree(id).await?;
    Ok(Json(tree))
}

// POST /api/applications/{id}/ingest
#[utoipa::path(
    post,
    path = "/api/applications/{id}/ingest",
    tag = "Applications",
    params(("id" = Uuid, Path, description = "ID da aplicação")),
    responses(
        (status = 200, description = "Formulário importado (ou staging já existente)"),
        (status = 404, description = "Aplicação ou formulário não encontrado"),
        (status = 422, description = "Formulário fora do layout esperado")
    )
)]
pub async fn ingest_form(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = app_state.ingestion_service.ingest(id).await?;
    Ok(Json(outcome))
}

// POST /api/applications/{id}/submit
#[utoipa::path(
    post,
    path = "/api/applications/{id}/submit",
    tag = "Applications",
    params(
        ("id" = Uuid, Path, description = "ID da aplicação"),
        ("x-actor-role" = String, Header, description = "customer | customer_service")
    ),
    responses(
        (status = 200, description = "Aplicação em revisão", body = Application),
        (status = 409, description = "Transição não permitida")
    )
)]
pub async fn submit_application(
    State(app_state): State<AppState>,
    actor: ActorContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let application = app_state.application_service.submit(id, actor.0).await?;
    Ok(Json(application))
}

// =============================================================================
//  REVISÃO
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPayload {
    pub is_approved: bool,

    #[validate(length(max = 2000, message = "O motivo deve ter no máximo 2000 caracteres"))]
    pub rejection_reason: Option<String>,
}

impl From<ReviewPayload> for ReviewDecision {
    fn from(payload: ReviewPayload) -> Self {
        ReviewDecision {
            is_approved: payload.is_approved,
            // Motivo só faz sentido na reprovação
            rejection_reason: if payload.is_approved { None } else { payload.rejection_reason },
        }
    }
}

// PUT /api/applications/{id}/company-info/review
#[utoipa::path(
    put,
    path = "/api/applications/{id}/company-info/review",
    tag = "Review",
    request_body = ReviewPayload,
    params(
        ("id" = Uuid, Path, description = "ID da aplicação"),
        ("x-actor-role" = String, Header, description = "Papel do revisor")
    ),
    responses(
        (status = 200, description = "Decisão registrada", body = ApplicationCompanyInfo),
        (status = 404, description = "Aplicação sem informações da empresa"),
        (status = 409, description = "Aplicação fora de revisão")
    )
)]
pub async fn review_company_info(
    State(app_state): State<AppState>,
    actor: ActorContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let info = app_state
        .review_service
        .review_company_info(id, actor.0, &payload.into())
        .await?;
    Ok(Json(info))
}

// PUT /api/applications/{id}/partners/{partner_id}/review
#[utoipa::path(
    put,
    path = "/api/applications/{id}/partners/{partner_id}/review",
    tag = "Review",
    request_body = ReviewPayload,
    params(
        ("id" = Uuid, Path, description = "ID da aplicação"),
        ("partner_id" = Uuid, Path, description = "ID do parceiro na staging"),
        ("x-actor-role" = String, Header, description = "Papel do revisor")
    ),
    responses(
        (status = 200, description = "Decisão registrada", body = ApplicationSupplyChainPartner),
        (status = 404, description = "Parceiro não encontrado nesta aplicação"),
        (status = 409, description = "Aplicação fora de revisão")
    )
)]
pub async fn review_partner(
    State(app_state): State<AppState>,
    actor: ActorContext,
    Path((id, partner_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ReviewPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let partner = app_state
        .review_service
        .review_partner(id, partner_id, actor.0, &payload.into())
        .await?;
    Ok(Json(partner))
}

// PUT /api/applications/{id}/products/{product_id}/review
#[utoipa::path(
    put,
    path = "/api/applications/{id}/products/{product_id}/review",
    tag = "Review",
    request_body = ReviewPayload,
    params(
        ("id" = Uuid, Path, description = "ID da aplicação"),
        ("product_id" = Uuid, Path, description = "ID do produto na staging"),
        ("x-actor-role" = String, Header, description = "Papel do revisor")
    ),
    responses(
        (status = 200, description = "Decisão registrada", body = ApplicationProduct),
        (status = 404, description = "Produto não encontrado nesta aplicação"),
        (status = 409, description = "Aplicação fora de revisão")
    )
)]
pub async fn review_product(
    State(app_state): State<AppState>,
    actor: ActorContext,
    Path((id, product_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ReviewPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let product = app_state
        .review_service
        .review_product(id, product_id, actor.0, &payload.into())
        .await?;
    Ok(Json(product))
}

// POST /api/applications/{id}/decision
#[utoipa::path(
    post,
    path = "/api/applications/{id}/decision",
    tag = "Review",
    params(
        ("id" = Uuid, Path, description = "ID da aplicação"),
        ("x-actor-role" = String, Header, description = "Papel do revisor")
    ),
    responses(
        (status = 200, description = "Aplicação concluída (com relatório da promoção) ou rejeitada (com motivos)"),
        (status = 409, description = "Transição não permitida"),
        (status = 422, description = "Promoção falhou; a aplicação continua em revisão")
    )
)]
pub async fn decide(
    State(app_state): State<AppState>,
    actor: ActorContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = app_state.review_service.decide(id, actor.0).await?;
    Ok(Json(outcome))
}
