// src/common/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::{forms::IngestError, services::workflow::TransitionError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Cabeçalho x-actor-role inválido: {0}")]
    InvalidActorRole(String),

    #[error("Aplicação {0} não encontrada")]
    ApplicationNotFound(Uuid),

    #[error("Lote {0} não encontrado")]
    BulkSubmissionNotFound(Uuid),

    #[error("Item de staging {0} não encontrado")]
    StagedItemNotFound(Uuid),

    #[error("Lote {0} não está mais em rascunho")]
    BulkSubmissionLocked(Uuid),

    #[error("O formulário da aplicação {0} já foi importado")]
    ApplicationAlreadyIngested(Uuid),

    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    // A promoção falhou e a aplicação continua em revisão
    #[error("Não foi possível concluir a aplicação {application_id}: {reason}")]
    CompletionFailed { application_id: Uuid, reason: String },

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro ao executar migrações: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidActorRole(_) => StatusCode::BAD_REQUEST,
            AppError::ApplicationNotFound(_)
            | AppError::BulkSubmissionNotFound(_)
            | AppError::StagedItemNotFound(_) => StatusCode::NOT_FOUND,
            AppError::BulkSubmissionLocked(_)
            | AppError::ApplicationAlreadyIngested(_)
            | AppError::InvalidTransition(_) => StatusCode::CONFLICT,
            AppError::CompletionFailed { .. } | AppError::Ingest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DatabaseError(_)
            | AppError::MigrationError(_)
            | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let error_message = match self {
            // Devolve todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (status, body).into_response();
            }
            AppError::Ingest(ref e) => {
                let body = Json(json!({
                    "error": e.to_string(),
                    "missingDocument": e.is_missing_document(),
                }));
                return (status, body).into_response();
            }
            ref e if status.is_server_error() => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                "Ocorreu um erro inesperado.".to_string()
            }
            e => e.to_string(),
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
