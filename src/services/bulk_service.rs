// src/services/bulk_service.rs

use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{self, ApplicationRepository, BulkSubmissionRepository},
    models::{
        application::{Application, ApplicationStatus},
        bulk::{ApplicationOutcome, BatchReport, BulkSubmission, BulkSubmissionStatus, FailureKind},
    },
    services::{
        application_service::ApplicationService,
        bulk_worker::BulkQueue,
        ingestion_service::IngestionService,
        workflow::{self, ActorRole, BulkAction},
    },
};

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkSubmissionView {
    #[serde(flatten)]
    pub bulk_submission: BulkSubmission,
    pub applications: Vec<Application>,
}

#[derive(Clone)]
pub struct BulkService {
    pool: SqlitePool,
    bulk: BulkSubmissionRepository,
    applications: ApplicationRepository,
    application_service: ApplicationService,
    ingestion: IngestionService,
    queue: BulkQueue,
}

impl BulkService {
    pub fn new(
        pool: SqlitePool,
        bulk: BulkSubmissionRepository,
        applications: ApplicationRepository,
        application_service: ApplicationService,
        ingestion: IngestionService,
        queue: BulkQueue,
    ) -> Self {
        Self { pool, bulk, applications, application_service, ingestion, queue }
    }

    // =========================================================================
    //  MONTAGEM DO LOTE (DRAFT)
    // =========================================================================

    pub async fn create(&self, name: &str) -> Result<BulkSubmission, AppError> {
        let bulk = self.bulk.create(&self.pool, name).await?;
        tracing::info!("✅ Lote '{}' criado ({})", bulk.name, bulk.id);
        Ok(bulk)
    }

    /// Só lotes em rascunho aceitam novas aplicações.
    pub async fn add_application(
        &self,
        bulk_id: Uuid,
        name: &str,
        description: &str,
        form_reference: Option<&str>,
    ) -> Result<Application, AppError> {
        let mut tx = db::begin_write(&self.pool).await?;

        let bulk = self
            .bulk
            .find_by_id(&mut *tx, bulk_id)
            .await?
            .ok_or(AppError::BulkSubmissionNotFound(bulk_id))?;
        if bulk.status != BulkSubmissionStatus::Draft {
            return Err(AppError::BulkSubmissionLocked(bulk_id));
        }

        let application = self
            .applications
            .create_application(&mut *tx, name, description, form_reference, Some(bulk_id))
            .await?;

        tx.commit().await?;
        Ok(application)
    }

    pub async fn get(&self, bulk_id: Uuid) -> Result<BulkSubmissionView, AppError> {
        let bulk_submission = self
            .bulk
            .find_by_id(&self.pool, bulk_id)
            .await?
            .ok_or(AppError::BulkSubmissionNotFound(bulk_id))?;
        let applications = self.applications.list_by_bulk_submission(bulk_id).await?;
        Ok(BulkSubmissionView { bulk_submission, applications })
    }

    // =========================================================================
    //  DESPACHO E PROCESSAMENTO
    // =========================================================================

    /// DRAFT -> PROCESSING e enfileira para o worker. Retorna na hora.
    pub async fn dispatch(&self, bulk_id: Uuid) -> Result<BulkSubmission, AppError> {
        let current = self
            .bulk
            .find_by_id(&self.pool, bulk_id)
            .await?
            .ok_or(AppError::BulkSubmissionNotFound(bulk_id))?;
        workflow::bulk_transition(current.status, BulkAction::Dispatch)?;

        // O UPDATE condicional garante um único despacho mesmo com corrida
        let bulk = self
            .bulk
            .mark_processing(&self.pool, bulk_id)
            .await?
            .ok_or(AppError::BulkSubmissionLocked(bulk_id))?;

        self.queue.enqueue(bulk_id)?;
        tracing::info!("Lote {} despachado para processamento", bulk_id);
        Ok(bulk)
    }

    /// Reenfileira lotes que ficaram em PROCESSING (ex.: após reinício).
    pub async fn resume_interrupted(&self) -> Result<usize, AppError> {
        let ids = self.bulk.list_processing_ids().await?;
        for id in &ids {
            self.queue.enqueue(*id)?;
        }
        if !ids.is_empty() {
            tracing::info!("{} lote(s) interrompido(s) reenfileirado(s)", ids.len());
        }
        Ok(ids.len())
    }

    pub async fn record_attempt(&self, bulk_id: Uuid) -> Result<i64, AppError> {
        self.bulk.record_attempt(&self.pool, bulk_id).await
    }

    /// Processa todos os membros em sequência e grava o status final uma vez.
    ///
    /// Erros por aplicação viram [`ApplicationOutcome`]; só falhas de
    /// infraestrutura (listar membros, gravar o status) sobem como `Err`.
    pub async fn process(&self, bulk_id: Uuid) -> Result<BatchReport, AppError> {
        let members = self.applications.list_by_bulk_submission(bulk_id).await?;
        tracing::info!("Processando lote {} ({} aplicações)", bulk_id, members.len());

        let mut report = BatchReport::default();
        for application in &members {
            let outcome = self.process_application(application).await;
            if let Some(failure) = &outcome.failure {
                tracing::warn!(
                    "Aplicação '{}' ({}) falhou no lote {}: {:?} - {}",
                    application.name,
                    application.id,
                    bulk_id,
                    failure.kind,
                    failure.message
                );
            }
            report.record(outcome);
        }

        let status = workflow::bulk_transition(
            BulkSubmissionStatus::Processing,
            BulkAction::Finish { success: report.is_success() },
        )?;
        let message = report.error_message();
        let details = (!report.is_success()).then(|| report.error_details());
        let finished = self
            .bulk
            .finish(&self.pool, bulk_id, status, message.as_deref(), details.as_ref())
            .await?;

        match finished {
            Some(_) => tracing::info!(
                "✅ Lote {} finalizado como {} ({} ok, {} falhas)",
                bulk_id,
                status,
                report.succeeded(),
                report.failed()
            ),
            None => tracing::warn!("Lote {} não estava mais em PROCESSING; status final mantido", bulk_id),
        }
        Ok(report)
    }

    /// Marca o lote como FAIL depois que o worker desistiu.
    pub async fn fail_after_retries(&self, bulk_id: Uuid, attempts: u32, error: &AppError) -> Result<(), AppError> {
        let message = format!("Processamento abortado após {attempts} tentativa(s): {error}");
        let details = serde_json::json!({
            "attempts": attempts,
            "lastError": error.to_string(),
        });
        self.bulk
            .finish(
                &self.pool,
                bulk_id,
                BulkSubmissionStatus::Fail,
                Some(&message),
                Some(&details),
            )
            .await?;
        Ok(())
    }

    /// Importação + envio para revisão de uma aplicação do lote.
    async fn process_application(&self, application: &Application) -> ApplicationOutcome {
        let id = application.id;
        let name = application.name.as_str();

        if application.form_reference.is_none() {
            return ApplicationOutcome::failure(id, name, FailureKind::MissingDocument, "nenhum formulário anexado");
        }

        if let Err(e) = self.ingestion.ingest(id).await {
            let kind = match &e {
                AppError::Ingest(ingest) if ingest.is_missing_document() => FailureKind::MissingDocument,
                AppError::Ingest(_) => FailureKind::InvalidForm,
                _ => FailureKind::Internal,
            };
            return ApplicationOutcome::failure(id, name, kind, e.to_string());
        }

        // Reprocessamento: só envia o que ainda está pendente
        if application.status == ApplicationStatus::Pending {
            if let Err(e) = self.application_service.submit(id, ActorRole::System).await {
                return ApplicationOutcome::failure(id, name, FailureKind::Internal, e.to_string());
            }
        }

        ApplicationOutcome::success(id, name)
    }
}
