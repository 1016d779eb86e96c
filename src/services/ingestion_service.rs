// src/services/ingestion_service.rs

use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{self, ApplicationRepository},
    forms::{FormLoader, IngestError, parser},
    services::application_service::{ApplicationService, PartnerLinkReport},
};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IngestionOutcome {
    Ingested {
        partners: usize,
        products: usize,
        links: PartnerLinkReport,
    },
    /// A staging já estava preenchida; nada foi lido.
    AlreadyStaged,
}

#[derive(Clone)]
pub struct IngestionService {
    pool: SqlitePool,
    applications: ApplicationRepository,
    application_service: ApplicationService,
    loader: Arc<dyn FormLoader>,
}

impl IngestionService {
    pub fn new(
        pool: SqlitePool,
        applications: ApplicationRepository,
        application_service: ApplicationService,
        loader: Arc<dyn FormLoader>,
    ) -> Self {
        Self { pool, applications, application_service, loader }
    }

    /// Lê o formulário da aplicação e grava a staging numa única transação.
    /// Aplicações já importadas são ignoradas, o que torna o reprocessamento seguro.
    pub async fn ingest(&self, application_id: Uuid) -> Result<IngestionOutcome, AppError> {
        let application = self
            .applications
            .find_by_id(&self.pool, application_id)
            .await?
            .ok_or(AppError::ApplicationNotFound(application_id))?;

        if self.applications.has_company_info(&self.pool, application_id).await? {
            tracing::debug!("Aplicação {} já possui staging, importação ignorada", application_id);
            return Ok(IngestionOutcome::AlreadyStaged);
        }

        let reference = application.form_reference.ok_or(IngestError::NoForm)?;

        // calamine é síncrono
        let loader = Arc::clone(&self.loader);
        let workbook = tokio::task::spawn_blocking(move || loader.load(&reference))
            .await
            .context("tarefa de leitura do formulário abortou")??;

        let form = parser::parse_form(&workbook)?;

        let mut tx = db::begin_write(&self.pool).await?;
        let links = self.application_service.stage(&mut tx, application_id, &form).await?;
        tx.commit().await?;

        tracing::info!(
            "✅ Formulário da aplicação {} importado: {} parceiros, {} produtos",
            application_id,
            form.partners.len(),
            form.products.len()
        );

        Ok(IngestionOutcome::Ingested {
            partners: form.partners.len(),
            products: form.products.len(),
            links,
        })
    }
}
