// src/services/catalog_import_service.rs

use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::{
    common::error::AppError,
    db::{self, CatalogRepository},
    forms::{FormLoader, Workbook, reference},
    models::catalog::LookupKind,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub created: usize,
    pub existing: usize,
}

/// Carga das listas de referência (categorias, matérias-primas) a partir de
/// planilhas `Codes` / `Description`. Códigos já cadastrados são mantidos.
#[derive(Clone)]
pub struct CatalogImportService {
    pool: SqlitePool,
    catalog: CatalogRepository,
    loader: Arc<dyn FormLoader>,
}

impl CatalogImportService {
    pub fn new(pool: SqlitePool, catalog: CatalogRepository, loader: Arc<dyn FormLoader>) -> Self {
        Self { pool, catalog, loader }
    }

    pub async fn import_reference(&self, kind: LookupKind, reference: &str) -> Result<ImportSummary, AppError> {
        let loader = Arc::clone(&self.loader);
        let owned = reference.to_owned();
        let workbook = tokio::task::spawn_blocking(move || loader.load(&owned))
            .await
            .context("tarefa de leitura da planilha abortou")??;

        tracing::info!("Importando {:?} de '{}'", kind, reference);
        self.import_workbook(kind, &workbook).await
    }

    pub async fn import_workbook(&self, kind: LookupKind, workbook: &Workbook) -> Result<ImportSummary, AppError> {
        let entries = reference::parse_reference_list(workbook)?;

        let mut tx = db::begin_write(&self.pool).await?;
        let mut summary = ImportSummary::default();
        for entry in &entries {
            let (row, created) = self
                .catalog
                .get_or_create_lookup(&mut tx, kind, &entry.code, &entry.description)
                .await?;
            if created {
                summary.created += 1;
                tracing::debug!("Criado: {} - {}", row.code, row.description);
            } else {
                summary.existing += 1;
                tracing::debug!("Já existe: {} - {}", row.code, row.description);
            }
        }
        tx.commit().await?;

        tracing::info!(
            "✅ Importação de {:?} concluída: {} criados, {} existentes",
            kind,
            summary.created,
            summary.existing
        );
        Ok(summary)
    }
}
