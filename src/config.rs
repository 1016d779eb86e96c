// src/config.rs

use std::{env, path::PathBuf, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::SqlitePool;

use crate::{
    db::{self, ApplicationRepository, BulkSubmissionRepository, CatalogRepository},
    forms::{FormLoader, XlsxFormLoader},
    services::{
        ApplicationService, BulkService, CatalogImportService, CompletionService, IngestionService,
        ReviewService,
        bulk_worker::{BulkQueue, RetryPolicy, spawn_bulk_worker},
    },
};

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    // Pasta base das referências de formulário relativas
    pub forms_dir: PathBuf,
    pub bulk_retry: RetryPolicy,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let forms_dir = env::var("FORMS_DIR").unwrap_or_else(|_| "./forms".to_string()).into();

        Ok(Self {
            database_url,
            bind_addr,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", 5)?,
            forms_dir,
            bulk_retry: RetryPolicy {
                max_attempts: parse_var("BULK_MAX_ATTEMPTS", 3)?,
                base_delay: Duration::from_millis(parse_var("BULK_RETRY_BASE_MS", 500)?),
            },
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().with_context(|| format!("{name} inválida: '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub catalog_repo: CatalogRepository,
    pub application_service: ApplicationService,
    pub completion_service: CompletionService,
    pub review_service: ReviewService,
    pub ingestion_service: IngestionService,
    pub bulk_service: BulkService,
    pub catalog_import_service: CatalogImportService,
}

impl AppState {
    /// Conecta, migra e sobe o worker de lotes.
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        let db_pool = db::connect(&settings.database_url, settings.db_max_connections)
            .await
            .context("falha ao conectar no banco de dados")?;
        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        db::run_migrations(&db_pool)
            .await
            .context("falha ao rodar as migrações do banco de dados")?;
        tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

        let loader: Arc<dyn FormLoader> = Arc::new(XlsxFormLoader::new(settings.forms_dir.clone()));
        Ok(Self::build(db_pool, loader, settings.bulk_retry))
    }

    /// Monta o grafo de dependências sobre um pool já migrado.
    /// Precisa de um runtime tokio ativo (o worker é spawnado aqui).
    pub fn build(db_pool: SqlitePool, loader: Arc<dyn FormLoader>, retry: RetryPolicy) -> Self {
        let application_repo = ApplicationRepository::new(db_pool.clone());
        let bulk_repo = BulkSubmissionRepository::new(db_pool.clone());
        let catalog_repo = CatalogRepository::new(db_pool.clone());

        let application_service = ApplicationService::new(db_pool.clone(), application_repo.clone());
        let completion_service =
            CompletionService::new(db_pool.clone(), application_repo.clone(), catalog_repo.clone());
        let review_service =
            ReviewService::new(db_pool.clone(), application_repo.clone(), completion_service.clone());
        let ingestion_service = IngestionService::new(
            db_pool.clone(),
            application_repo.clone(),
            application_service.clone(),
            Arc::clone(&loader),
        );
        let catalog_import_service = CatalogImportService::new(db_pool.clone(), catalog_repo.clone(), loader);

        let (queue, receiver) = BulkQueue::channel();
        let bulk_service = BulkService::new(
            db_pool.clone(),
            bulk_repo,
            application_repo,
            application_service.clone(),
            ingestion_service.clone(),
            queue,
        );
        spawn_bulk_worker(bulk_service.clone(), receiver, retry);

        Self {
            db_pool,
            catalog_repo,
            application_service,
            completion_service,
            review_service,
            ingestion_service,
            bulk_service,
            catalog_import_service,
        }
    }
}
