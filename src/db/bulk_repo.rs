// src/db/bulk_repo.rs

use chrono::Utc;
use serde_json::Value;
use sqlx::{Executor, Sqlite, SqlitePool, types::Json};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::bulk::{BulkSubmission, BulkSubmissionStatus},
};

#[derive(Clone)]
pub struct BulkSubmissionRepository {
    pool: SqlitePool,
}

impl BulkSubmissionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(&self, executor: E, name: &str) -> Result<BulkSubmission, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let now = Utc::now();
        let bulk = sqlx::query_as::<_, BulkSubmission>(
            r#"
            INSERT INTO bulk_submissions (id, name, status, created_at, updated_at)
            VALUES ($1, $2, 'DRAFT', $3, $3)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(now)
        .fetch_one(executor)
        .await?;
        Ok(bulk)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<BulkSubmission>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let bulk = sqlx::query_as::<_, BulkSubmission>("SELECT * FROM bulk_submissions WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(bulk)
    }

    /// DRAFT -> PROCESSING, atômico. `None` quando o lote não estava em rascunho.
    pub async fn mark_processing<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<BulkSubmission>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let bulk = sqlx::query_as::<_, BulkSubmission>(
            r#"
            UPDATE bulk_submissions
            SET status = 'PROCESSING', error_message = NULL, error_details = NULL, updated_at = $1
            WHERE id = $2 AND status = 'DRAFT'
            RETURNING *
            "#,
        )
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(bulk)
    }

    /// Conta mais uma tentativa do worker e devolve o total.
    pub async fn record_attempt<'e, E>(&self, executor: E, id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let attempts: i64 = sqlx::query_scalar(
            r#"
            UPDATE bulk_submissions
            SET attempts = attempts + 1, updated_at = $1
            WHERE id = $2
            RETURNING attempts
            "#,
        )
        .bind(Utc::now())
        .bind(id)
        .fetch_one(executor)
        .await?;
        Ok(attempts)
    }

    /// Grava o status terminal. Só vale para lotes em PROCESSING, então
    /// uma segunda chamada não sobrescreve o resultado.
    pub async fn finish<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: BulkSubmissionStatus,
        error_message: Option<&str>,
        error_details: Option<&Value>,
    ) -> Result<Option<BulkSubmission>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let bulk = sqlx::query_as::<_, BulkSubmission>(
            r#"
            UPDATE bulk_submissions
            SET status = $1, error_message = $2, error_details = $3, updated_at = $4
            WHERE id = $5 AND status = 'PROCESSING'
            RETURNING *
            "#,
        )
        .bind(status)
        .bind(error_message)
        .bind(error_details.map(Json))
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(bulk)
    }

    /// Lotes que ficaram em PROCESSING (ex.: processo reiniciado no meio).
    pub async fn list_processing_ids(&self) -> Result<Vec<Uuid>, AppError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM bulk_submissions WHERE status = 'PROCESSING' ORDER BY updated_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }
}
