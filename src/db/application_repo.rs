// src/db/application_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::application::{
        Application, ApplicationCompanyInfo, ApplicationProduct, ApplicationStatus,
        ApplicationSupplyChainPartner, ApplicationTree, CompanyFields, NewApplicationProduct,
        ReviewDecision,
    },
};

#[derive(Clone)]
pub struct ApplicationRepository {
    pool: SqlitePool,
}

impl ApplicationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  APLICAÇÃO (RAIZ)
    // =========================================================================

    pub async fn create_application<'e, E>(
        &self,
        executor: E,
        name: &str,
        description: &str,
        form_reference: Option<&str>,
        bulk_submission_id: Option<Uuid>,
    ) -> Result<Application, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let now = Utc::now();
        let application = sqlx::query_as::<_, Application>(
            r#"
            INSERT INTO applications (
                id, name, description, status, form_reference, bulk_submission_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, 'pending', $4, $5, $6, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .bind(form_reference)
        .bind(bulk_submission_id)
        .bind(now)
        .fetch_one(executor)
        .await?;

        Ok(application)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Application>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let application = sqlx::query_as::<_, Application>("SELECT * FROM applications WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(application)
    }

    /// Membros de um lote em ordem estável (criação, depois id).
    pub async fn list_by_bulk_submission(&self, bulk_submission_id: Uuid) -> Result<Vec<Application>, AppError> {
        let applications = sqlx::query_as::<_, Application>(
            r#"
            SELECT * FROM applications
            WHERE bulk_submission_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(bulk_submission_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(applications)
    }

    /// Troca de status condicionada ao status atual.
    /// Retorna `None` se outra operação já tiver mudado o status.
    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        expected: ApplicationStatus,
        next: ApplicationStatus,
        submission_date: Option<DateTime<Utc>>,
        rejection_reason: Option<&str>,
    ) -> Result<Option<Application>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let application = sqlx::query_as::<_, Application>(
            r#"
            UPDATE applications
            SET status = $1,
                submission_date = COALESCE($2, submission_date),
                rejection_reason = $3,
                updated_at = $4
            WHERE id = $5 AND status = $6
            RETURNING *
            "#,
        )
        .bind(next)
        .bind(submission_date)
        .bind(rejection_reason)
        .bind(Utc::now())
        .bind(id)
        .bind(expected)
        .fetch_optional(executor)
        .await?;
        Ok(application)
    }

    // =========================================================================
    //  STAGING
    // =========================================================================

    pub async fn insert_company_info<'e, E>(
        &self,
        executor: E,
        application_id: Uuid,
        fields: &CompanyFields,
    ) -> Result<ApplicationCompanyInfo, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, ApplicationCompanyInfo>(
            r#"
            INSERT INTO application_company_infos (
                id, application_id, name, address, city, state, zip_code, country
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(application_id)
        .bind(&fields.name)
        .bind(&fields.address)
        .bind(&fields.city)
        .bind(&fields.state)
        .bind(&fields.zip_code)
        .bind(&fields.country)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            // 1:1 com a aplicação
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::ApplicationAlreadyIngested(application_id);
                }
            }
            e.into()
        })
    }

    pub async fn insert_partner<'e, E>(
        &self,
        executor: E,
        application_id: Uuid,
        fields: &CompanyFields,
    ) -> Result<ApplicationSupplyChainPartner, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let partner = sqlx::query_as::<_, ApplicationSupplyChainPartner>(
            r#"
            INSERT INTO application_supply_chain_partners (
                id, application_id, name, address, city, state, zip_code, country
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(application_id)
        .bind(&fields.name)
        .bind(&fields.address)
        .bind(&fields.city)
        .bind(&fields.state)
        .bind(&fields.zip_code)
        .bind(&fields.country)
        .fetch_one(executor)
        .await?;
        Ok(partner)
    }

    pub async fn insert_product<'e, E>(
        &self,
        executor: E,
        application_id: Uuid,
        product: &NewApplicationProduct,
    ) -> Result<ApplicationProduct, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let product = sqlx::query_as::<_, ApplicationProduct>(
            r#"
            INSERT INTO application_products (
                id, application_id, supply_chain_partner_name_raw,
                product_name, product_category, raw_materials_list
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(application_id)
        .bind(&product.supply_chain_partner_name_raw)
        .bind(&product.product_name)
        .bind(&product.product_category)
        .bind(&product.raw_materials_list)
        .fetch_one(executor)
        .await?;
        Ok(product)
    }

    pub async fn has_company_info<'e, E>(&self, executor: E, application_id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM application_company_infos WHERE application_id = $1)",
        )
        .bind(application_id)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    /// Aplicação + empresa + parceiros + produtos, na ordem de inserção.
    pub async fn fetch_tree(
        &self,
        conn: &mut SqliteConnection,
        application_id: Uuid,
    ) -> Result<Option<ApplicationTree>, AppError> {
        let Some(application) = self.find_by_id(&mut *conn, application_id).await? else {
            return Ok(None);
        };

        let company_info = sqlx::query_as::<_, ApplicationCompanyInfo>(
            "SELECT * FROM application_company_infos WHERE application_id = $1",
        )
        .bind(application_id)
        .fetch_optional(&mut *conn)
        .await?;

        let partners = sqlx::query_as::<_, ApplicationSupplyChainPartner>(
            "SELECT * FROM application_supply_chain_partners WHERE application_id = $1 ORDER BY rowid",
        )
        .bind(application_id)
        .fetch_all(&mut *conn)
        .await?;

        let products = sqlx::query_as::<_, ApplicationProduct>(
            "SELECT * FROM application_products WHERE application_id = $1 ORDER BY rowid",
        )
        .bind(application_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(Some(ApplicationTree { application, company_info, partners, products }))
    }

    // =========================================================================
    //  DECISÕES DE REVISÃO
    // =========================================================================

    pub async fn review_company_info<'e, E>(
        &self,
        executor: E,
        application_id: Uuid,
        decision: &ReviewDecision,
    ) -> Result<Option<ApplicationCompanyInfo>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let info = sqlx::query_as::<_, ApplicationCompanyInfo>(
            r#"
            UPDATE application_company_infos
            SET is_approved = $1, rejection_reason = $2
            WHERE application_id = $3
            RETURNING *
            "#,
        )
        .bind(decision.is_approved)
        .bind(decision.rejection_reason.as_deref())
        .bind(application_id)
        .fetch_optional(executor)
        .await?;
        Ok(info)
    }

    pub async fn review_partner<'e, E>(
        &self,
        executor: E,
        application_id: Uuid,
        partner_id: Uuid,
        decision: &ReviewDecision,
    ) -> Result<Option<ApplicationSupplyChainPartner>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let partner = sqlx::query_as::<_, ApplicationSupplyChainPartner>(
            r#"
            UPDATE application_supply_chain_partners
            SET is_approved = $1, rejection_reason = $2
            WHERE id = $3 AND application_id = $4
            RETURNING *
            "#,
        )
        .bind(decision.is_approved)
        .bind(decision.rejection_reason.as_deref())
        .bind(partner_id)
        .bind(application_id)
        .fetch_optional(executor)
        .await?;
        Ok(partner)
    }

    pub async fn review_product<'e, E>(
        &self,
        executor: E,
        application_id: Uuid,
        product_id: Uuid,
        decision: &ReviewDecision,
    ) -> Result<Option<ApplicationProduct>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let product = sqlx::query_as::<_, ApplicationProduct>(
            r#"
            UPDATE application_products
            SET is_approved = $1, rejection_reason = $2
            WHERE id = $3 AND application_id = $4
            RETURNING *
            "#,
        )
        .bind(decision.is_approved)
        .bind(decision.rejection_reason.as_deref())
        .bind(product_id)
        .bind(application_id)
        .fetch_optional(executor)
        .await?;
        Ok(product)
    }

    pub async fn set_resolved_partner<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        partner_id: Option<Uuid>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query("UPDATE application_products SET resolved_partner_id = $1 WHERE id = $2")
            .bind(partner_id)
            .bind(product_id)
            .execute(executor)
            .await?;
        Ok(())
    }
}
