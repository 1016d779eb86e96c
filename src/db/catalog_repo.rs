// src/db/catalog_repo.rs

use chrono::Utc;
use sqlx::{Executor, Sqlite, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        application::CompanyFields,
        catalog::{Address, Company, LookupEntry, LookupKind, Product, SupplyChainCompany},
    },
};

#[derive(Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  EMPRESAS E ENDEREÇOS
    // =========================================================================

    pub async fn create_address<'e, E>(&self, executor: E, fields: &CompanyFields) -> Result<Address, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let address = sqlx::query_as::<_, Address>(
            r#"
            INSERT INTO addresses (id, address, city, state, zip_code, country)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&fields.address)
        .bind(&fields.city)
        .bind(&fields.state)
        .bind(&fields.zip_code)
        .bind(&fields.country)
        .fetch_one(executor)
        .await?;
        Ok(address)
    }

    pub async fn create_company<'e, E>(
        &self,
        executor: E,
        name: &str,
        address_id: Uuid,
    ) -> Result<Company, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let company = sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (id, name, address_id, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(address_id)
        .bind(Utc::now())
        .fetch_one(executor)
        .await?;
        Ok(company)
    }

    pub async fn create_supply_chain_company<'e, E>(
        &self,
        executor: E,
        name: &str,
        is_valid: bool,
        address_id: Uuid,
    ) -> Result<SupplyChainCompany, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let company = sqlx::query_as::<_, SupplyChainCompany>(
            r#"
            INSERT INTO supply_chain_companies (id, name, is_valid, address_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(is_valid)
        .bind(address_id)
        .bind(Utc::now())
        .fetch_one(executor)
        .await?;
        Ok(company)
    }

    // =========================================================================
    //  LOOKUPS (CATEGORIA / DETALHE / MATÉRIA-PRIMA)
    // =========================================================================

    pub async fn find_lookup_by_code<'e, E>(
        &self,
        executor: E,
        kind: LookupKind,
        code: &str,
    ) -> Result<Option<LookupEntry>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("SELECT * FROM {} WHERE code = $1", kind.table());
        let entry = sqlx::query_as::<_, LookupEntry>(&sql)
            .bind(code)
            .fetch_optional(executor)
            .await?;
        Ok(entry)
    }

    /// Busca pelo código e cria se não existir. O `UNIQUE(code)` é quem manda:
    /// se outra transação inserir o mesmo código antes, a violação vira reuso.
    ///
    /// Retorna a linha e `true` quando ela foi criada agora.
    pub async fn get_or_create_lookup(
        &self,
        conn: &mut SqliteConnection,
        kind: LookupKind,
        code: &str,
        description: &str,
    ) -> Result<(LookupEntry, bool), AppError> {
        if let Some(existing) = self.find_lookup_by_code(&mut *conn, kind, code).await? {
            return Ok((existing, false));
        }

        let sql = format!(
            "INSERT INTO {} (id, code, description, is_active) VALUES ($1, $2, $3, 1) RETURNING *",
            kind.table()
        );
        let inserted = sqlx::query_as::<_, LookupEntry>(&sql)
            .bind(Uuid::new_v4())
            .bind(code)
            .bind(description)
            .fetch_one(&mut *conn)
            .await;

        match inserted {
            Ok(entry) => Ok((entry, true)),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                tracing::debug!("Código {} criado por outra transação, reutilizando", code);
                let existing = self
                    .find_lookup_by_code(&mut *conn, kind, code)
                    .await?
                    .ok_or_else(|| anyhow::anyhow!("código {code} sumiu após violação de unicidade"))?;
                Ok((existing, false))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_lookups(&self, kind: LookupKind) -> Result<Vec<LookupEntry>, AppError> {
        let sql = format!("SELECT * FROM {} ORDER BY code ASC", kind.table());
        let entries = sqlx::query_as::<_, LookupEntry>(&sql).fetch_all(&self.pool).await?;
        Ok(entries)
    }

    // =========================================================================
    //  PRODUTOS
    // =========================================================================

    pub async fn create_product<'e, E>(
        &self,
        executor: E,
        name: &str,
        detail_id: Uuid,
        category_id: Uuid,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (id, name, detail_id, category_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(detail_id)
        .bind(category_id)
        .bind(Utc::now())
        .fetch_one(executor)
        .await?;
        Ok(product)
    }

    pub async fn link_raw_material<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        raw_material_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO product_raw_materials (product_id, raw_material_id)
            VALUES ($1, $2)
            ON CONFLICT (product_id, raw_material_id) DO NOTHING
            "#,
        )
        .bind(product_id)
        .bind(raw_material_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    pub async fn list_companies(&self) -> Result<Vec<Company>, AppError> {
        let rows = sqlx::query_as::<_, Company>("SELECT * FROM companies ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn list_supply_chain_companies(&self) -> Result<Vec<SupplyChainCompany>, AppError> {
        let rows = sqlx::query_as::<_, SupplyChainCompany>(
            "SELECT * FROM supply_chain_companies ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        let rows = sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn raw_materials_of(&self, product_id: Uuid) -> Result<Vec<LookupEntry>, AppError> {
        let rows = sqlx::query_as::<_, LookupEntry>(
            r#"
            SELECT rm.*
            FROM raw_materials rm
            JOIN product_raw_materials prm ON prm.raw_material_id = rm.id
            WHERE prm.product_id = $1
            ORDER BY rm.code ASC
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn count_addresses(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM addresses")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
