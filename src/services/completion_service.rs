// src/services/completion_service.rs

//! Motor de promoção: transforma a fatia aprovada da staging em registros
//! permanentes do catálogo.
//!
//! Tudo roda dentro da transação de quem chama. Falhas de um parceiro ou de
//! um produto ficam isoladas num savepoint; falha ao criar a empresa derruba
//! a operação inteira.

use std::collections::HashMap;

use serde::Serialize;
use sqlx::{Connection, SqliteConnection, SqlitePool};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::{
        code::derive_code,
        error::AppError,
    },
    db::{self, ApplicationRepository, CatalogRepository},
    models::{
        application::{
            ApplicationCompanyInfo, ApplicationProduct, ApplicationSupplyChainPartner, ApplicationTree,
            CompanyFields,
        },
        catalog::{LookupEntry, LookupKind, Product, SupplyChainCompany},
    },
};

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("A aplicação não possui informações da empresa")]
    MissingCompanyInfo,

    #[error("As informações da empresa não foram aprovadas")]
    CompanyInfoNotApproved,

    #[error("Falha ao criar a empresa: {0}")]
    CompanyPromotion(#[source] AppError),

    #[error(transparent)]
    Storage(#[from] AppError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl CompletionError {
    /// Falhas de validação não tocam em nada; as demais exigem rollback.
    pub fn is_validation(&self) -> bool {
        matches!(self, CompletionError::MissingCompanyInfo | CompletionError::CompanyInfoNotApproved)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StagedItemKind {
    Partner,
    Product,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SkippedItem {
    pub kind: StagedItemKind,
    pub item_id: Uuid,
    pub reason: String,
}

/// O que uma promoção criou, o que pulou e o que merece atenção do revisor.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompletionReport {
    pub application_id: Uuid,
    pub company_id: Uuid,
    pub supply_chain_company_ids: Vec<Uuid>,
    pub product_ids: Vec<Uuid>,
    pub skipped: Vec<SkippedItem>,
    /// Produtos cujo parceiro não bate com nenhum parceiro aprovado.
    pub unmatched_partner_warnings: Vec<String>,
    /// Códigos reaproveitados com uma descrição diferente da enviada.
    pub code_collisions: Vec<String>,
}

impl CompletionReport {
    fn new(application_id: Uuid, company_id: Uuid) -> Self {
        Self {
            application_id,
            company_id,
            supply_chain_company_ids: Vec::new(),
            product_ids: Vec::new(),
            skipped: Vec::new(),
            unmatched_partner_warnings: Vec::new(),
            code_collisions: Vec::new(),
        }
    }

    fn skip(&mut self, kind: StagedItemKind, item_id: Uuid, reason: impl Into<String>) {
        self.skipped.push(SkippedItem { kind, item_id, reason: reason.into() });
    }
}

#[derive(Clone)]
pub struct CompletionService {
    pool: SqlitePool,
    applications: ApplicationRepository,
    catalog: CatalogRepository,
}

impl CompletionService {
    pub fn new(pool: SqlitePool, applications: ApplicationRepository, catalog: CatalogRepository) -> Self {
        Self { pool, applications, catalog }
    }

    /// Promove a aplicação na sua própria transação: ou tudo é gravado, ou nada.
    pub async fn complete(&self, application_id: Uuid) -> bool {
        match self.try_complete(application_id).await {
            Ok(report) => {
                tracing::info!(
                    "✅ Aplicação {} promovida ({} parceiros, {} produtos)",
                    application_id,
                    report.supply_chain_company_ids.len(),
                    report.product_ids.len()
                );
                true
            }
            Err(e) if e.is_validation() => {
                tracing::warn!("Aplicação {} não pode ser concluída: {}", application_id, e);
                false
            }
            Err(e) => {
                tracing::error!("Promoção da aplicação {} revertida: {}", application_id, e);
                false
            }
        }
    }

    pub async fn try_complete(&self, application_id: Uuid) -> Result<CompletionReport, CompletionError> {
        let mut tx = db::begin_write(&self.pool).await?;

        let tree = self
            .applications
            .fetch_tree(&mut tx, application_id)
            .await?
            .ok_or(AppError::ApplicationNotFound(application_id))?;

        let report = self.promote(&mut tx, &tree).await?;

        tx.commit().await?;
        Ok(report)
    }

    /// Pré-condição obrigatória: uma `company_info`, aprovada.
    pub fn validate(tree: &ApplicationTree) -> Result<&ApplicationCompanyInfo, CompletionError> {
        let info = tree.company_info.as_ref().ok_or(CompletionError::MissingCompanyInfo)?;
        if !info.is_approved {
            return Err(CompletionError::CompanyInfoNotApproved);
        }
        Ok(info)
    }

    /// Promove a árvore usando a conexão (transação) de quem chama.
    /// Em caso de erro o chamador deve descartar a transação.
    pub async fn promote(
        &self,
        conn: &mut SqliteConnection,
        tree: &ApplicationTree,
    ) -> Result<CompletionReport, CompletionError> {
        let application_id = tree.application.id;
        let info = Self::validate(tree)?;

        tracing::debug!(
            "Promovendo aplicação {}: {} parceiros ({} aprovados), {} produtos ({} aprovados)",
            application_id,
            tree.partners.len(),
            tree.approved_partners().count(),
            tree.products.len(),
            tree.approved_products().count()
        );

        // --- 1. Empresa (fatal) ---
        let company_id = self
            .promote_company(conn, application_id, info)
            .await
            .map_err(CompletionError::CompanyPromotion)?;
        let mut report = CompletionReport::new(application_id, company_id);

        // --- 2. Parceiros (isolados) ---
        let mut partners_by_name: HashMap<String, Uuid> = HashMap::new();

        for partner in &tree.partners {
            if !partner.is_approved {
                tracing::debug!("Parceiro {} não aprovado, ignorado", partner.id);
                continue;
            }

            let mut savepoint = conn.begin().await?;
            match self.promote_partner(&mut savepoint, partner).await {
                Ok(created) => {
                    savepoint.commit().await?;
                    partners_by_name.insert(normalize_name(&partner.name), created.id);
                    report.supply_chain_company_ids.push(created.id);
                }
                Err(e) => {
                    savepoint.rollback().await?;
                    tracing::warn!("Falha ao promover parceiro {}: {}. Seguindo sem ele.", partner.id, e);
                    report.skip(StagedItemKind::Partner, partner.id, e.to_string());
                }
            }
        }

        // --- 3. Produtos (isolados) ---
        for product in &tree.products {
            if !product.is_approved {
                tracing::debug!("Produto {} não aprovado, ignorado", product.id);
                continue;
            }
            if product.product_name.trim().is_empty() {
                tracing::warn!("Produto {} sem nome, ignorado", product.id);
                report.skip(StagedItemKind::Product, product.id, "produto sem nome");
                continue;
            }
            if product.product_category.trim().is_empty() {
                tracing::warn!("Produto {} sem categoria, ignorado", product.id);
                report.skip(StagedItemKind::Product, product.id, "produto sem categoria");
                continue;
            }

            // Vínculo com o parceiro é informativo
            if !partners_by_name.contains_key(&normalize_name(&product.supply_chain_partner_name_raw)) {
                let warning = format!(
                    "Produto '{}' cita o parceiro '{}', que não corresponde a nenhum parceiro aprovado",
                    product.product_name, product.supply_chain_partner_name_raw
                );
                tracing::warn!("{}", warning);
                report.unmatched_partner_warnings.push(warning);
            }

            let mut savepoint = conn.begin().await?;
            match self.promote_product(&mut savepoint, product, &mut report.code_collisions).await {
                Ok(created) => {
                    savepoint.commit().await?;
                    report.product_ids.push(created.id);
                }
                Err(e) => {
                    savepoint.rollback().await?;
                    tracing::warn!("Falha ao promover produto {}: {}. Seguindo sem ele.", product.id, e);
                    report.skip(StagedItemKind::Product, product.id, e.to_string());
                }
            }
        }

        Ok(report)
    }

    async fn promote_company(
        &self,
        conn: &mut SqliteConnection,
        application_id: Uuid,
        info: &ApplicationCompanyInfo,
    ) -> Result<Uuid, AppError> {
        let fields = CompanyFields {
            name: info.name.clone(),
            address: info.address.clone(),
            city: info.city.clone(),
            state: info.state.clone(),
            zip_code: info.zip_code.clone(),
            country: info.country.clone(),
        };
        let address = self.catalog.create_address(&mut *conn, &fields).await?;

        let name = fallback_name(&info.name, "Company", application_id);
        let company = self.catalog.create_company(&mut *conn, &name, address.id).await?;

        tracing::debug!("Empresa '{}' criada ({})", company.name, company.id);
        Ok(company.id)
    }

    async fn promote_partner(
        &self,
        conn: &mut SqliteConnection,
        partner: &ApplicationSupplyChainPartner,
    ) -> Result<SupplyChainCompany, AppError> {
        let fields = CompanyFields {
            name: partner.name.clone(),
            address: partner.address.clone(),
            city: partner.city.clone(),
            state: partner.state.clone(),
            zip_code: partner.zip_code.clone(),
            country: partner.country.clone(),
        };
        let address = self.catalog.create_address(&mut *conn, &fields).await?;

        let name = fallback_name(&partner.name, "Partner", partner.id);
        self.catalog
            .create_supply_chain_company(&mut *conn, &name, true, address.id)
            .await
    }

    async fn promote_product(
        &self,
        conn: &mut SqliteConnection,
        product: &ApplicationProduct,
        collisions: &mut Vec<String>,
    ) -> Result<Product, AppError> {
        let category = self
            .lookup(conn, LookupKind::ProductCategory, &product.product_category, collisions)
            .await?;
        let detail = self
            .lookup(conn, LookupKind::ProductDetail, &product.product_name, collisions)
            .await?;

        let mut materials = Vec::new();
        for name in product.raw_material_names() {
            materials.push(self.lookup(conn, LookupKind::RawMaterial, name, collisions).await?);
        }

        let created = self
            .catalog
            .create_product(&mut *conn, product.product_name.trim(), detail.id, category.id)
            .await?;
        for material in &materials {
            self.catalog.link_raw_material(&mut *conn, created.id, material.id).await?;
        }

        tracing::debug!(
            "Produto '{}' criado ({}) com {} matérias-primas",
            product.product_name,
            created.id,
            materials.len()
        );
        Ok(created)
    }

    async fn lookup(
        &self,
        conn: &mut SqliteConnection,
        kind: LookupKind,
        text: &str,
        collisions: &mut Vec<String>,
    ) -> Result<LookupEntry, AppError> {
        let description = text.trim();
        let code = derive_code(kind.code_prefix(), description);
        let (entry, created) = self.catalog.get_or_create_lookup(conn, kind, &code, description).await?;

        if !created && !same_description(&entry.description, description) {
            let msg = format!(
                "Código {} já pertence a '{}'; '{}' foi associado a ele",
                code, entry.description, description
            );
            tracing::warn!("Colisão de código: {}", msg);
            collisions.push(msg);
        }
        Ok(entry)
    }
}

pub(crate) fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Mesma caixa usada por `derive_code`, inclusive fora do ASCII.
fn same_description(stored: &str, submitted: &str) -> bool {
    stored.trim().to_uppercase() == submitted.trim().to_uppercase()
}

fn fallback_name(name: &str, prefix: &str, id: Uuid) -> String {
    let name = name.trim();
    if name.is_empty() { format!("{prefix}-{id}") } else { name.to_owned() }
}
