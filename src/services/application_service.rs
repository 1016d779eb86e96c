// src/services/application_service.rs

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{self, ApplicationRepository},
    models::application::{
        Application, ApplicationProduct, ApplicationSupplyChainPartner, ApplicationTree, StagedForm,
    },
    services::{
        completion_service::normalize_name,
        workflow::{self, ActorRole, ApplicationAction, TransitionError},
    },
};

/// Resultado do casamento produto -> parceiro por nome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartnerLinkReport {
    pub linked: usize,
    /// Produtos cujo nome de parceiro não bate com nenhum parceiro da aplicação.
    pub unmatched: Vec<String>,
    /// Produtos cujo nome bate com mais de um parceiro; ficam sem vínculo.
    pub ambiguous: Vec<String>,
}

/// Casa cada produto com o parceiro de mesmo nome (sem diferenciar caixa).
/// Devolve `(produto, parceiro resolvido)` para todos os produtos.
pub fn resolve_partner_links(
    partners: &[ApplicationSupplyChainPartner],
    products: &[ApplicationProduct],
) -> (Vec<(Uuid, Option<Uuid>)>, PartnerLinkReport) {
    let mut by_name: HashMap<String, Vec<Uuid>> = HashMap::new();
    for partner in partners {
        by_name.entry(normalize_name(&partner.name)).or_default().push(partner.id);
    }

    let mut report = PartnerLinkReport::default();
    let links = products
        .iter()
        .map(|product| {
            let label = format!("{} ({})", product.product_name, product.supply_chain_partner_name_raw);
            let resolved = match by_name.get(&normalize_name(&product.supply_chain_partner_name_raw)) {
                Some(ids) if ids.len() == 1 => {
                    report.linked += 1;
                    Some(ids[0])
                }
                Some(_) => {
                    report.ambiguous.push(label);
                    None
                }
                None => {
                    report.unmatched.push(label);
                    None
                }
            };
            (product.id, resolved)
        })
        .collect();

    (links, report)
}

#[derive(Clone)]
pub struct ApplicationService {
    pool: SqlitePool,
    applications: ApplicationRepository,
}

impl ApplicationService {
    pub fn new(pool: SqlitePool, applications: ApplicationRepository) -> Self {
        Self { pool, applications }
    }

    pub async fn create_application(
        &self,
        name: &str,
        description: &str,
        form_reference: Option<&str>,
    ) -> Result<Application, AppError> {
        let application = self
            .applications
            .create_application(&self.pool, name, description, form_reference, None)
            .await?;
        tracing::info!("✅ Aplicação '{}' criada ({})", application.name, application.id);
        Ok(application)
    }

    /// Entrada manual (atendimento): aplicação e staging numa transação só.
    pub async fn intake(
        &self,
        name: &str,
        description: &str,
        form: &StagedForm,
    ) -> Result<(ApplicationTree, PartnerLinkReport), AppError> {
        let mut tx = db::begin_write(&self.pool).await?;

        let application = self
            .applications
            .create_application(&mut *tx, name, description, None, None)
            .await?;
        let links = self.stage(&mut tx, application.id, form).await?;
        let tree = self
            .applications
            .fetch_tree(&mut tx, application.id)
            .await?
            .ok_or(AppError::ApplicationNotFound(application.id))?;

        tx.commit().await?;

        tracing::info!(
            "✅ Aplicação '{}' registrada manualmente ({} parceiros, {} produtos)",
            tree.application.name,
            tree.partners.len(),
            tree.products.len()
        );
        Ok((tree, links))
    }

    /// Grava o conteúdo do formulário na staging e roda o casamento de parceiros.
    pub async fn stage(
        &self,
        conn: &mut SqliteConnection,
        application_id: Uuid,
        form: &StagedForm,
    ) -> Result<PartnerLinkReport, AppError> {
        self.applications
            .insert_company_info(&mut *conn, application_id, &form.company_info)
            .await?;
        for partner in &form.partners {
            self.applications.insert_partner(&mut *conn, application_id, partner).await?;
        }
        for product in &form.products {
            self.applications.insert_product(&mut *conn, application_id, product).await?;
        }

        self.link_partners(conn, application_id).await
    }

    pub async fn link_partners(
        &self,
        conn: &mut SqliteConnection,
        application_id: Uuid,
    ) -> Result<PartnerLinkReport, AppError> {
        let tree = self
            .applications
            .fetch_tree(&mut *conn, application_id)
            .await?
            .ok_or(AppError::ApplicationNotFound(application_id))?;

        let (links, report) = resolve_partner_links(&tree.partners, &tree.products);
        for (product_id, partner_id) in links {
            self.applications
                .set_resolved_partner(&mut *conn, product_id, partner_id)
                .await?;
        }

        for label in report.unmatched.iter().chain(&report.ambiguous) {
            tracing::warn!("Aplicação {}: produto sem parceiro resolvido: {}", application_id, label);
        }
        Ok(report)
    }

    pub async fn get_tree(&self, application_id: Uuid) -> Result<ApplicationTree, AppError> {
        let mut conn = self.pool.acquire().await?;
        self.applications
            .fetch_tree(&mut conn, application_id)
            .await?
            .ok_or(AppError::ApplicationNotFound(application_id))
    }

    /// pending -> in_review, carimbando a data de submissão.
    pub async fn submit(&self, application_id: Uuid, role: ActorRole) -> Result<Application, AppError> {
        let mut tx = db::begin_write(&self.pool).await?;

        let application = self
            .applications
            .find_by_id(&mut *tx, application_id)
            .await?
            .ok_or(AppError::ApplicationNotFound(application_id))?;

        let next = workflow::transition(application.status, ApplicationAction::Submit, role)?;
        let updated = self
            .applications
            .update_status(&mut *tx, application_id, application.status, next, Some(Utc::now()), None)
            .await?
            .ok_or(TransitionError::NotAllowed {
                current: application.status,
                action: ApplicationAction::Submit,
            })?;

        tx.commit().await?;

        tracing::info!("✅ Aplicação {} enviada para revisão por {}", application_id, role);
        Ok(updated)
    }
}
