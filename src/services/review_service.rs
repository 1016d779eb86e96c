// src/services/review_service.rs

use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{self, ApplicationRepository},
    models::application::{
        Application, ApplicationCompanyInfo, ApplicationProduct, ApplicationStatus,
        ApplicationSupplyChainPartner, ApplicationTree, ReviewDecision,
    },
    services::{
        completion_service::{CompletionReport, CompletionService},
        workflow::{self, ActorRole, ApplicationAction, TransitionError},
    },
};

/// Política de aceite: empresa aprovada e nenhum parceiro ou produto reprovado.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject { reasons: Vec<String> },
}

impl Decision {
    pub fn is_accept(&self) -> bool {
        matches!(self, Decision::Accept)
    }
}

pub fn evaluate_decision(tree: &ApplicationTree) -> Decision {
    let mut reasons = Vec::new();

    match &tree.company_info {
        None => reasons.push("Informações da empresa ausentes".to_string()),
        Some(info) if !info.is_approved => {
            reasons.push(with_reason("Informações da empresa não aprovadas", &info.rejection_reason))
        }
        Some(_) => {}
    }

    for partner in tree.unapproved_partners() {
        reasons.push(with_reason(
            &format!("Parceiro '{}' não aprovado", partner.name),
            &partner.rejection_reason,
        ));
    }

    for product in tree.unapproved_products() {
        reasons.push(with_reason(
            &format!("Produto '{}' não aprovado", product.product_name),
            &product.rejection_reason,
        ));
    }

    if reasons.is_empty() { Decision::Accept } else { Decision::Reject { reasons } }
}

fn with_reason(message: &str, reason: &Option<String>) -> String {
    match reason.as_deref().map(str::trim) {
        Some(r) if !r.is_empty() => format!("{message}: {r}"),
        _ => message.to_string(),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DecisionOutcome {
    Completed { application: Application, report: CompletionReport },
    Rejected { application: Application, reasons: Vec<String> },
}

impl DecisionOutcome {
    pub fn application(&self) -> &Application {
        match self {
            DecisionOutcome::Completed { application, .. } | DecisionOutcome::Rejected { application, .. } => {
                application
            }
        }
    }
}

#[derive(Clone)]
pub struct ReviewService {
    pool: SqlitePool,
    applications: ApplicationRepository,
    completion: CompletionService,
}

impl ReviewService {
    pub fn new(pool: SqlitePool, applications: ApplicationRepository, completion: CompletionService) -> Self {
        Self { pool, applications, completion }
    }

    // =========================================================================
    //  DECISÕES ITEM A ITEM
    // =========================================================================

    pub async fn review_company_info(
        &self,
        application_id: Uuid,
        role: ActorRole,
        decision: &ReviewDecision,
    ) -> Result<ApplicationCompanyInfo, AppError> {
        let mut tx = db::begin_write(&self.pool).await?;
        self.ensure_reviewable(&mut tx, application_id, role).await?;

        let info = self
            .applications
            .review_company_info(&mut *tx, application_id, decision)
            .await?
            .ok_or(AppError::StagedItemNotFound(application_id))?;

        tx.commit().await?;
        tracing::debug!("Empresa da aplicação {} revisada: aprovada={}", application_id, info.is_approved);
        Ok(info)
    }

    pub async fn review_partner(
        &self,
        application_id: Uuid,
        partner_id: Uuid,
        role: ActorRole,
        decision: &ReviewDecision,
    ) -> Result<ApplicationSupplyChainPartner, AppError> {
        let mut tx = db::begin_write(&self.pool).await?;
        self.ensure_reviewable(&mut tx, application_id, role).await?;

        let partner = self
            .applications
            .review_partner(&mut *tx, application_id, partner_id, decision)
            .await?
            .ok_or(AppError::StagedItemNotFound(partner_id))?;

        tx.commit().await?;
        tracing::debug!("Parceiro {} revisado: aprovado={}", partner_id, partner.is_approved);
        Ok(partner)
    }

    pub async fn review_product(
        &self,
        application_id: Uuid,
        product_id: Uuid,
        role: ActorRole,
        decision: &ReviewDecision,
    ) -> Result<ApplicationProduct, AppError> {
        let mut tx = db::begin_write(&self.pool).await?;
        self.ensure_reviewable(&mut tx, application_id, role).await?;

        let product = self
            .applications
            .review_product(&mut *tx, application_id, product_id, decision)
            .await?
            .ok_or(AppError::StagedItemNotFound(product_id))?;

        tx.commit().await?;
        tracing::debug!("Produto {} revisado: aprovado={}", product_id, product.is_approved);
        Ok(product)
    }

    async fn ensure_reviewable(
        &self,
        conn: &mut sqlx::SqliteConnection,
        application_id: Uuid,
        role: ActorRole,
    ) -> Result<(), AppError> {
        let application = self
            .applications
            .find_by_id(&mut *conn, application_id)
            .await?
            .ok_or(AppError::ApplicationNotFound(application_id))?;
        workflow::transition(application.status, ApplicationAction::Review, role)?;
        Ok(())
    }

    // =========================================================================
    //  DECISÃO FINAL
    // =========================================================================

    /// Aceita (promove + `completed`) ou rejeita a aplicação.
    ///
    /// A promoção e a troca de status compartilham a mesma transação: se a
    /// promoção falhar, a aplicação continua `in_review` e o erro volta como
    /// [`AppError::CompletionFailed`].
    pub async fn decide(&self, application_id: Uuid, role: ActorRole) -> Result<DecisionOutcome, AppError> {
        let mut tx = db::begin_write(&self.pool).await?;

        let tree = self
            .applications
            .fetch_tree(&mut tx, application_id)
            .await?
            .ok_or(AppError::ApplicationNotFound(application_id))?;
        let current = tree.application.status;

        match evaluate_decision(&tree) {
            Decision::Reject { reasons } => {
                let next = workflow::transition(current, ApplicationAction::Reject, role)?;
                let summary = reasons.join("; ");
                let application = self
                    .applications
                    .update_status(&mut *tx, application_id, current, next, None, Some(&summary))
                    .await?
                    .ok_or(TransitionError::NotAllowed { current, action: ApplicationAction::Reject })?;

                tx.commit().await?;
                tracing::info!("Aplicação {} rejeitada: {}", application_id, summary);
                Ok(DecisionOutcome::Rejected { application, reasons })
            }
            Decision::Accept => {
                let next = workflow::transition(current, ApplicationAction::Complete, role)?;

                let report = self.completion.promote(&mut tx, &tree).await.map_err(|e| {
                    tracing::error!("Promoção da aplicação {} falhou: {}", application_id, e);
                    AppError::CompletionFailed { application_id, reason: e.to_string() }
                })?;

                let application = self
                    .applications
                    .update_status(&mut *tx, application_id, ApplicationStatus::InReview, next, None, None)
                    .await
                    .map_err(|e| AppError::CompletionFailed { application_id, reason: e.to_string() })?
                    .ok_or(TransitionError::NotAllowed { current, action: ApplicationAction::Complete })?;

                tx.commit().await?;
                tracing::info!(
                    "✅ Aplicação {} concluída: {} produtos promovidos, {} itens ignorados",
                    application_id,
                    report.product_ids.len(),
                    report.skipped.len()
                );
                Ok(DecisionOutcome::Completed { application, report })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn tree(info_approved: Option<bool>, partners: &[bool], products: &[bool]) -> ApplicationTree {
        let app_id = Uuid::new_v4();
        let now = Utc::now();
        ApplicationTree {
            application: Application {
                id: app_id,
                name: "EcoFiber".into(),
                description: String::new(),
                status: ApplicationStatus::InReview,
                submission_date: Some(now),
                form_reference: None,
                rejection_reason: None,
                bulk_submission_id: None,
                created_at: now,
                updated_at: now,
            },
            company_info: info_approved.map(|is_approved| ApplicationCompanyInfo {
                id: Uuid::new_v4(),
                application_id: app_id,
                name: "EcoFiber Textiles Inc.".into(),
                address: String::new(),
                city: String::new(),
                state: String::new(),
                zip_code: String::new(),
                country: String::new(),
                is_approved,
                rejection_reason: None,
            }),
            partners: partners
                .iter()
                .enumerate()
                .map(|(i, &is_approved)| ApplicationSupplyChainPartner {
                    id: Uuid::new_v4(),
                    application_id: app_id,
                    name: format!("Partner {i}"),
                    address: String::new(),
                    city: String::new(),
                    state: String::new(),
                    zip_code: String::new(),
                    country: String::new(),
                    is_approved,
                    rejection_reason: (!is_approved).then(|| "sem certificado".to_string()),
                })
                .collect(),
            products: products
                .iter()
                .enumerate()
                .map(|(i, &is_approved)| ApplicationProduct {
                    id: Uuid::new_v4(),
                    application_id: app_id,
                    supply_chain_partner_name_raw: "Partner 0".into(),
                    resolved_partner_id: None,
                    product_name: format!("Product {i}"),
                    product_category: "Apparel".into(),
                    raw_materials_list: "Cotton".into(),
                    is_approved,
                    rejection_reason: None,
                })
                .collect(),
        }
    }

    #[test]
    fn everything_approved_is_accepted() {
        assert_eq!(evaluate_decision(&tree(Some(true), &[true, true], &[true])), Decision::Accept);
    }

    #[test]
    fn one_unapproved_partner_rejects_regardless_of_products() {
        let decision = evaluate_decision(&tree(Some(true), &[true, false], &[true, true, true, true]));
        match decision {
            Decision::Reject { reasons } => {
                assert_eq!(reasons, vec!["Parceiro 'Partner 1' não aprovado: sem certificado".to_string()]);
            }
            Decision::Accept => panic!("deveria rejeitar"),
        }
    }

    #[test]
    fn unapproved_or_missing_company_info_rejects() {
        assert!(!evaluate_decision(&tree(Some(false), &[], &[])).is_accept());
        assert!(!evaluate_decision(&tree(None, &[], &[])).is_accept());
    }

    #[test]
    fn every_violation_is_listed() {
        let Decision::Reject { reasons } = evaluate_decision(&tree(Some(false), &[false], &[false])) else {
            panic!("deveria rejeitar");
        };
        assert_eq!(reasons.len(), 3);
        assert!(reasons[2].starts_with("Produto 'Product 0'"));
    }
}
