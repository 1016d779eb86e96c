// src/models/application.rs

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enums ---

/// Ciclo de vida de uma aplicação de certificação.
/// `completed` e `rejected` são estados finais.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    InReview,
    Completed,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::InReview => "in_review",
            ApplicationStatus::Completed => "completed",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ApplicationStatus::Completed | ApplicationStatus::Rejected)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Staging ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub status: ApplicationStatus,
    // Preenchida na entrada em revisão
    pub submission_date: Option<DateTime<Utc>>,
    // Referência opaca ao formulário enviado (resolvida pelo FormLoader)
    pub form_reference: Option<String>,
    pub rejection_reason: Option<String>,
    pub bulk_submission_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationCompanyInfo {
    pub id: Uuid,
    pub application_id: Uuid,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub is_approved: bool,
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSupplyChainPartner {
    pub id: Uuid,
    pub application_id: Uuid,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub is_approved: bool,
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationProduct {
    pub id: Uuid,
    pub application_id: Uuid,
    // Nome do parceiro exatamente como veio do formulário
    pub supply_chain_partner_name_raw: String,
    // Vínculo resolvido por nome (melhor esforço), pode ficar vazio
    pub resolved_partner_id: Option<Uuid>,
    pub product_name: String,
    pub product_category: String,
    pub raw_materials_list: String,
    pub is_approved: bool,
    pub rejection_reason: Option<String>,
}

impl ApplicationProduct {
    /// Lista de matérias-primas já separada por vírgula, sem espaços e sem vazios.
    pub fn raw_material_names(&self) -> Vec<&str> {
        self.raw_materials_list
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .collect()
    }
}

// --- Entradas (o que vai ser gravado na staging) ---

/// Nome + endereço postal. Serve tanto para a empresa requerente quanto
/// para os parceiros da cadeia de suprimentos.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyFields {
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct NewApplicationProduct {
    pub supply_chain_partner_name_raw: String,
    pub product_name: String,
    pub product_category: String,
    pub raw_materials_list: String,
}

/// Conteúdo completo de um formulário, pronto para a staging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedForm {
    pub company_info: CompanyFields,
    pub partners: Vec<CompanyFields>,
    pub products: Vec<NewApplicationProduct>,
}

/// Decisão do revisor sobre um item da staging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDecision {
    pub is_approved: bool,
    pub rejection_reason: Option<String>,
}

// --- Árvore completa ---

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationTree {
    #[serde(flatten)]
    pub application: Application,
    pub company_info: Option<ApplicationCompanyInfo>,
    pub partners: Vec<ApplicationSupplyChainPartner>,
    pub products: Vec<ApplicationProduct>,
}

impl ApplicationTree {
    pub fn approved_partners(&self) -> impl Iterator<Item = &ApplicationSupplyChainPartner> {
        self.partners.iter().filter(|p| p.is_approved)
    }

    pub fn unapproved_partners(&self) -> impl Iterator<Item = &ApplicationSupplyChainPartner> {
        self.partners.iter().filter(|p| !p.is_approved)
    }

    pub fn approved_products(&self) -> impl Iterator<Item = &ApplicationProduct> {
        self.products.iter().filter(|p| p.is_approved)
    }

    pub fn unapproved_products(&self) -> impl Iterator<Item = &ApplicationProduct> {
        self.products.iter().filter(|p| !p.is_approved)
    }

    pub fn company_info_approved(&self) -> bool {
        self.company_info.as_ref().is_some_and(|c| c.is_approved)
    }
}
