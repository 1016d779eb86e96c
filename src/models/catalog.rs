// src/models/catalog.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::code::CodePrefix;

// --- Endereços e empresas ---

// Endereço reutilizável, sem referência de volta para quem o usa
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: Uuid,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub address_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplyChainCompany {
    pub id: Uuid,
    pub name: String,
    // true = passou pela revisão
    pub is_valid: bool,
    pub address_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

// --- Tabelas de lookup (deduplicadas por código) ---

/// As três tabelas de lookup do catálogo compartilham o mesmo formato
/// (`code` único, `description`, `is_active`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LookupKind {
    ProductCategory,
    ProductDetail,
    RawMaterial,
}

impl LookupKind {
    pub fn table(self) -> &'static str {
        match self {
            LookupKind::ProductCategory => "product_categories",
            LookupKind::ProductDetail => "product_details",
            LookupKind::RawMaterial => "raw_materials",
        }
    }

    pub fn code_prefix(self) -> CodePrefix {
        match self {
            LookupKind::ProductCategory => CodePrefix::Category,
            LookupKind::ProductDetail => CodePrefix::ProductDetail,
            LookupKind::RawMaterial => CodePrefix::RawMaterial,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LookupEntry {
    pub id: Uuid,
    pub code: String,
    pub description: String,
    pub is_active: bool,
}

// --- Produto ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: Option<String>,
    pub detail_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
