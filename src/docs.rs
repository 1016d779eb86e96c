// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};

use crate::{handlers, models, services};

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Applications ---
        handlers::applications::create_application,
        handlers::applications::manual_intake,
        handlers::applications::get_application,
        handlers::applications::ingest_form,
        handlers::applications::submit_application,

        // --- Review ---
        handlers::applications::review_company_info,
        handlers::applications::review_partner,
        handlers::applications::review_product,
        handlers::applications::decide,

        // --- Bulk ---
        handlers::bulk::create_bulk_submission,
        handlers::bulk::get_bulk_submission,
        handlers::bulk::add_application,
        handlers::bulk::dispatch_bulk_submission,

        // --- Catalog ---
        handlers::catalog::import_reference,
        handlers::catalog::list_lookups,
    ),
    components(
        schemas(
            // --- Staging ---
            models::application::ApplicationStatus,
            models::application::Application,
            models::application::ApplicationCompanyInfo,
            models::application::ApplicationSupplyChainPartner,
            models::application::ApplicationProduct,
            models::application::ApplicationTree,
            models::application::CompanyFields,
            models::application::NewApplicationProduct,

            // --- Bulk ---
            models::bulk::BulkSubmissionStatus,
            models::bulk::BulkSubmission,
            services::bulk_service::BulkSubmissionView,

            // --- Catalog ---
            models::catalog::Address,
            models::catalog::Company,
            models::catalog::SupplyChainCompany,
            models::catalog::LookupKind,
            models::catalog::LookupEntry,
            models::catalog::Product,

            // --- Relatórios ---
            services::application_service::PartnerLinkReport,
            services::completion_service::CompletionReport,
            services::completion_service::SkippedItem,
            services::completion_service::StagedItemKind,
            services::catalog_import_service::ImportSummary,

            // --- Payloads ---
            handlers::applications::CreateApplicationPayload,
            handlers::applications::ManualIntakePayload,
            handlers::applications::ReviewPayload,
            handlers::bulk::CreateBulkSubmissionPayload,
            handlers::bulk::AddApplicationPayload,
            handlers::catalog::ImportReferencePayload,
        )
    ),
    tags(
        (name = "Applications", description = "Entrada, importação e envio de aplicações"),
        (name = "Review", description = "Revisão item a item e decisão final"),
        (name = "Bulk", description = "Lotes de aplicações processados em segundo plano"),
        (name = "Catalog", description = "Tabelas de referência do catálogo")
    ),
    modifiers(&ActorRoleAddon)
)]
pub struct ApiDoc;

struct ActorRoleAddon;

impl utoipa::Modify for ActorRoleAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "actor_role",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-actor-role"))),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/applications",
            "/api/applications/{id}/decision",
            "/api/bulk-submissions/{id}/dispatch",
            "/api/catalog/{kind}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} ausente");
        }
    }
}
