// tests/completion.rs

mod common;

use certification_backend::{
    common::error::AppError,
    models::application::{ApplicationStatus, StagedForm},
    services::{
        review_service::DecisionOutcome,
        workflow::{ActorRole, TransitionError},
    },
};
use common::{approve, approve_everything, company, ecofiber_form, product, reject, setup, staged_in_review};

fn codes(entries: &[certification_backend::models::catalog::LookupEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.code.as_str()).collect()
}

#[tokio::test]
async fn accepted_application_populates_the_catalog() {
    let app = setup().await;
    let id = staged_in_review(&app, "EcoFiber 2026", &ecofiber_form()).await;
    approve_everything(&app, id).await;

    let outcome = app.state.review_service.decide(id, ActorRole::Reviewer).await.unwrap();
    let DecisionOutcome::Completed { application, report } = outcome else {
        panic!("esperava aplicação concluída");
    };
    assert_eq!(application.status, ApplicationStatus::Completed);
    assert!(report.unmatched_partner_warnings.is_empty());
    assert!(report.code_collisions.is_empty());
    assert!(report.skipped.is_empty());

    let catalog = &app.state.catalog_repo;
    let companies = catalog.list_companies().await.unwrap();
    assert_eq!(companies.len(), 1);
    assert_eq!(companies[0].name, "EcoFiber Textiles Inc.");

    let partners = catalog.list_supply_chain_companies().await.unwrap();
    assert_eq!(partners.len(), 1);
    assert_eq!(partners[0].name, "Sustainable Yarn Co.");
    assert!(partners[0].is_valid);

    use certification_backend::models::catalog::LookupKind;
    let categories = catalog.list_lookups(LookupKind::ProductCategory).await.unwrap();
    assert_eq!(codes(&categories), ["CAT-APPAREL"]);
    let details = catalog.list_lookups(LookupKind::ProductDetail).await.unwrap();
    assert_eq!(codes(&details), ["PROD-ORGANIC-COTTON-T-SHIRT"]);
    let mut materials = catalog.list_lookups(LookupKind::RawMaterial).await.unwrap();
    materials.sort_by(|a, b| a.code.cmp(&b.code));
    assert_eq!(codes(&materials), ["MAT-NATURAL-DYES", "MAT-ORGANIC-COTTON"]);

    let products = catalog.list_products().await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].detail_id, Some(details[0].id));
    assert_eq!(products[0].category_id, Some(categories[0].id));
    assert_eq!(catalog.raw_materials_of(products[0].id).await.unwrap().len(), 2);

    // Empresa + parceiro
    assert_eq!(catalog.count_addresses().await.unwrap(), 2);
}

#[tokio::test]
async fn repeated_lookup_text_reuses_catalog_rows() {
    let app = setup().await;

    for name in ["Primeira", "Segunda"] {
        let form = StagedForm {
            company_info: company(&format!("{name} Ltda")),
            partners: vec![],
            products: vec![product("", &format!("Camiseta {name}"), "Apparel", "Organic cotton")],
        };
        let id = staged_in_review(&app, name, &form).await;
        approve_everything(&app, id).await;
        app.state.review_service.decide(id, ActorRole::Reviewer).await.unwrap();
    }

    use certification_backend::models::catalog::LookupKind;
    let catalog = &app.state.catalog_repo;
    assert_eq!(codes(&catalog.list_lookups(LookupKind::ProductCategory).await.unwrap()), ["CAT-APPAREL"]);
    assert_eq!(codes(&catalog.list_lookups(LookupKind::RawMaterial).await.unwrap()), ["MAT-ORGANIC-COTTON"]);
    assert_eq!(catalog.list_products().await.unwrap().len(), 2);
    assert_eq!(catalog.list_companies().await.unwrap().len(), 2);
}

#[tokio::test]
async fn company_failure_rolls_back_the_whole_promotion() {
    let app = setup().await;
    let id = staged_in_review(&app, "EcoFiber", &ecofiber_form()).await;
    approve_everything(&app, id).await;

    sqlx::query(
        "CREATE TRIGGER reject_companies BEFORE INSERT ON companies \
         BEGIN SELECT RAISE(ABORT, 'boom'); END;",
    )
    .execute(&app.state.db_pool)
    .await
    .unwrap();

    assert!(!app.state.completion_service.complete(id).await);

    let catalog = &app.state.catalog_repo;
    assert_eq!(catalog.count_addresses().await.unwrap(), 0);
    assert!(catalog.list_companies().await.unwrap().is_empty());
    assert!(catalog.list_products().await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_status_change_undoes_promotion() {
    let app = setup().await;
    let id = staged_in_review(&app, "EcoFiber", &ecofiber_form()).await;
    approve_everything(&app, id).await;

    sqlx::query(
        "CREATE TRIGGER block_completion BEFORE UPDATE OF status ON applications \
         WHEN NEW.status = 'completed' BEGIN SELECT RAISE(ABORT, 'boom'); END;",
    )
    .execute(&app.state.db_pool)
    .await
    .unwrap();

    let err = app.state.review_service.decide(id, ActorRole::Reviewer).await.unwrap_err();
    assert!(matches!(err, AppError::CompletionFailed { .. }), "{err:?}");

    let catalog = &app.state.catalog_repo;
    assert!(catalog.list_companies().await.unwrap().is_empty());
    assert!(catalog.list_supply_chain_companies().await.unwrap().is_empty());
    assert!(catalog.list_products().await.unwrap().is_empty());

    let tree = app.state.application_service.get_tree(id).await.unwrap();
    assert_eq!(tree.application.status, ApplicationStatus::InReview);
}

#[tokio::test]
async fn unapproved_partner_rejects_without_touching_the_catalog() {
    let app = setup().await;
    let id = staged_in_review(&app, "EcoFiber", &ecofiber_form()).await;
    approve_everything(&app, id).await;

    let tree = app.state.application_service.get_tree(id).await.unwrap();
    app.state
        .review_service
        .review_partner(id, tree.partners[0].id, ActorRole::Reviewer, &reject("sem certificado"))
        .await
        .unwrap();

    let outcome = app.state.review_service.decide(id, ActorRole::Reviewer).await.unwrap();
    let DecisionOutcome::Rejected { application, reasons } = outcome else {
        panic!("esperava rejeição");
    };
    assert_eq!(application.status, ApplicationStatus::Rejected);
    assert_eq!(reasons.len(), 1);
    let stored_reason = application.rejection_reason.unwrap_or_default();
    assert!(stored_reason.contains("Sustainable Yarn Co."), "{stored_reason}");
    assert!(stored_reason.contains("sem certificado"), "{stored_reason}");

    assert!(app.state.catalog_repo.list_companies().await.unwrap().is_empty());
}

#[tokio::test]
async fn direct_completion_skips_unapproved_items() {
    let app = setup().await;
    let mut form = ecofiber_form();
    form.partners.push(company("Shady Dyes Ltd."));
    form.products.push(product("Shady Dyes Ltd.", "Dyed Scarf", "Accessories", "Synthetic dye"));
    let id = staged_in_review(&app, "EcoFiber", &form).await;

    let tree = app.state.application_service.get_tree(id).await.unwrap();
    let review = &app.state.review_service;
    review.review_company_info(id, ActorRole::Reviewer, &approve()).await.unwrap();
    for partner in &tree.partners {
        let decision = if partner.name == "Shady Dyes Ltd." { reject("") } else { approve() };
        review.review_partner(id, partner.id, ActorRole::Reviewer, &decision).await.unwrap();
    }
    for item in &tree.products {
        let decision = if item.product_name == "Dyed Scarf" { reject("") } else { approve() };
        review.review_product(id, item.id, ActorRole::Reviewer, &decision).await.unwrap();
    }

    let report = app.state.completion_service.try_complete(id).await.unwrap();
    assert_eq!(report.supply_chain_company_ids.len(), 1);
    assert_eq!(report.product_ids.len(), 1);

    let catalog = &app.state.catalog_repo;
    let partners = catalog.list_supply_chain_companies().await.unwrap();
    assert_eq!(partners.len(), 1);
    assert_eq!(partners[0].name, "Sustainable Yarn Co.");

    use certification_backend::models::catalog::LookupKind;
    assert_eq!(codes(&catalog.list_lookups(LookupKind::ProductCategory).await.unwrap()), ["CAT-APPAREL"]);
}

#[tokio::test]
async fn completion_requires_approved_company_info() {
    let app = setup().await;
    let id = staged_in_review(&app, "EcoFiber", &ecofiber_form()).await;

    // Nada revisado ainda
    assert!(!app.state.completion_service.complete(id).await);
    assert_eq!(app.state.catalog_repo.count_addresses().await.unwrap(), 0);
}

#[tokio::test]
async fn product_problems_are_reported_not_fatal() {
    let app = setup().await;
    let long_prefix = "Extra Long Sustainable Organic Cotton Crew Neck Tee";
    let form = StagedForm {
        company_info: company("EcoFiber Textiles Inc."),
        partners: vec![company("Sustainable Yarn Co.")],
        products: vec![
            product("Sustainable Yarn Co.", &format!("{long_prefix} White"), "Apparel", "Organic cotton"),
            product("Sustainable Yarn Co.", &format!("{long_prefix} Black"), "Apparel", "Organic cotton"),
            product("Unknown Mill", "Linen Shirt", "Apparel", "Linen"),
            product("Sustainable Yarn Co.", "Uncategorized Sock", "", "Wool"),
        ],
    };
    let id = staged_in_review(&app, "EcoFiber", &form).await;
    approve_everything(&app, id).await;

    let outcome = app.state.review_service.decide(id, ActorRole::Reviewer).await.unwrap();
    let DecisionOutcome::Completed { report, .. } = outcome else {
        panic!("esperava aplicação concluída");
    };

    assert_eq!(report.product_ids.len(), 3);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.code_collisions.len(), 1, "{:?}", report.code_collisions);
    assert_eq!(report.unmatched_partner_warnings.len(), 1);
    assert!(report.unmatched_partner_warnings[0].contains("Unknown Mill"));

    use certification_backend::models::catalog::LookupKind;
    let details = app.state.catalog_repo.list_lookups(LookupKind::ProductDetail).await.unwrap();
    assert_eq!(details.len(), 2);
}

#[tokio::test]
async fn workflow_rules_are_enforced_by_services() {
    let app = setup().await;
    let (tree, _) = app
        .state
        .application_service
        .intake("EcoFiber", "", &ecofiber_form())
        .await
        .unwrap();
    let id = tree.application.id;

    // Revisão antes do envio
    let err = app
        .state
        .review_service
        .review_company_info(id, ActorRole::Reviewer, &approve())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(TransitionError::NotAllowed { .. })), "{err:?}");

    // Revisor não envia
    let err = app.state.application_service.submit(id, ActorRole::Reviewer).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(TransitionError::Forbidden { .. })), "{err:?}");

    app.state.application_service.submit(id, ActorRole::Customer).await.unwrap();
    let err = app.state.application_service.submit(id, ActorRole::Customer).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)), "{err:?}");

    // Cliente não decide
    let err = app.state.review_service.decide(id, ActorRole::Customer).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(TransitionError::Forbidden { .. })), "{err:?}");

    approve_everything(&app, id).await;
    app.state.review_service.decide(id, ActorRole::Reviewer).await.unwrap();

    let err = app.state.review_service.decide(id, ActorRole::Reviewer).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(TransitionError::Terminal { .. })), "{err:?}");
}

#[tokio::test]
async fn unknown_application_is_not_found() {
    let app = setup().await;
    let err = app.state.application_service.get_tree(uuid::Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::ApplicationNotFound(_)));
}
