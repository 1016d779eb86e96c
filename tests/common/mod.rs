// tests/common/mod.rs

#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use certification_backend::{
    config::AppState,
    db,
    forms::{InMemoryFormLoader, Sheet, Workbook},
    models::{
        application::{CompanyFields, NewApplicationProduct, ReviewDecision, StagedForm},
        bulk::BulkSubmission,
    },
    services::{bulk_worker::RetryPolicy, workflow::ActorRole},
};
use sqlx::SqlitePool;
use tempfile::TempDir;
use uuid::Uuid;

pub struct TestApp {
    pub state: AppState,
    pub forms: Arc<InMemoryFormLoader>,
    // Mantém o arquivo do banco vivo enquanto o teste roda
    _dir: Option<TempDir>,
}

pub async fn setup() -> TestApp {
    let pool = db::connect_in_memory().await.expect("banco em memória");
    build(pool, None).await
}

/// Banco em arquivo com várias conexões, para exercitar transações concorrentes.
pub async fn setup_on_disk() -> TestApp {
    let dir = tempfile::tempdir().expect("diretório temporário");
    let url = format!("sqlite://{}", dir.path().join("certification.db").display());
    let pool = db::connect(&url, 5).await.expect("banco em arquivo");
    build(pool, Some(dir)).await
}

async fn build(pool: SqlitePool, dir: Option<TempDir>) -> TestApp {
    db::run_migrations(&pool).await.expect("migrações");

    let forms = Arc::new(InMemoryFormLoader::new());
    let retry = RetryPolicy { max_attempts: 2, base_delay: Duration::from_millis(10) };
    let state = AppState::build(pool, forms.clone(), retry);

    TestApp { state, forms, _dir: dir }
}

pub fn approve() -> ReviewDecision {
    ReviewDecision { is_approved: true, rejection_reason: None }
}

pub fn reject(reason: &str) -> ReviewDecision {
    ReviewDecision { is_approved: false, rejection_reason: Some(reason.to_string()) }
}

pub fn company(name: &str) -> CompanyFields {
    CompanyFields {
        name: name.to_string(),
        address: "12 Green St".to_string(),
        city: "Porto".to_string(),
        state: "Norte".to_string(),
        zip_code: "4000-001".to_string(),
        country: "Portugal".to_string(),
    }
}

pub fn product(partner: &str, name: &str, category: &str, materials: &str) -> NewApplicationProduct {
    NewApplicationProduct {
        supply_chain_partner_name_raw: partner.to_string(),
        product_name: name.to_string(),
        product_category: category.to_string(),
        raw_materials_list: materials.to_string(),
    }
}

pub fn ecofiber_form() -> StagedForm {
    StagedForm {
        company_info: company("EcoFiber Textiles Inc."),
        partners: vec![company("Sustainable Yarn Co.")],
        products: vec![product(
            "Sustainable Yarn Co.",
            "Organic Cotton T-Shirt",
            "Apparel",
            "Organic cotton, Natural dyes",
        )],
    }
}

/// Cria a aplicação, envia para revisão e aprova todos os itens.
pub async fn staged_in_review(app: &TestApp, name: &str, form: &StagedForm) -> Uuid {
    let (tree, _) = app
        .state
        .application_service
        .intake(name, "", form)
        .await
        .expect("intake");
    let id = tree.application.id;

    app.state
        .application_service
        .submit(id, ActorRole::Customer)
        .await
        .expect("submit");
    id
}

pub async fn approve_everything(app: &TestApp, id: Uuid) {
    let review = &app.state.review_service;
    review
        .review_company_info(id, ActorRole::Reviewer, &approve())
        .await
        .expect("empresa");

    let tree = app.state.application_service.get_tree(id).await.expect("árvore");
    for partner in &tree.partners {
        review
            .review_partner(id, partner.id, ActorRole::Reviewer, &approve())
            .await
            .expect("parceiro");
    }
    for product in &tree.products {
        review
            .review_product(id, product.id, ActorRole::Reviewer, &approve())
            .await
            .expect("produto");
    }
}

pub fn ecofiber_workbook() -> Workbook {
    Workbook::new(vec![
        Sheet::from_rows(
            "info",
            vec![
                vec!["", "Field", "Value"],
                vec!["", "Company Information", ""],
                vec!["", "Company Name", "EcoFiber Textiles Inc."],
                vec!["", "Address", "12 Green St"],
                vec!["", "City", "Porto"],
                vec!["", "State", "Norte"],
                vec!["", "Country", "Portugal"],
                vec!["", "Zip Code", "4000-001"],
            ],
        ),
        Sheet::from_rows(
            "supply chain company",
            vec![
                vec!["Supply Chain Company Name", "Address", "City", "State", "Country", "Zip Code"],
                vec!["Sustainable Yarn Co.", "1 Mill Rd", "Braga", "Norte", "Portugal", "4700"],
            ],
        ),
        Sheet::from_rows(
            "product",
            vec![
                vec!["Supply Chain Company", "Product Name", "Product Category", "Raw Materials"],
                vec!["Sustainable Yarn Co.", "Organic Cotton T-Shirt", "Apparel", "Organic cotton"],
                vec!["", "", "", "Natural dyes"],
            ],
        ),
    ])
}

pub async fn wait_for_terminal(app: &TestApp, bulk_id: Uuid) -> BulkSubmission {
    for _ in 0..400 {
        let view = app.state.bulk_service.get(bulk_id).await.expect("lote");
        if view.bulk_submission.status.is_terminal() {
            return view.bulk_submission;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("lote {bulk_id} não terminou a tempo");
}
