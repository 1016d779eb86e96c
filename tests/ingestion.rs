// tests/ingestion.rs

mod common;

use certification_backend::{
    common::error::AppError,
    forms::{IngestError, Sheet, Workbook},
    models::catalog::LookupKind,
    services::{catalog_import_service::ImportSummary, ingestion_service::IngestionOutcome},
};
use common::{ecofiber_workbook, setup};

#[tokio::test]
async fn form_is_staged_with_grouped_products() {
    let app = setup().await;
    app.forms.insert("ecofiber.xlsx", ecofiber_workbook());

    let application = app
        .state
        .application_service
        .create_application("EcoFiber", "", Some("ecofiber.xlsx"))
        .await
        .unwrap();

    let outcome = app.state.ingestion_service.ingest(application.id).await.unwrap();
    let IngestionOutcome::Ingested { partners, products, links } = outcome else {
        panic!("esperava importação");
    };
    assert_eq!((partners, products), (1, 1));
    assert_eq!(links.linked, 1);

    let tree = app.state.application_service.get_tree(application.id).await.unwrap();
    let info = tree.company_info.as_ref().unwrap();
    assert_eq!(info.name, "EcoFiber Textiles Inc.");
    assert_eq!(info.zip_code, "4000-001");
    assert!(!info.is_approved);

    assert_eq!(tree.partners[0].name, "Sustainable Yarn Co.");
    assert_eq!(tree.partners[0].city, "Braga");

    let product = &tree.products[0];
    assert_eq!(product.product_name, "Organic Cotton T-Shirt");
    assert_eq!(product.raw_materials_list, "Organic cotton, Natural dyes");
    assert_eq!(product.resolved_partner_id, Some(tree.partners[0].id));
}

#[tokio::test]
async fn second_ingestion_is_a_no_op() {
    let app = setup().await;
    app.forms.insert("ecofiber.xlsx", ecofiber_workbook());
    let application = app
        .state
        .application_service
        .create_application("EcoFiber", "", Some("ecofiber.xlsx"))
        .await
        .unwrap();

    app.state.ingestion_service.ingest(application.id).await.unwrap();
    let again = app.state.ingestion_service.ingest(application.id).await.unwrap();
    assert!(matches!(again, IngestionOutcome::AlreadyStaged));

    let tree = app.state.application_service.get_tree(application.id).await.unwrap();
    assert_eq!(tree.partners.len(), 1);
    assert_eq!(tree.products.len(), 1);
}

#[tokio::test]
async fn application_without_form_is_a_missing_document() {
    let app = setup().await;
    let application = app.state.application_service.create_application("Sem form", "", None).await.unwrap();

    let err = app.state.ingestion_service.ingest(application.id).await.unwrap_err();
    assert!(matches!(err, AppError::Ingest(IngestError::NoForm)), "{err:?}");

    let unknown = app
        .state
        .application_service
        .create_application("Perdido", "", Some("nao-existe.xlsx"))
        .await
        .unwrap();
    let err = app.state.ingestion_service.ingest(unknown.id).await.unwrap_err();
    assert!(matches!(err, AppError::Ingest(ref e) if e.is_missing_document()), "{err:?}");
}

#[tokio::test]
async fn structural_errors_leave_no_partial_staging() {
    let app = setup().await;
    let only_info = Workbook::new(vec![Sheet::from_rows("info", vec![vec!["", "", "Acme"]])]);
    app.forms.insert("incompleto.xlsx", only_info);

    let application = app
        .state
        .application_service
        .create_application("Incompleto", "", Some("incompleto.xlsx"))
        .await
        .unwrap();

    let err = app.state.ingestion_service.ingest(application.id).await.unwrap_err();
    match err {
        AppError::Ingest(IngestError::MissingSheets { missing, .. }) => {
            assert_eq!(missing, ["supply chain company", "product"]);
        }
        other => panic!("erro inesperado: {other:?}"),
    }

    let tree = app.state.application_service.get_tree(application.id).await.unwrap();
    assert!(tree.company_info.is_none());
    assert!(tree.partners.is_empty());
    assert!(tree.products.is_empty());
}

fn reference_list(rows: &[(&str, &str)]) -> Workbook {
    let mut grid = vec![vec!["Codes".to_string(), "Description".to_string()]];
    grid.extend(rows.iter().map(|(c, d)| vec![c.to_string(), d.to_string()]));
    Workbook::new(vec![Sheet::new("Sheet1", grid)])
}

#[tokio::test]
async fn reference_lists_import_once() {
    let app = setup().await;
    app.forms.insert(
        "materials.xlsx",
        reference_list(&[("MAT-ORGANIC-COTTON", "Organic cotton"), ("MAT-WOOL", "Wool"), ("", "Sem código")]),
    );

    let service = &app.state.catalog_import_service;
    let first = service.import_reference(LookupKind::RawMaterial, "materials.xlsx").await.unwrap();
    assert_eq!(first, ImportSummary { created: 2, existing: 0 });

    let second = service.import_reference(LookupKind::RawMaterial, "materials.xlsx").await.unwrap();
    assert_eq!(second, ImportSummary { created: 0, existing: 2 });

    let materials = app.state.catalog_repo.list_lookups(LookupKind::RawMaterial).await.unwrap();
    assert_eq!(materials.len(), 2);
    assert!(materials.iter().all(|m| m.is_active));

    let err = service.import_reference(LookupKind::RawMaterial, "sumiu.xlsx").await.unwrap_err();
    assert!(matches!(err, AppError::Ingest(IngestError::FormNotFound(_))), "{err:?}");
}
