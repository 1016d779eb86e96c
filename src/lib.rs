// src/lib.rs

use axum::{
    Json, Router,
    routing::{get, post, put},
};
use utoipa::OpenApi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod forms;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::config::AppState;

pub fn build_router(app_state: AppState) -> Router {
    let application_routes = Router::new()
        .route("/", post(handlers::applications::create_application))
        .route("/intake", post(handlers::applications::manual_intake))
        .route("/{id}", get(handlers::applications::get_application))
        .route("/{id}/ingest", post(handlers::applications::ingest_form))
        .route("/{id}/submit", post(handlers::applications::submit_application))
        .route("/{id}/company-info/review", put(handlers::applications::review_company_info))
        .route("/{id}/partners/{partner_id}/review", put(handlers::applications::review_partner))
        .route("/{id}/products/{product_id}/review", put(handlers::applications::review_product))
        .route("/{id}/decision", post(handlers::applications::decide));

    let bulk_routes = Router::new()
        .route("/", post(handlers::bulk::create_bulk_submission))
        .route("/{id}", get(handlers::bulk::get_bulk_submission))
        .route("/{id}/applications", post(handlers::bulk::add_application))
        .route("/{id}/dispatch", post(handlers::bulk::dispatch_bulk_submission));

    let catalog_routes = Router::new()
        .route("/import", post(handlers::catalog::import_reference))
        .route("/{kind}", get(handlers::catalog::list_lookups));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(docs::ApiDoc::openapi()) }))
        .nest("/api/applications", application_routes)
        .nest("/api/bulk-submissions", bulk_routes)
        .nest("/api/catalog", catalog_routes)
        .with_state(app_state)
}
