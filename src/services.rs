// src/services.rs

pub mod application_service;
pub use application_service::ApplicationService;
pub mod bulk_service;
pub use bulk_service::BulkService;
pub mod bulk_worker;
pub mod catalog_import_service;
pub use catalog_import_service::CatalogImportService;
pub mod completion_service;
pub use completion_service::CompletionService;
pub mod ingestion_service;
pub use ingestion_service::IngestionService;
pub mod review_service;
pub use review_service::ReviewService;
pub mod workflow;
