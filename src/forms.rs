// src/forms.rs

//! Leitura dos formulários de aplicação enviados como planilha.
//!
//! O carregamento (arquivo → [`Workbook`]) fica atrás do trait
//! [`FormLoader`]; o parser só enxerga a grade de textos já normalizada.

pub mod error;
pub mod loader;
pub mod parser;
pub mod reference;
pub mod workbook;

pub use error::IngestError;
pub use loader::{FormLoader, InMemoryFormLoader, XlsxFormLoader};
pub use workbook::{Sheet, Workbook};
