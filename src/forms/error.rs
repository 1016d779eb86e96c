// src/forms/error.rs

use thiserror::Error;

/// Falhas estruturais ao carregar ou interpretar um formulário.
/// Nenhuma delas deixa a aplicação parcialmente populada.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("A aplicação não possui formulário anexado")]
    NoForm,

    #[error("Formulário '{0}' não encontrado")]
    FormNotFound(String),

    #[error(
        "Planilhas obrigatórias ausentes: {}. Planilhas encontradas: {}",
        .missing.join(", "),
        .found.join(", ")
    )]
    MissingSheets { missing: Vec<String>, found: Vec<String> },

    #[error("Coluna '{column}' ausente na planilha '{sheet}'")]
    MissingColumn { sheet: String, column: String },

    #[error("Não foi possível ler o formulário '{reference}': {detail}")]
    Unreadable { reference: String, detail: String },
}

impl IngestError {
    /// `true` quando o problema é a ausência do documento, não o conteúdo dele.
    pub fn is_missing_document(&self) -> bool {
        matches!(self, IngestError::NoForm | IngestError::FormNotFound(_))
    }

    pub(crate) fn missing_column(sheet: &str, column: &str) -> Self {
        IngestError::MissingColumn { sheet: sheet.to_owned(), column: column.to_owned() }
    }
}
