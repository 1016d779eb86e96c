// src/common/code.rs

//! Geração dos códigos derivados usados como chave de deduplicação nas
//! tabelas de catálogo (categorias, detalhes de produto e matérias-primas).
//!
//! Códigos já gravados no catálogo precisam continuar a bater com o mesmo
//! texto: qualquer mudança no algoritmo quebra a deduplicação.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Tamanho máximo da parte derivada do texto (sem o prefixo).
pub const MAX_CODE_BODY_LEN: usize = 50;

/// Prefixo fixo de cada tabela de catálogo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CodePrefix {
    Category,
    ProductDetail,
    RawMaterial,
}

impl CodePrefix {
    pub fn as_str(self) -> &'static str {
        match self {
            CodePrefix::Category => "CAT",
            CodePrefix::ProductDetail => "PROD",
            CodePrefix::RawMaterial => "MAT",
        }
    }
}

impl fmt::Display for CodePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deriva o código de catálogo a partir de um texto livre.
///
/// Maiúsculas, cada espaço vira `-`, apóstrofos são removidos e o resultado
/// é truncado em [`MAX_CODE_BODY_LEN`] caracteres antes do prefixo.
///
/// ```
/// use certification_backend::common::code::{derive_code, CodePrefix};
///
/// assert_eq!(derive_code(CodePrefix::Category, "Men's apparel"), "CAT-MENS-APPAREL");
/// ```
pub fn derive_code(prefix: CodePrefix, text: &str) -> String {
    let body: String = text
        .trim()
        .to_uppercase()
        .replace(' ', "-")
        .replace('\'', "")
        .chars()
        .take(MAX_CODE_BODY_LEN)
        .collect();

    format!("{}-{}", prefix.as_str(), body)
}
