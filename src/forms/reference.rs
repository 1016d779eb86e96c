// src/forms/reference.rs

use serde::Serialize;

use super::{IngestError, Sheet, Workbook, workbook::cell_at};

pub const CODE_COLUMN: &str = "Codes";
pub const DESCRIPTION_COLUMN: &str = "Description";

/// Linha de uma lista de referência (categorias ou matérias-primas).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceEntry {
    pub code: String,
    pub description: String,
}

/// Lê a primeira planilha com as colunas `Codes` e `Description`.
/// Linhas com código ou descrição em branco são ignoradas.
pub fn parse_reference_list(workbook: &Workbook) -> Result<Vec<ReferenceEntry>, IngestError> {
    let sheet = workbook.first_sheet().ok_or_else(|| IngestError::MissingSheets {
        missing: vec!["(primeira planilha)".to_string()],
        found: Vec::new(),
    })?;
    parse_reference_sheet(sheet)
}

fn parse_reference_sheet(sheet: &Sheet) -> Result<Vec<ReferenceEntry>, IngestError> {
    let code_col = sheet
        .column_index(CODE_COLUMN)
        .ok_or_else(|| IngestError::missing_column(sheet.name(), CODE_COLUMN))?;
    let description_col = sheet
        .column_index(DESCRIPTION_COLUMN)
        .ok_or_else(|| IngestError::missing_column(sheet.name(), DESCRIPTION_COLUMN))?;

    let mut entries = Vec::new();
    for (index, row) in sheet.data_rows().enumerate() {
        let code = cell_at(row, Some(code_col));
        let description = cell_at(row, Some(description_col));

        if code.is_empty() {
            tracing::warn!("Código vazio na linha {}. Ignorando...", index);
            continue;
        }
        if description.is_empty() {
            tracing::warn!("Descrição vazia na linha {}. Ignorando...", index);
            continue;
        }

        entries.push(ReferenceEntry { code: code.to_owned(), description: description.to_owned() });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_rows_with_blank_code_or_description() {
        let wb = Workbook::new(vec![Sheet::from_rows(
            "Sheet1",
            vec![
                vec!["Codes", "Description"],
                vec!["PC0001", "Men's apparel"],
                vec!["", "Orphan"],
                vec!["PC0003", ""],
                vec!["PC0002", "Women's apparel"],
            ],
        )]);
        let entries = parse_reference_list(&wb).unwrap();
        let codes: Vec<_> = entries.iter().map(|e| e.code.as_str()).collect();
        assert_eq!(codes, vec!["PC0001", "PC0002"]);
    }

    #[test]
    fn requires_both_columns() {
        let wb = Workbook::new(vec![Sheet::from_rows("Sheet1", vec![vec!["Codes"]])]);
        assert!(matches!(
            parse_reference_list(&wb),
            Err(IngestError::MissingColumn { ref column, .. }) if column == "Description"
        ));
    }
}
