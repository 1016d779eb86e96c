// src/forms/workbook.rs

/// Uma planilha como grade de textos, ancorada em A1.
///
/// A linha 0 é o cabeçalho; a "linha de dados" `r` é a linha `r + 1` da grade.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    name: String,
    rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self { name: name.into(), rows }
    }

    /// Atalho para montar planilhas em código (testes, importações manuais).
    pub fn from_rows<R, C>(name: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = C>,
        C: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        Self::new(name, rows)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn header(&self) -> &[String] {
        self.rows.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn data_rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().skip(1).map(Vec::as_slice)
    }

    /// Célula de dados já aparada; fora da grade ou vazia vira `""`.
    pub fn data_cell(&self, data_row: usize, col: usize) -> &str {
        self.rows
            .get(data_row + 1)
            .and_then(|row| row.get(col))
            .map(|cell| cell.trim())
            .unwrap_or("")
    }

    /// Índice da coluna cujo cabeçalho bate com `label` (sem diferenciar caixa).
    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.header()
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(label.trim()))
    }
}

/// Célula de uma linha de dados, aparada; `""` quando a coluna não existe.
pub fn cell_at(row: &[String], col: Option<usize>) -> &str {
    col.and_then(|c| row.get(c)).map(|s| s.trim()).unwrap_or("")
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets
            .iter()
            .find(|s| s.name.trim().eq_ignore_ascii_case(name))
    }

    pub fn first_sheet(&self) -> Option<&Sheet> {
        self.sheets.first()
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }
}
