// src/forms/loader.rs

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
};

use calamine::{Data, ExcelDateTime, Range, Reader, open_workbook_auto};
use chrono::NaiveTime;

use super::{IngestError, Sheet, Workbook};

/// Resolve a referência opaca de um formulário em uma [`Workbook`].
///
/// As implementações são síncronas; quem chama de dentro do runtime deve
/// usar `spawn_blocking`.
pub trait FormLoader: Send + Sync {
    fn load(&self, reference: &str) -> Result<Workbook, IngestError>;
}

// --- Arquivos em disco (xlsx / xls / ods) ---

#[derive(Debug, Clone)]
pub struct XlsxFormLoader {
    root: PathBuf,
}

impl XlsxFormLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, reference: &str) -> PathBuf {
        let path = Path::new(reference);
        if path.is_absolute() { path.to_path_buf() } else { self.root.join(path) }
    }
}

impl FormLoader for XlsxFormLoader {
    fn load(&self, reference: &str) -> Result<Workbook, IngestError> {
        let path = self.resolve(reference);
        if !path.is_file() {
            return Err(IngestError::FormNotFound(reference.to_owned()));
        }

        let unreadable = |detail: String| IngestError::Unreadable {
            reference: reference.to_owned(),
            detail,
        };

        let mut workbook = open_workbook_auto(&path).map_err(|e| unreadable(e.to_string()))?;

        let mut sheets = Vec::new();
        for name in workbook.sheet_names() {
            let range = workbook
                .worksheet_range(&name)
                .map_err(|e| unreadable(e.to_string()))?;
            sheets.push(Sheet::new(name, range_to_grid(&range)));
        }

        tracing::debug!("Formulário '{}' carregado ({} planilhas)", reference, sheets.len());
        Ok(Workbook::new(sheets))
    }
}

/// O `Range` do calamine começa na primeira célula usada; reancora em A1
/// para que posições fixas (linha/coluna) continuem valendo.
fn range_to_grid(range: &Range<Data>) -> Vec<Vec<String>> {
    let Some((first_row, first_col)) = range.start() else {
        return Vec::new();
    };

    let mut grid: Vec<Vec<String>> = vec![Vec::new(); first_row as usize];
    for row in range.rows() {
        let mut cells = vec![String::new(); first_col as usize];
        cells.extend(row.iter().map(cell_to_string));
        grid.push(cells);
    }
    grid
}

pub(crate) fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_owned(),
        Data::Float(f) => {
            // Números inteiros (ex.: CEP) sem o ".0"
            if *f == f.floor() && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => datetime_to_string(dt),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}

/// Datas como o revisor as vê na planilha; durações continuam numéricas.
fn datetime_to_string(dt: &ExcelDateTime) -> String {
    match dt.as_datetime().filter(|_| dt.is_datetime()) {
        Some(value) if value.time() == NaiveTime::MIN => value.date().format("%Y-%m-%d").to_string(),
        Some(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => dt.as_f64().to_string(),
    }
}

// --- Em memória (testes, ambiente de desenvolvimento) ---

#[derive(Debug, Default)]
pub struct InMemoryFormLoader {
    forms: RwLock<HashMap<String, Workbook>>,
}

impl InMemoryFormLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, reference: impl Into<String>, workbook: Workbook) {
        self.forms
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(reference.into(), workbook);
    }
}

impl FormLoader for InMemoryFormLoader {
    fn load(&self, reference: &str) -> Result<Workbook, IngestError> {
        self.forms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(reference)
            .cloned()
            .ok_or_else(|| IngestError::FormNotFound(reference.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use calamine::ExcelDateTimeType;

    use super::*;

    #[test]
    fn whole_floats_lose_their_fraction() {
        assert_eq!(cell_to_string(&Data::Float(12345.0)), "12345");
        assert_eq!(cell_to_string(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_to_string(&Data::String("  x ".into())), "x");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }

    #[test]
    fn date_cells_keep_their_calendar_form() {
        let date = Data::DateTime(ExcelDateTime::new(45123.0, ExcelDateTimeType::DateTime, false));
        assert_eq!(cell_to_string(&date), "2023-07-16");

        let noon = Data::DateTime(ExcelDateTime::new(45123.5, ExcelDateTimeType::DateTime, false));
        assert_eq!(cell_to_string(&noon), "2023-07-16 12:00:00");

        let duration = Data::DateTime(ExcelDateTime::new(1.5, ExcelDateTimeType::TimeDelta, false));
        assert_eq!(cell_to_string(&duration), "1.5");
    }

    #[test]
    fn missing_file_is_reported_as_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let loader = XlsxFormLoader::new(dir.path());
        let err = loader.load("nao-existe.xlsx").unwrap_err();
        assert!(matches!(err, IngestError::FormNotFound(ref r) if r == "nao-existe.xlsx"));
    }

    #[test]
    fn garbage_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("form.xlsx"), b"definitely not a zip").unwrap();
        let loader = XlsxFormLoader::new(dir.path());
        let err = loader.load("form.xlsx").unwrap_err();
        assert!(matches!(err, IngestError::Unreadable { .. }));
    }

    #[test]
    fn in_memory_loader_returns_registered_workbooks() {
        let loader = InMemoryFormLoader::new();
        loader.insert("a", Workbook::new(vec![Sheet::from_rows("info", vec![vec!["x"]])]));
        assert!(loader.load("a").is_ok());
        assert!(loader.load("b").unwrap_err().is_missing_document());
    }
}
