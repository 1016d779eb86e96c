// src/forms/parser.rs

//! Converte as três planilhas do formulário de aplicação em registros de
//! staging.
//!
//! | Planilha | Leitura |
//! |---|---|
//! | `info` | posições fixas (coluna 2, linhas de dados 1 a 6) |
//! | `supply chain company` | guiada pelo cabeçalho |
//! | `product` | guiada pelo cabeçalho, com forward-fill das células mescladas |

use std::collections::HashMap;

use super::{
    IngestError, Sheet, Workbook,
    workbook::cell_at,
};
use crate::models::application::{CompanyFields, NewApplicationProduct, StagedForm};

pub const INFO_SHEET: &str = "info";
pub const PARTNER_SHEET: &str = "supply chain company";
pub const PRODUCT_SHEET: &str = "product";

const REQUIRED_SHEETS: [&str; 3] = [INFO_SHEET, PARTNER_SHEET, PRODUCT_SHEET];

// Coluna e linhas de dados onde ficam os campos da empresa requerente
const INFO_VALUE_COL: usize = 2;
const INFO_NAME_ROW: usize = 1;
const INFO_ADDRESS_ROW: usize = 2;
const INFO_CITY_ROW: usize = 3;
const INFO_STATE_ROW: usize = 4;
const INFO_COUNTRY_ROW: usize = 5;
const INFO_ZIP_ROW: usize = 6;

pub mod partner_columns {
    pub const NAME: &str = "Supply Chain Company Name";
    pub const ADDRESS: &str = "Address";
    pub const CITY: &str = "City";
    pub const STATE: &str = "State";
    pub const COUNTRY: &str = "Country";
    pub const ZIP_CODE: &str = "Zip Code";
}

pub mod product_columns {
    pub const COMPANY: &str = "Supply Chain Company";
    pub const NAME: &str = "Product Name";
    pub const CATEGORY: &str = "Product Category";
    pub const RAW_MATERIALS: &str = "Raw Materials";
}

pub fn parse_form(workbook: &Workbook) -> Result<StagedForm, IngestError> {
    let (info, partners, products) = required_sheets(workbook)?;

    Ok(StagedForm {
        company_info: extract_company_info(info),
        partners: extract_partners(partners)?,
        products: extract_products(products)?,
    })
}

fn required_sheets(workbook: &Workbook) -> Result<(&Sheet, &Sheet, &Sheet), IngestError> {
    match (
        workbook.sheet(INFO_SHEET),
        workbook.sheet(PARTNER_SHEET),
        workbook.sheet(PRODUCT_SHEET),
    ) {
        (Some(info), Some(partners), Some(products)) => Ok((info, partners, products)),
        _ => {
            let missing = REQUIRED_SHEETS
                .iter()
                .filter(|name| workbook.sheet(name).is_none())
                .map(|name| name.to_string())
                .collect();
            Err(IngestError::MissingSheets { missing, found: workbook.sheet_names() })
        }
    }
}

pub fn extract_company_info(sheet: &Sheet) -> CompanyFields {
    let at = |row| sheet.data_cell(row, INFO_VALUE_COL).to_owned();

    CompanyFields {
        name: at(INFO_NAME_ROW),
        address: at(INFO_ADDRESS_ROW),
        city: at(INFO_CITY_ROW),
        state: at(INFO_STATE_ROW),
        country: at(INFO_COUNTRY_ROW),
        zip_code: at(INFO_ZIP_ROW),
    }
}

/// Só o nome é obrigatório no cabeçalho; colunas de endereço ausentes viram `""`.
pub fn extract_partners(sheet: &Sheet) -> Result<Vec<CompanyFields>, IngestError> {
    use partner_columns as col;

    let name_col = sheet
        .column_index(col::NAME)
        .ok_or_else(|| IngestError::missing_column(sheet.name(), col::NAME))?;
    let address_col = sheet.column_index(col::ADDRESS);
    let city_col = sheet.column_index(col::CITY);
    let state_col = sheet.column_index(col::STATE);
    let country_col = sheet.column_index(col::COUNTRY);
    let zip_col = sheet.column_index(col::ZIP_CODE);

    let partners = sheet
        .data_rows()
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        .filter_map(|row| {
            let name = cell_at(row, Some(name_col));
            if name.is_empty() {
                return None;
            }
            Some(CompanyFields {
                name: name.to_owned(),
                address: cell_at(row, address_col).to_owned(),
                city: cell_at(row, city_col).to_owned(),
                state: cell_at(row, state_col).to_owned(),
                country: cell_at(row, country_col).to_owned(),
                zip_code: cell_at(row, zip_col).to_owned(),
            })
        })
        .collect();

    Ok(partners)
}

/// Uma linha por matéria-prima na planilha; um produto por trio
/// (empresa, nome, categoria) na saída, na ordem da primeira aparição.
pub fn extract_products(sheet: &Sheet) -> Result<Vec<NewApplicationProduct>, IngestError> {
    use product_columns as col;

    let require = |label: &str| {
        sheet
            .column_index(label)
            .ok_or_else(|| IngestError::missing_column(sheet.name(), label))
    };
    let company_col = require(col::COMPANY)?;
    let name_col = require(col::NAME)?;
    let category_col = require(col::CATEGORY)?;
    let materials_col = require(col::RAW_MATERIALS)?;

    // Forward-fill: célula vazia herda o último valor preenchido acima dela
    let mut last_company = "";
    let mut last_name = "";
    let mut last_category = "";

    let mut groups: Vec<NewApplicationProduct> = Vec::new();
    let mut index: HashMap<(String, String, String), usize> = HashMap::new();

    for row in sheet.data_rows() {
        let company = fill(&mut last_company, cell_at(row, Some(company_col)));
        let name = fill(&mut last_name, cell_at(row, Some(name_col)));
        let category = fill(&mut last_category, cell_at(row, Some(category_col)));
        let material = cell_at(row, Some(materials_col));

        if name.is_empty() || company.is_empty() || material.is_empty() {
            continue;
        }

        let key = (company.to_owned(), name.to_owned(), category.to_owned());
        match index.get(&key) {
            Some(&i) => {
                let product = &mut groups[i];
                product.raw_materials_list.push_str(", ");
                product.raw_materials_list.push_str(material);
            }
            None => {
                index.insert(key, groups.len());
                groups.push(NewApplicationProduct {
                    supply_chain_partner_name_raw: company.to_owned(),
                    product_name: name.to_owned(),
                    product_category: category.to_owned(),
                    raw_materials_list: material.to_owned(),
                });
            }
        }
    }

    Ok(groups)
}

fn fill<'a>(last: &mut &'a str, cell: &'a str) -> &'a str {
    if !cell.is_empty() {
        *last = cell;
    }
    *last
}
