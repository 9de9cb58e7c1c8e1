//! Dataset export: CSV and SpreadsheetML workbooks, each with a reader so
//! exported files can be loaded back.

pub mod csv;
pub mod spreadsheet;

use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dataset::{DatasetView, Table};
use crate::error::ExportError;
use crate::models::config::ExportConfig;
use crate::models::invoice::{Field, FieldValue};

/// Export file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Csv,
    Spreadsheet,
}

impl ExportKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportKind::Csv => "csv",
            ExportKind::Spreadsheet => "xls",
        }
    }
}

/// `notas_fiscais_YYYYMMDD_HHMMSS.<ext>`
pub fn default_file_name(kind: ExportKind, now: NaiveDateTime) -> String {
    format!(
        "notas_fiscais_{}.{}",
        now.format("%Y%m%d_%H%M%S"),
        kind.extension()
    )
}

/// Write the view's selected columns to `path`.
pub fn export_view(
    view: &DatasetView<'_>,
    kind: ExportKind,
    path: &Path,
    config: &ExportConfig,
) -> Result<(), ExportError> {
    match kind {
        ExportKind::Csv => csv::write_csv_file(view, path, config.csv_bom)?,
        ExportKind::Spreadsheet => spreadsheet::write_spreadsheet_file(view, path)?,
    }
    info!("Exported {} records to {}", view.len(), path.display());
    Ok(())
}

/// Load a file written by [`export_view`].
pub fn read_table(kind: ExportKind, path: &Path) -> Result<Table, ExportError> {
    match kind {
        ExportKind::Csv => csv::read_csv_file(path),
        ExportKind::Spreadsheet => spreadsheet::read_spreadsheet_file(path),
    }
}

fn parse_header(names: impl IntoIterator<Item = String>) -> Result<Vec<Field>, ExportError> {
    names
        .into_iter()
        .map(|name| {
            name.parse::<Field>()
                .map_err(|_| ExportError::UnknownColumn(name))
        })
        .collect()
}

fn parse_row(
    columns: &[Field],
    row: usize,
    cells: Vec<String>,
) -> Result<Vec<FieldValue>, ExportError> {
    if cells.len() != columns.len() {
        return Err(ExportError::RowWidth {
            row,
            found: cells.len(),
            expected: columns.len(),
        });
    }

    columns
        .iter()
        .zip(cells)
        .map(|(field, cell)| {
            field.parse_value(&cell).map_err(|reason| ExportError::InvalidCell {
                column: field.column().to_string(),
                value: cell,
                reason,
            })
        })
        .collect()
}
