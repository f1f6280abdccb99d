//! Writes the seven tables to one workbook or to one CSV file per table.

use std::fs;
use std::path::{Path, PathBuf};

use duckdb::types::Value;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use serde::Serialize;

use crate::config::OutputMode;
use crate::engine::MetricsStore;
use crate::error::Result;
use crate::result::{value_to_double, value_to_string};
use crate::schema::Table;
use crate::{escape_sql_ident, escape_sql_str};

pub const WORKBOOK_FILE: &str = "beverage_analysis.xlsx";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportSummary {
    pub mode: OutputMode,
    pub files: Vec<PathBuf>,
    pub tables: Vec<&'static str>,
    /// Tables that did not exist in the store.
    pub skipped: Vec<&'static str>,
}

/// Exports every table in [`Table::ALL`] that exists, creating `folder` if
/// needed. Missing tables are skipped with a warning.
pub fn export_tables(store: &MetricsStore, mode: OutputMode, folder: &Path) -> Result<ExportSummary> {
    fs::create_dir_all(folder)?;

    let existing = store.table_names()?;
    let (present, missing): (Vec<Table>, Vec<Table>) = Table::ALL
        .into_iter()
        .partition(|t| existing.iter().any(|e| e == t.name()));
    for table in &missing {
        log::warn!("table '{table}' does not exist; not exported");
    }

    let files = match mode {
        OutputMode::Excel => {
            let path = folder.join(WORKBOOK_FILE);
            write_workbook(store, &present, &path)?;
            log::info!("exported {} table(s) to Excel: {}", present.len(), path.display());
            vec![path]
        }
        OutputMode::Csv => present
            .iter()
            .map(|table| {
                let path = folder.join(table.csv_file_name());
                write_csv(store, *table, &path)?;
                log::info!("exported '{}' table to CSV: {}", table.title(), path.display());
                Ok(path)
            })
            .collect::<Result<Vec<_>>>()?,
    };

    Ok(ExportSummary {
        mode,
        files,
        tables: present.iter().map(|t| t.name()).collect(),
        skipped: missing.iter().map(|t| t.name()).collect(),
    })
}

fn write_csv(store: &MetricsStore, table: Table, path: &Path) -> Result<()> {
    store.execute(&format!(
        "COPY \"{}\" TO '{}' (HEADER, DELIMITER ',')",
        escape_sql_ident(table.name()),
        escape_sql_str(&path.to_string_lossy())
    ))
}

fn write_workbook(store: &MetricsStore, tables: &[Table], path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    for table in tables {
        let snapshot = store.query(&format!(
            "SELECT * FROM \"{}\"",
            escape_sql_ident(table.name())
        ))?;

        let sheet = workbook.add_worksheet();
        sheet.set_name(table.title())?;
        for (col, name) in snapshot.column_names().iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, name, &header)?;
        }
        for (i, row) in snapshot.rows().iter().enumerate() {
            for (col, value) in row.iter().enumerate() {
                write_cell(sheet, i as u32 + 1, col as u16, value)?;
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}

fn write_cell(sheet: &mut Worksheet, row: u32, col: u16, value: &Value) -> Result<()> {
    match value {
        Value::Null => {}
        Value::Boolean(b) => {
            sheet.write_boolean(row, col, *b)?;
        }
        Value::Text(s) => {
            sheet.write_string(row, col, s)?;
        }
        other => match value_to_double(other) {
            Some(n) => {
                sheet.write_number(row, col, n)?;
            }
            None => {
                sheet.write_string(row, col, value_to_string(other))?;
            }
        },
    }
    Ok(())
}
