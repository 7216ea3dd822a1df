//! XLSX decoding behind the `xlsx` feature.
//!
//! The engine itself only ever sees a [`RawGrid`]; this adapter is one way to
//! produce one. Applications with their own decoder skip it entirely.

use std::path::Path;

use calamine::{open_workbook, Data, Range, Reader, Xlsx};

use crate::cell::{Cell, RawGrid};
use crate::error::{ImportError, Result};

/// Read the first worksheet of an XLSX file into a grid.
pub fn read_grid(path: impl AsRef<Path>) -> Result<RawGrid> {
    let mut workbook = open_xlsx(path.as_ref())?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ImportError::Workbook("workbook has no sheets".into()))?;
    read_named_sheet(&mut workbook, &sheet)
}

/// Read one named worksheet into a grid.
pub fn read_sheet(path: impl AsRef<Path>, sheet: &str) -> Result<RawGrid> {
    let mut workbook = open_xlsx(path.as_ref())?;
    read_named_sheet(&mut workbook, sheet)
}

fn open_xlsx(path: &Path) -> Result<Xlsx<std::io::BufReader<std::fs::File>>> {
    open_workbook(path).map_err(|e: calamine::XlsxError| ImportError::Workbook(e.to_string()))
}

fn read_named_sheet(
    workbook: &mut Xlsx<std::io::BufReader<std::fs::File>>,
    sheet: &str,
) -> Result<RawGrid> {
    let range = workbook
        .worksheet_range(sheet)
        .map_err(|e| ImportError::Workbook(e.to_string()))?;
    Ok(grid_from_range(&range))
}

/// Convert a decoded cell range into the engine's grid form. Dates keep
/// their serial representation; the coercion layer owns turning them into
/// calendar values.
pub fn grid_from_range(range: &Range<Data>) -> RawGrid {
    range
        .rows()
        .map(|row| row.iter().map(convert_cell).collect())
        .collect()
}

fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) | Data::Empty => Cell::Blank,
    }
}
