use log::{debug, info};
use schemars::JsonSchema;
use serde::Serialize;

use crate::cell::RawGrid;
use crate::dataset::{DatasetSpec, ImportKind};
use crate::error::{ImportError, Result};
use crate::header;
use crate::mapper::{self, ColumnMap, ImportedRecord};
use crate::store::PersistRow;

/// What one import did. Row-level problems are not errors; they only show up
/// as the gap between scanned and imported counts.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ImportReport {
    pub kind: ImportKind,
    pub header_row: usize,
    pub rows_scanned: usize,
    pub rows_imported: usize,
    pub rows_skipped: usize,
}

/// The records of one import plus its report. This is the whole result;
/// nothing about the import lives anywhere else between calls.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub records: Vec<ImportedRecord>,
    pub report: ImportReport,
}

impl ImportOutcome {
    /// The rows handed to the persistence collaborator, in record order.
    pub fn persist_rows(&self) -> Vec<PersistRow> {
        self.records.iter().map(|r| r.to_row()).collect()
    }
}

/// Run one export grid through header location, validation and mapping.
///
/// Fails fast on a structurally empty grid and on a header that never meets
/// its score threshold; every error names the dataset kind. Dropped rows are
/// not reported individually; the caller sees "N rows imported" and nothing
/// finer.
pub fn import_grid(spec: &DatasetSpec, grid: &RawGrid) -> Result<ImportOutcome> {
    if grid.iter().all(|row| row.is_empty()) {
        return Err(ImportError::EmptyGrid { kind: spec.kind });
    }

    let scan = header::locate(grid, &spec.header);
    let location = scan.location.ok_or(ImportError::HeaderNotFound {
        kind: spec.kind,
        best_score: scan.best_score,
        min_score: spec.header.min_score,
    })?;
    debug!(
        "{}: header at row {} (score {})",
        spec.kind, location.header_row, scan.best_score
    );

    let labels = if spec.header.paired_rows {
        header::paired_labels(grid, location.header_row, spec.header.column_offset)
    } else {
        header::row_labels(grid, location.header_row, spec.header.column_offset)
    };
    let columns = ColumnMap::resolve(&labels, spec.header.column_offset, spec.fields);
    debug!(
        "{}: resolved {} of {} canonical columns",
        spec.kind,
        columns.len(),
        spec.fields.len()
    );

    let records = mapper::map_rows(grid, location.data_start, &columns);

    let rows_scanned = grid.len().saturating_sub(location.data_start);
    let report = ImportReport {
        kind: spec.kind,
        header_row: location.header_row,
        rows_scanned,
        rows_imported: records.len(),
        rows_skipped: rows_scanned - records.len(),
    };

    info!(
        "{}: imported {} of {} rows",
        report.kind, report.rows_imported, report.rows_scanned
    );

    Ok(ImportOutcome { records, report })
}

/// Convenience wrapper: look the spec up by kind.
pub fn import_kind(kind: ImportKind, grid: &RawGrid) -> Result<ImportOutcome> {
    import_grid(DatasetSpec::for_kind(kind), grid)
}
