use log::info;

use crate::dataset::ImportKind;
use crate::error::Result;

/// One persisted row: plain canonical-name → value pairs.
pub type PersistRow = serde_json::Map<String, serde_json::Value>;

/// The persistence collaborator. The engine only ever deletes a whole
/// dataset kind and bulk-inserts rows for it; the wire protocol behind this
/// seam is not its concern.
pub trait SalesStore {
    /// Remove every stored row of the given kind.
    fn delete_dataset(&mut self, kind: ImportKind) -> Result<()>;

    /// Append rows of the given kind.
    fn insert_rows(&mut self, kind: ImportKind, rows: &[PersistRow]) -> Result<()>;
}

/// Replace a dataset kind in the store: delete the prior rows, then insert
/// the new ones.
///
/// Either step failing surfaces as one terminal error for the whole import;
/// there is no retry and no rollback. Concurrent re-imports of the same kind
/// would race destructively here, so the caller serializes them.
pub fn replace_dataset(
    store: &mut dyn SalesStore,
    kind: ImportKind,
    rows: &[PersistRow],
) -> Result<usize> {
    store.delete_dataset(kind)?;
    store.insert_rows(kind, rows)?;
    info!("replaced {} dataset: {} rows persisted", kind, rows.len());
    Ok(rows.len())
}

/// In-memory store used by tests and as the reference implementation of the
/// seam.
#[derive(Debug, Default)]
pub struct MemoryStore {
    datasets: std::collections::BTreeMap<ImportKind, Vec<PersistRow>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self, kind: ImportKind) -> &[PersistRow] {
        self.datasets.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl SalesStore for MemoryStore {
    fn delete_dataset(&mut self, kind: ImportKind) -> Result<()> {
        self.datasets.remove(&kind);
        Ok(())
    }

    fn insert_rows(&mut self, kind: ImportKind, rows: &[PersistRow]) -> Result<()> {
        self.datasets
            .entry(kind)
            .or_default()
            .extend(rows.iter().cloned());
        Ok(())
    }
}
